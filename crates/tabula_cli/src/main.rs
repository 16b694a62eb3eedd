//! Tabula CLI
//!
//! Command-line front end for a Tabula database directory.
//!
//! # Commands
//!
//! - `create-table` - Create a table with typed columns
//! - `insert` - Insert a row given as a JSON object
//! - `select` - Print rows matching a `WHERE` clause
//! - `update` - Set column values on matching rows
//! - `delete` - Delete matching rows
//! - `rollback` - Undo the most recent operation
//! - `history` - Show the operation history
//! - `tables` - List tables
//! - `serve` - Serve the database over HTTP

mod commands;

use clap::{Parser, Subcommand};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tabula_core::Column;
use tracing_subscriber::EnvFilter;

/// Tabula command-line tools.
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Database name
    #[arg(global = true, short, long, default_value = "MyDB")]
    name: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table
    CreateTable {
        /// Table name
        table: String,

        /// Column as name:type (string, int, bool, float, timestamp)
        #[arg(short, long = "column", required = true)]
        columns: Vec<Column>,
    },

    /// Insert a row
    Insert {
        /// Table name
        table: String,

        /// Row as a JSON object
        #[arg(short, long)]
        row: String,
    },

    /// Query rows
    Select {
        /// Table name
        table: String,

        /// Conditions, e.g. 'id=1 AND active=true'
        #[arg(short, long = "where")]
        where_clause: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Update rows
    Update {
        /// Table name
        table: String,

        /// Values to set, e.g. 'name=Bob AND active=false'
        #[arg(short, long)]
        set: String,

        /// Conditions, e.g. 'id=1'
        #[arg(short, long = "where")]
        where_clause: Option<String>,
    },

    /// Delete rows
    Delete {
        /// Table name
        table: String,

        /// Conditions, e.g. 'id=1'
        #[arg(short, long = "where")]
        where_clause: Option<String>,
    },

    /// Undo the most recent operation
    Rollback,

    /// Show the operation history
    History {
        /// Only show operations on this table
        #[arg(short, long)]
        table: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List tables
    Tables,

    /// Serve the database over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let open = || commands::open(&cli.data_dir, &cli.name);
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::CreateTable { table, columns } => {
            commands::schema::create_table(&open()?, &table, columns, &mut out)?;
        }
        Commands::Tables => {
            commands::schema::tables(&open()?, &mut out)?;
        }
        Commands::Insert { table, row } => {
            commands::rows::insert(&open()?, &table, &row, &mut out)?;
        }
        Commands::Select {
            table,
            where_clause,
            format,
        } => {
            let db = open()?;
            commands::rows::select(&db, &table, where_clause.as_deref(), &format, &mut out)?;
        }
        Commands::Update {
            table,
            set,
            where_clause,
        } => {
            let db = open()?;
            commands::rows::update(&db, &table, &set, where_clause.as_deref(), &mut out)?;
        }
        Commands::Delete {
            table,
            where_clause,
        } => {
            commands::rows::delete(&open()?, &table, where_clause.as_deref(), &mut out)?;
        }
        Commands::Rollback => {
            commands::history::rollback(&open()?, &mut out)?;
        }
        Commands::History { table, format } => {
            commands::history::show(&open()?, table.as_deref(), &format, &mut out)?;
        }
        Commands::Serve { addr } => {
            commands::serve::run(&cli.data_dir, &cli.name, addr)?;
        }
    }

    Ok(())
}
