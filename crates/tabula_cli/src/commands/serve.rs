//! Serve command implementation.

use super::CommandResult;
use std::net::SocketAddr;
use std::path::Path;
use tabula_server::ServerConfig;
use tracing::info;

/// Runs the HTTP server until Ctrl-C.
pub fn run(data_dir: &Path, name: &str, addr: SocketAddr) -> CommandResult {
    let config = ServerConfig::new(addr)
        .with_data_dir(data_dir)
        .with_database_name(name);

    info!(%addr, data_dir = %data_dir.display(), database = name, "starting server");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(tabula_server::run(config))?;
    Ok(())
}
