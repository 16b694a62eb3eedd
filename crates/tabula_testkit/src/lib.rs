//! # Tabula Testkit
//!
//! Test utilities for Tabula.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tabula_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     db.create_table("users", scenarios::users_columns()).unwrap();
//!     assert_eq!(db.table_names(), vec!["users".to_string()]);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
