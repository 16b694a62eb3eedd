//! # Tabula Storage
//!
//! Storage backends and snapshot encodings for Tabula.
//!
//! This crate provides the lowest-level persistence abstraction for Tabula.
//! Backends are **named blob stores** - they keep whole byte blobs under a
//! key and do not interpret what they store.
//!
//! ## Design Principles
//!
//! - Backends are simple blob stores (read, write, remove)
//! - A write replaces the whole blob; readers never see a half-written blob
//! - Must be `Send + Sync` for concurrent access
//! - [`Storage`] layers typed save/load on top of a backend using an [`Encoding`]
//!
//! ## Available Backends
//!
//! - [`InMemoryStore`] - For testing and ephemeral databases
//! - [`FileStore`] - One file per key inside a locked data directory
//!
//! ## Example
//!
//! ```rust
//! use tabula_storage::{Encoding, InMemoryStore, Storage};
//!
//! let storage = Storage::new(Box::new(InMemoryStore::new()), Encoding::Json);
//! storage.save("numbers.json", &vec![1, 2, 3]).unwrap();
//!
//! let loaded: Option<Vec<i32>> = storage.load("numbers.json").unwrap();
//! assert_eq!(loaded, Some(vec![1, 2, 3]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod encoding;
mod error;
mod file;
mod memory;
mod storage;

pub use backend::{validate_key, BlobStore};
pub use encoding::Encoding;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use storage::Storage;
