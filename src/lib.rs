//! Drama Catalog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog_store::{DramaStore, InMemoryDramaStore, JsonFileDramaStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
