mod json_store;
mod memory_store;
mod trait_def;

pub use json_store::JsonFileDramaStore;
pub use memory_store::InMemoryDramaStore;
pub use trait_def::{DramaStore, StoreError};
