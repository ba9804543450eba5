pub mod factory;
mod models;
pub mod query;

pub use factory::{create, parse_seed_count, seed, update, DramaPayload};
pub use models::{now_millis, Drama, Episode, Snapshot};
pub use query::{query, PagedResult, QueryParams};
