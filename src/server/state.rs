use axum::extract::FromRef;

use crate::catalog_store::DramaStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedDramaStore = Arc<dyn DramaStore>;
/// Held for the whole load-transform-replace cycle of a mutating request.
pub type WriteLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub store: GuardedDramaStore,
    pub write_lock: WriteLock,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: GuardedDramaStore) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            store,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedDramaStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}
