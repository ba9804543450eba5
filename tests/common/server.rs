//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own data file in a temp dir.

use super::constants::*;
use drama_catalog_server::catalog::Snapshot;
use drama_catalog_server::{
    make_app, DramaStore, JsonFileDramaStore, RequestsLoggingLevel, ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance backed by a JSON file
///
/// When dropped, the server gracefully shuts down and the temp dir is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The catalog file the server reads and writes
    pub data_file: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with the test admin token and a wildcard CORS origin
    pub async fn spawn() -> Self {
        Self::spawn_with_cors_origin("*").await
    }

    /// Spawns a server that only allows `cors_origin` from browsers
    pub async fn spawn_with_cors_origin(cors_origin: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // Not created up front, the store initializes it.
        let data_file = temp_dir.path().join("data").join("dramas.json");
        let store = Arc::new(JsonFileDramaStore::new(&data_file));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            bind_address: "127.0.0.1".to_owned(),
            port,
            admin_token: ADMIN_TOKEN.to_owned(),
            cors_origin: cors_origin.to_owned(),
            max_page_limit: None,
            max_seed_count: None,
        };
        let app = make_app(config, store);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            data_file,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Reads the catalog straight from disk, bypassing HTTP
    pub async fn snapshot_on_disk(&self) -> Snapshot {
        JsonFileDramaStore::new(&self.data_file)
            .load()
            .await
            .expect("Failed to read data file")
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
