//! Shared constants for end-to-end tests

/// Shared secret the test server is configured with
pub const ADMIN_TOKEN: &str = "e2e-admin-token";

/// Name of the header carrying the shared secret
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Maximum time to wait for the server to answer its home endpoint
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout for each request made by the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
