use super::RequestsLoggingLevel;

pub const DEFAULT_ADMIN_TOKEN: &str = "change-me-admin-token";
pub const DEFAULT_CORS_ORIGIN: &str = "*";

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub bind_address: String,
    pub port: u16,
    /// Shared secret expected in the admin header of every mutating request.
    pub admin_token: String,
    /// Origin allowed to call the API from a browser, `*` for any.
    pub cors_origin: String,
    /// Largest page size honored by the list route. Unbounded when unset.
    pub max_page_limit: Option<usize>,
    /// Largest number of records a single seed request adds. Unbounded when unset.
    pub max_seed_count: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            bind_address: "0.0.0.0".to_owned(),
            port: 4000,
            admin_token: DEFAULT_ADMIN_TOKEN.to_owned(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_owned(),
            max_page_limit: None,
            max_seed_count: None,
        }
    }
}
