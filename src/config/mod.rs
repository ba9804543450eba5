mod file_config;

pub use file_config::FileConfig;

use crate::server::config::{DEFAULT_ADMIN_TOKEN, DEFAULT_CORS_ORIGIN};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_DATA_FILE: &str = "data/dramas.json";

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub bind_address: String,
    pub admin_token: String,
    pub cors_origin: String,
    pub data_file: PathBuf,
    pub logging_level: RequestsLoggingLevel,
    pub max_page_limit: Option<usize>,
    pub max_seed_count: Option<usize>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            admin_token: DEFAULT_ADMIN_TOKEN.to_owned(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_owned(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            logging_level: RequestsLoggingLevel::default(),
            max_page_limit: None,
            max_seed_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    pub admin_token: String,
    pub cors_origin: String,
    pub data_file: PathBuf,
    pub logging_level: RequestsLoggingLevel,
    /// Optional cap on the list page size, unbounded when unset.
    pub max_page_limit: Option<usize>,
    /// Optional cap on records added per seed request, unbounded when unset.
    pub max_seed_count: Option<usize>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        let admin_token = file.admin_token.unwrap_or_else(|| cli.admin_token.clone());
        let cors_origin = file.cors_origin.unwrap_or_else(|| cli.cors_origin.clone());
        let data_file = file
            .data_file
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.data_file.clone());

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_page_limit = file.max_page_limit.or(cli.max_page_limit);
        let max_seed_count = file.max_seed_count.or(cli.max_seed_count);

        if admin_token.is_empty() {
            bail!("admin_token must not be empty");
        }
        if cors_origin.trim().is_empty() {
            bail!("cors_origin must not be empty, use \"*\" to allow any origin");
        }
        if max_page_limit == Some(0) {
            bail!("max_page_limit must be at least 1");
        }
        if data_file.as_os_str().is_empty() {
            bail!("data_file must not be empty");
        }
        if data_file.is_dir() {
            bail!("data_file is a directory: {:?}", data_file);
        }
        if let Some(parent) = data_file.parent() {
            if parent.exists() && !parent.is_dir() {
                bail!("Parent of data_file is not a directory: {:?}", parent);
            }
        }

        Ok(Self {
            port,
            bind_address,
            admin_token,
            cors_origin,
            data_file,
            logging_level,
            max_page_limit,
            max_seed_count,
        })
    }

    /// True while the shared secret is still the one shipped in the binary.
    pub fn uses_default_admin_token(&self) -> bool {
        self.admin_token == DEFAULT_ADMIN_TOKEN
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            bind_address: self.bind_address.clone(),
            port: self.port,
            admin_token: self.admin_token.clone(),
            cors_origin: self.cors_origin.clone(),
            max_page_limit: self.max_page_limit,
            max_seed_count: self.max_seed_count,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
