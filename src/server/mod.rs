mod access;
pub mod config;
mod error;
mod http_layers;
pub mod server;
pub mod state;

pub use access::HEADER_ADMIN_TOKEN_KEY;
pub use config::ServerConfig;
pub use error::ApiError;
pub use http_layers::*;
pub use server::{make_app, run_server};
