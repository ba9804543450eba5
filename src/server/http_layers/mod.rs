mod cors;
mod requests_logging;

pub use cors::apply_cors;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
