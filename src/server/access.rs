use super::error::ApiError;
use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;

pub const HEADER_ADMIN_TOKEN_KEY: &str = "x-admin-token";

/// Proof that the request carried the shared admin secret. Taking it as a
/// handler argument gates the handler before the body or the store are
/// touched.
#[derive(Debug)]
pub struct AdminAccess;

/// Byte-for-byte comparison of the admin header against the configured secret.
pub fn authorize(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(HEADER_ADMIN_TOKEN_KEY)
        .map(|v| v.as_bytes() == secret.as_bytes())
        .unwrap_or(false)
}

impl FromRequestParts<ServerState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if authorize(&parts.headers, &ctx.config.admin_token) {
            Ok(AdminAccess)
        } else {
            debug!(
                "Rejected {} {}: missing or wrong admin token",
                parts.method, parts.uri
            );
            Err(ApiError::Unauthorized)
        }
    }
}
