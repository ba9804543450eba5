//! Cross-origin headers for browser clients.

use super::super::state::ServerState;
use crate::server::access::HEADER_ADMIN_TOKEN_KEY;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Value for `access-control-allow-origin`, if this request's origin is allowed.
fn allowed_origin(configured: &str, request_headers: &HeaderMap) -> Option<HeaderValue> {
    if configured == "*" {
        return Some(HeaderValue::from_static("*"));
    }
    let origin = request_headers.get(header::ORIGIN)?.to_str().ok()?;
    if origin == configured {
        HeaderValue::from_str(origin).ok()
    } else {
        None
    }
}

fn decorate(headers: &mut HeaderMap, origin: HeaderValue) {
    let wildcard = origin.as_bytes() == b"*";
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    if !wildcard {
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// Preflight requests are answered here, before routing and auth.
pub async fn apply_cors(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(&state.config.cors_origin, request.headers());

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = origin {
            let headers = response.headers_mut();
            decorate(headers, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            if let Ok(allowed) =
                HeaderValue::from_str(&format!("content-type,{}", HEADER_ADMIN_TOKEN_KEY))
            {
                headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed);
            }
        }
        return response;
    }

    let mut response = next.run(request).await;
    if let Some(origin) = origin {
        decorate(response.headers_mut(), origin);
    }
    response
}
