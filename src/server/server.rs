use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info};

use crate::catalog::{self, DramaPayload, PagedResult, QueryParams};

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::access::AdminAccess;
use super::error::ApiError;
use super::{apply_cors, log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// An empty body is an empty payload; anything else has to be valid JSON.
fn parse_payload(body: &Bytes) -> Result<DramaPayload, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DramaPayload::default());
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::BadRequest)?;
    Ok(DramaPayload::from_json(value))
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        ok: true,
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

/// Raw query pairs. Repeated keys are kept so that one bad key can't
/// discard the rest of the query string.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn into_pairs(pairs: QueryPairs) -> Vec<(String, String)> {
    pairs.map(|Query(p)| p).unwrap_or_default()
}

async fn list_dramas(
    State(state): State<ServerState>,
    pairs: QueryPairs,
) -> Result<Json<PagedResult>, ApiError> {
    let mut params = QueryParams::from_pairs(into_pairs(pairs));
    if let Some(max) = state.config.max_page_limit {
        params.cap_limit(max);
    }
    let snapshot = state.store.load().await?;
    Ok(Json(catalog::query(&snapshot.dramas, &params)))
}

async fn get_drama(
    State(store): State<GuardedDramaStore>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let snapshot = store.load().await?;
    match snapshot.find(&id) {
        Some(drama) => Ok(Json(drama).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn post_drama(
    _access: AdminAccess,
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_payload(&body)?;

    let _guard = state.write_lock.lock().await;
    let mut snapshot = state.store.load().await?;
    let drama = catalog::create(payload);
    snapshot.prepend(vec![drama.clone()]);
    state.store.replace(&snapshot).await?;

    info!("Created drama {} \"{}\"", drama.id, drama.title);
    Ok((StatusCode::CREATED, Json(drama)).into_response())
}

async fn put_drama(
    _access: AdminAccess,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_payload(&body)?;

    let _guard = state.write_lock.lock().await;
    let mut snapshot = state.store.load().await?;
    let drama = match snapshot.find_mut(&id) {
        Some(drama) => {
            catalog::update(drama, payload);
            drama.clone()
        }
        None => return Err(ApiError::NotFound),
    };
    state.store.replace(&snapshot).await?;

    info!("Updated drama {}", drama.id);
    Ok(Json(drama).into_response())
}

async fn delete_drama(
    _access: AdminAccess,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut snapshot = state.store.load().await?;
    let deleted = snapshot.remove(&id);
    if deleted > 0 {
        state.store.replace(&snapshot).await?;
        info!("Deleted drama {}", id);
    }
    Ok(Json(json!({ "ok": true, "deleted": deleted })).into_response())
}

async fn post_seed(
    _access: AdminAccess,
    State(state): State<ServerState>,
    pairs: QueryPairs,
) -> Result<Response, ApiError> {
    let raw_count = into_pairs(pairs)
        .into_iter()
        .find_map(|(key, value)| (key == "count").then_some(value));
    let mut count = catalog::parse_seed_count(raw_count.as_deref());
    if let Some(max) = state.config.max_seed_count {
        count = count.min(max);
    }

    let _guard = state.write_lock.lock().await;
    let mut snapshot = state.store.load().await?;
    if count > 0 {
        snapshot.prepend(catalog::seed(count));
        state.store.replace(&snapshot).await?;
    }

    info!("Seeded {} dramas", count);
    Ok(Json(json!({ "ok": true, "added": count })).into_response())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub fn make_app(config: ServerConfig, store: GuardedDramaStore) -> Router {
    let state = ServerState::new(config, store);

    let drama_routes: Router = Router::new()
        .route("/dramas", get(list_dramas).post(post_drama))
        .route(
            "/dramas/{id}",
            get(get_drama).put(put_drama).delete(delete_drama),
        )
        .route("/seed", post(post_seed))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/api", drama_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(middleware::from_fn_with_state(state, apply_cors))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Could not listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

pub async fn run_server(config: ServerConfig, store: GuardedDramaStore) -> Result<()> {
    let address = format!("{}:{}", config.bind_address, config.port);
    let app = make_app(config, store);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Could not bind to {}", address))?;

    info!("Ready to serve at {}!", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
