//! JSON HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness probe, `{"status": "healthy"}` |
//! | `GET`  | `/profile` | Aggregated profile document |
//! | `POST` | `/profile` | Replace the profile (Basic auth) |
//! | `PUT`  | `/profile` | Update the profile in place (Basic auth) |
//! | `GET`  | `/projects` | Paginated projects, optional `skill` filter |
//! | `GET`  | `/skills/top` | First five skills |
//! | `GET`  | `/search` | Substring search, `q` required |
//!
//! # Error Contract
//!
//! Every error is a JSON object with a single `error` field:
//!
//! ```json
//! { "error": "Profile not found" }
//! ```
//!
//! Status codes: 400 validation, 401 unauthorized (with a
//! `WWW-Authenticate: Basic` challenge), 404 not found, 429 rate limited,
//! 500 storage or internal failure.
//!
//! # Rate Limits
//!
//! Every route is subject to per-client request quotas (see
//! [`crate::rate_limit`]). Profile writes draw from a further per-client
//! write quota, checked after authentication.
//!
//! # Connections
//!
//! Each handler checks one connection out of the pool for the lifetime of the
//! request. It goes back to the pool when the handler returns, on success or
//! error alike.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRef, Query, State,
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{AdminAuth, AuthGate};
use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::migrate;
use crate::models::{ProfileDocument, ProfileInput, ProjectView, SearchResults, WriteStatus};
use crate::pagination::Page;
use crate::profile;
use crate::projects::{self, ProjectQuery};
use crate::rate_limit::{self, ClientIp, RequestLimiter, WriteLimiter};
use crate::search;
use crate::skills;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: Arc<Config>,
    auth: Arc<AuthGate>,
    writes: Arc<WriteLimiter>,
    requests: Arc<RequestLimiter>,
}

impl AppState {
    /// Build state from an open pool. Fails if no admin password is configured.
    pub fn new(pool: SqlitePool, config: &Config) -> anyhow::Result<Self> {
        let credentials = config.auth.credentials()?;
        Ok(Self {
            pool,
            config: Arc::new(config.clone()),
            auth: Arc::new(AuthGate::new(&credentials)),
            writes: Arc::new(WriteLimiter::new(&config.rate_limit)),
            requests: Arc::new(RequestLimiter::new(&config.rate_limit)),
        })
    }

    pub(crate) fn requests(&self) -> &RequestLimiter {
        &self.requests
    }

    /// Forget clients whose buckets have refilled.
    fn prune_limiters(&self) {
        self.requests.retain_recent();
        self.writes.retain_recent();
    }
}

impl FromRef<AppState> for Arc<AuthGate> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Build the application router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/profile",
            get(handle_get_profile)
                .post(handle_replace_profile)
                .put(handle_update_profile),
        )
        .route("/projects", get(handle_list_projects))
        .route("/skills/top", get(handle_top_skills))
        .route("/search", get(handle_search))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Opens the database, applies the schema, and binds to `[server].bind`.
/// Runs until Ctrl+C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let state = AppState::new(pool.clone(), config)?;
    let pruner = tokio::spawn({
        let state = state.clone();
        async move {
            let mut tick = tokio::time::interval(LIMITER_PRUNE_INTERVAL);
            loop {
                tick.tick().await;
                state.prune_limiters();
            }
        }
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Portfolio API listening on http://{}", config.server.bind);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pruner.abort();
    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Received Ctrl+C, shutting down");
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

// ============ /profile ============

async fn handle_get_profile(State(state): State<AppState>) -> Result<Json<ProfileDocument>> {
    let mut conn = state.pool.acquire().await?;
    let document = profile::get_profile_document(&mut conn).await?;
    Ok(Json(document))
}

async fn handle_replace_profile(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    _auth: AdminAuth,
    body: std::result::Result<Json<ProfileInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    state.writes.check(client)?;
    let Json(input) = body.map_err(json_rejection)?;

    let mut conn = state.pool.acquire().await?;
    let status = profile::replace_profile(&mut conn, &input).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

async fn handle_update_profile(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    _auth: AdminAuth,
    body: std::result::Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<WriteStatus>> {
    state.writes.check(client)?;
    let Json(input) = body.map_err(json_rejection)?;

    let mut conn = state.pool.acquire().await?;
    let status = profile::update_profile(&mut conn, &input).await?;
    Ok(Json(status))
}

fn json_rejection(rejection: JsonRejection) -> Error {
    Error::Validation(rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> Error {
    Error::Validation(rejection.body_text())
}

// ============ GET /projects ============

async fn handle_list_projects(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProjectQuery>, QueryRejection>,
) -> Result<Json<Page<ProjectView>>> {
    let Query(query) = query.map_err(query_rejection)?;

    let mut conn = state.pool.acquire().await?;
    let page = projects::list_projects(&mut conn, &query, &state.config.pagination).await?;
    Ok(Json(page))
}

// ============ GET /skills/top ============

async fn handle_top_skills(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(skills::top_skills(&mut conn).await?))
}

// ============ GET /search ============

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResults>> {
    let Query(params) = params.map_err(query_rejection)?;
    let mut conn = state.pool.acquire().await?;
    let results = search::search(&mut conn, params.q.as_deref()).await?;
    Ok(Json(results))
}
