//! # Bridge Routes
//!
//! - `GET /rankings?servers=ip:port,...` aggregates the named servers.
//! - `GET /allrankings` aggregates every populated server in the directory.
//! - `GET /rankedservers` returns the directory itself.
//!
//! Other methods on these paths get 405, other paths 404. Every request,
//! including its directory fetch and fan-out, is bounded by one deadline.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, Request, State, rejection::QueryRejection},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::compression::CompressionLayer;
use tracing::{debug, info};

use lib_qlsbridge::qlstats::populated_addresses;
use lib_qlsbridge::{AggregationResult, Aggregator, RankingSource, ServerSummary, resolve_all};

use super::errors::ApiError;

pub const ALL_RANKINGS_ENDPOINT: &str = "/allrankings";
pub const RANKINGS_ENDPOINT: &str = "/rankings";
pub const RANKED_SERVERS_ENDPOINT: &str = "/rankedservers";

/// Shared state of the HTTP handlers.
pub struct AppState<S> {
    aggregator: Aggregator<S>,
}

impl<S: RankingSource> AppState<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            aggregator: Aggregator::new(source),
        }
    }
}

/// Per-process switches that shape the router.
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    /// Bound on every request.
    pub deadline: Duration,
    /// Gzip responses for clients that accept it.
    pub gzip: bool,
}

pub fn build_router<S: RankingSource>(state: AppState<S>, options: RouterOptions) -> Router {
    let app = Router::new()
        .route(
            ALL_RANKINGS_ENDPOINT,
            get(all_rankings_handler::<S>).fallback(method_not_allowed),
        )
        .route(
            RANKINGS_ENDPOINT,
            get(rankings_handler::<S>).fallback(method_not_allowed),
        )
        .route(
            RANKED_SERVERS_ENDPOINT,
            get(ranked_servers_handler::<S>).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(Arc::new(state))
        .layer(middleware::from_fn_with_state(options.deadline, enforce_deadline));

    if options.gzip {
        app.layer(CompressionLayer::new())
    } else {
        app
    }
}

async fn rankings_handler<S: RankingSource>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<AggregationResult>, ApiError> {
    let Query(params) = query.map_err(|_| ApiError::NotFound)?;
    let requested = query_string_vals(&params, "servers").ok_or(ApiError::NotFound)?;

    let addresses = resolve_all(&requested).await;
    if addresses.is_empty() {
        debug!("None of {} requested servers resolved", requested.len());
        return Err(ApiError::NotFound);
    }

    Ok(Json(state.aggregator.aggregate(&addresses).await))
}

async fn all_rankings_handler<S: RankingSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<AggregationResult>, ApiError> {
    let servers = state.aggregator.source().fetch_servers().await?;
    let addresses = populated_addresses(&servers).await;
    info!("{} of {} ranked servers are populated", addresses.len(), servers.len());

    Ok(Json(state.aggregator.aggregate(&addresses).await))
}

async fn ranked_servers_handler<S: RankingSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ServerSummary>>, ApiError> {
    Ok(Json(state.aggregator.source().fetch_servers().await?))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Races the rest of the stack against the request deadline. On expiry the
/// inner future is dropped, which detaches any fan-out still in flight.
async fn enforce_deadline(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            info!("{} did not finish within {:?}", path, deadline);
            ApiError::DeadlineExceeded.into_response()
        }
    }
}

/// Comma-separated values of the first query key matching `key`
/// case-insensitively. `None` if the key is absent or its value is empty.
fn query_string_vals(params: &[(String, String)], key: &str) -> Option<Vec<String>> {
    let (_, raw) = params.iter().find(|(k, _)| k.eq_ignore_ascii_case(key))?;
    let vals: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (!vals.is_empty()).then_some(vals)
}
