use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::collect::types::Source;
use crate::store::{SnapshotStore, StoreError, StoredTopic};

pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

impl AppState {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/hot-topics", get(list_topics))
        .route("/api/v1/hot-topics/{source}", get(list_topics_by_source))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "snapshot read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "storage unavailable" })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    source: Option<Source>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    #[serde(default)]
    limit: Option<u32>,
}

/// `?source=` with no value means no filter.
fn blank_as_none<'de, D>(d: D) -> Result<Option<Source>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(d)? {
        Some(s) if !s.trim().is_empty() => s.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to Hot News API" }))
}

async fn list_topics(
    State(state): State<AppState>,
    Query(q): Query<ListParams>,
) -> Result<Json<Vec<StoredTopic>>, ApiError> {
    let rows = state
        .store
        .list(q.source, q.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(rows))
}

async fn list_topics_by_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Query(q): Query<LimitParams>,
) -> Result<Json<Vec<StoredTopic>>, ApiError> {
    let source: Source = source
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid source".into()))?;
    let rows = state
        .store
        .list(Some(source), q.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(rows))
}
