use super::trigger::{IngestionTrigger, TriggerAck};
use super::workflow::IngestionReport;
use crate::domain::article::{Article, ArticleQuery, ArticleStore};
use crate::infra::storage::db::ping;
use crate::types::{InfraError, ValidationError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub trigger: IngestionTrigger,
    pub store: ArticleStore,
}

impl AppState {
    pub fn new(trigger: IngestionTrigger) -> Self {
        let store = trigger.pipeline().store().clone();
        Self { trigger, store }
    }
}

/// ルーターを組み立てる
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(start_ingestion))
        .route("/ingest/status", get(ingestion_status))
        .route("/search", get(search_articles))
        .route("/articles/:id", get(get_article))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// ハンドラのエラー
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    NotFound(String),
    Infra(InfraError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<InfraError> for ApiError {
    fn from(e: InfraError) -> Self {
        Self::Infra(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Infra(e) => {
                tracing::error!(error = %e, "リクエスト処理中にエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match ping(state.store.pool()).await {
        Ok(()) => Json(json!({ "status": "ok", "database": "connected" })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "データベース疎通確認に失敗");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "database": "disconnected" })),
            )
                .into_response()
        }
    }
}

async fn start_ingestion(State(state): State<Arc<AppState>>) -> Response {
    match state.trigger.trigger() {
        TriggerAck::Accepted => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "accepted",
                "message": "取り込みをバックグラウンドで開始しました",
            })),
        )
            .into_response(),
        TriggerAck::AlreadyRunning => (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "already_running",
                "message": "取り込みは実行中です",
            })),
        )
            .into_response(),
    }
}

#[derive(Debug, Serialize)]
struct IngestionStatus {
    running: bool,
    last_report: Option<IngestionReport>,
}

async fn ingestion_status(State(state): State<Arc<AppState>>) -> Json<IngestionStatus> {
    Json(IngestionStatus {
        running: state.trigger.is_running(),
        last_report: state.trigger.last_report().await,
    })
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    count: usize,
    results: Vec<Article>,
}

async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = ArticleQuery::from_params(params.q.as_deref(), params.category.as_deref())?;
    let results = state.store.search(&query).await?;
    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}

async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("記事が見つかりません: {}", id)))
}
