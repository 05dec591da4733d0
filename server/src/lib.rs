use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream};
use pagedex_core::IndexStats;
use pagedex_indexer::{
    DocumentLoader, DocumentSource, IngestConfig, IngestRequest, IngestSummary, JobController,
    JobError, JobStatus, LoadError, LoadedPage, PageTextExtractor, SearchResponse,
    TextDocumentLoader, TextPageExtractor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct PagesRequest {
    pub source: DocumentSource,
    pub page_numbers: Vec<u32>,
}

#[derive(Serialize)]
pub struct PagesResponse {
    pub pages: Vec<LoadedPage>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub stats: IndexStats,
}

pub struct AppState<L = TextDocumentLoader, X = TextPageExtractor> {
    pub controller: Arc<JobController<L, X>>,
    pub admin_token: Option<String>,
}

impl<L, X> Clone for AppState<L, X> {
    fn clone(&self) -> Self {
        Self { controller: self.controller.clone(), admin_token: self.admin_token.clone() }
    }
}

impl AppState {
    pub fn new(config: IngestConfig, admin_token: Option<String>) -> Self {
        let controller = JobController::new(TextDocumentLoader, TextPageExtractor, config);
        Self::with_controller(controller, admin_token)
    }
}

impl<L, X> AppState<L, X> {
    pub fn with_controller(controller: JobController<L, X>, admin_token: Option<String>) -> Self {
        Self { controller: Arc::new(controller), admin_token }
    }
}

/// Failure body is always `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let status = match &err {
            JobError::ConcurrentJob(_) => StatusCode::CONFLICT,
            JobError::NoIndex => StatusCode::NOT_FOUND,
            JobError::Load(LoadError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            JobError::Load(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Router with CORS configured from `CORS_ALLOW_ORIGIN` and the admin token from `ADMIN_TOKEN`.
pub fn build_app(config: IngestConfig) -> Router {
    let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
    build_router(AppState::new(config, admin_token)).layer(cors_from_env())
}

pub fn build_router<L, X>(state: AppState<L, X>) -> Router
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingest", post(ingest_handler::<L, X>))
        .route("/pages", post(pages_handler::<L, X>))
        .route("/search", get(search_handler::<L, X>))
        .route("/stats", get(stats_handler::<L, X>))
        .route("/job", get(job_handler::<L, X>))
        .route("/progress", get(progress_handler::<L, X>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_from_env() -> CorsLayer {
    let any = || CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                any()
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => any(),
    }
}

// Jobs run on their own task so a dropped connection does not abort them.
pub async fn ingest_handler<L, X>(
    State(state): State<AppState<L, X>>,
    headers: HeaderMap,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestSummary>, ApiError>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    authorize(state.admin_token.as_deref(), &headers)?;
    let controller = state.controller.clone();
    let summary = tokio::spawn(async move { controller.ingest(request).await })
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    Ok(Json(summary))
}

pub async fn pages_handler<L, X>(
    State(state): State<AppState<L, X>>,
    headers: HeaderMap,
    Json(request): Json<PagesRequest>,
) -> Result<Json<PagesResponse>, ApiError>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    authorize(state.admin_token.as_deref(), &headers)?;
    let controller = state.controller.clone();
    let job = async move { controller.load_pages(request.source, request.page_numbers).await };
    let pages = tokio::spawn(job)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    Ok(Json(PagesResponse { pages }))
}

pub async fn search_handler<L, X>(
    State(state): State<AppState<L, X>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    Ok(Json(state.controller.search(&params.q)?))
}

pub async fn stats_handler<L, X>(
    State(state): State<AppState<L, X>>,
) -> Result<Json<StatsResponse>, ApiError>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    Ok(Json(StatsResponse { stats: state.controller.stats()? }))
}

pub async fn job_handler<L, X>(State(state): State<AppState<L, X>>) -> Json<JobStatus>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    Json(state.controller.job_status())
}

pub async fn progress_handler<L, X>(
    State(state): State<AppState<L, X>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
    L: DocumentLoader + 'static,
    X: PageTextExtractor<L::Document> + 'static,
{
    let rx = state.controller.subscribe();
    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(progress) => {
                    let event = Event::default().event("progress").json_data(progress);
                    return Some((event, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "progress subscriber lagged")
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn authorize(admin_token: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(required) = admin_token else {
        return Ok(());
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
