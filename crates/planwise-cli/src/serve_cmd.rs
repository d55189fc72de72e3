//! `planwise serve`: the learning plan JSON API.
//!
//! Caller identity comes from the `X-User-Id` header, set by a trusted
//! upstream. Read routes are open; everything that creates or changes a plan
//! needs the header.

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use planwise_core::PlanError;
use planwise_core::plan::{GenerationRequest, PlanInput, PlanService, PlanView};

use crate::config::ServerConfig;

pub const USER_ID_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        let status = match &err {
            PlanError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlanError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            PlanError::Unauthorized(_) => StatusCode::FORBIDDEN,
            PlanError::Conflict(_) => StatusCode::CONFLICT,
            PlanError::Storage(source) => {
                tracing::error!("storage failure: {source:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// The user on whose behalf a request is made, from `X-User-Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthenticated("missing X-User-Id header"))?
            .to_str()
            .map_err(|_| AppError::unauthenticated("X-User-Id header is not valid text"))?;

        Uuid::parse_str(raw.trim())
            .map(Caller)
            .map_err(|_| AppError::unauthenticated(format!("malformed X-User-Id header {raw:?}")))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub service: PlanService,
}

/// CORS for the API: a single configured origin, or any origin when unset.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let Some(origin) = allowed_origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin {origin:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn build_router(service: PlanService, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/learning-plans", get(list_plans).post(create_plan))
        .route("/api/v1/learning-plans/generate", post(generate_plan))
        .route(
            "/api/v1/learning-plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/api/v1/learning-plans/{id}/follow", post(follow_plan))
        .route("/api/v1/learning-plans/{id}/unfollow", post(unfollow_plan))
        .route(
            "/api/v1/learning-plans/{plan_id}/topics/{topic_id}/toggle-completion",
            post(toggle_topic),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: PlanService, server: &ServerConfig) -> Result<()> {
    let cors = cors_layer(server.allowed_origin.as_deref())?;
    let app = build_router(service, cors);
    let listener = bind_listener(server).await?;
    let addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    tracing::info!("planwise serve listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("planwise serve shut down");
    Ok(())
}

/// Bind the configured address. `bind` may be a hostname or an IP literal.
async fn bind_listener(server: &ServerConfig) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((server.bind.as_str(), server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", server.bind, server.port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type ApiResult<T> = Result<T, AppError>;

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_plans(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<PlanView>>> {
    let plans = state.service.list(params.user_id.as_deref()).await?;
    Ok(Json(plans.into_iter().map(PlanView::from).collect()))
}

async fn get_plan(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PlanView>> {
    let Path(id) = id?;
    Ok(Json(state.service.get(id).await?.into()))
}

async fn create_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<PlanInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    let Json(input) = body?;
    let detail = state.service.create(&input, caller).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn generate_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PlanView>)> {
    let Json(request) = body?;
    let mut rng = StdRng::from_os_rng();
    let detail = state.service.generate(&request, caller, &mut rng).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn update_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<PlanInput>, JsonRejection>,
) -> ApiResult<Json<PlanView>> {
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Json(state.service.update(id, &input, caller).await?.into()))
}

async fn delete_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.service.delete(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn follow_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PlanView>> {
    let Path(id) = id?;
    Ok(Json(state.service.follow(id, caller).await?.into()))
}

async fn unfollow_plan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PlanView>> {
    let Path(id) = id?;
    Ok(Json(state.service.unfollow(id, caller).await?.into()))
}

async fn toggle_topic(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Json<PlanView>> {
    let Path((plan_id, topic_id)) = ids?;
    let detail = state
        .service
        .toggle_topic(plan_id, topic_id, caller)
        .await?;
    Ok(Json(detail.into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
