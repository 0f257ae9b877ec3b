//! HTTP surface for the catalog.
//!
//! Every response uses the `{ success, data?, error? }` envelope, including
//! error responses and rejected JSON bodies.

pub mod handlers;

use crate::catalog::{CatalogError, CatalogService};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, event};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<CatalogError> for WebError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(message) => Self::NotFound(message),
            CatalogError::Validation(message) => Self::BadRequest(message),
            CatalogError::Store(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            WebError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            WebError::Internal(message) => {
                event!(Level::ERROR, error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

pub type WebResult<T> = std::result::Result<Json<ApiResponse<T>>, WebError>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

/// Runs the one-time seed before any `/api` handler sees the store.
async fn ensure_seeded(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    state.catalog.ensure_seed().await?;
    Ok(next.run(request).await)
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/datasets",
            get(handlers::list_datasets).post(handlers::create_dataset),
        )
        .route(
            "/datasets/:id",
            get(handlers::get_dataset).put(handlers::update_dataset),
        )
        .route("/datasets/:id/download", get(handlers::download_dataset))
        .route(
            "/datasets/:id/request-access",
            post(handlers::request_access),
        )
        .route("/access-requests", get(handlers::pending_access_requests))
        .route("/my-requests", get(handlers::my_requests))
        .route(
            "/access-requests/:id/approve",
            post(handlers::approve_request),
        )
        .route("/access-requests/:id/deny", post(handlers::deny_request))
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/audit-logs", get(handlers::audit_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), ensure_seeded));

    Router::new()
        .route("/health", get(handlers::healthcheck))
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
