mod posts;
mod users;

use crate::config::RipplefeedConfig;
use crate::database::Database;
use crate::error::FeedError;
use crate::identity::{Identity, Role};
use anyhow::{Context, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: RipplefeedConfig,
    pub database: Database,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("bad_request", msg),
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("unauthorized", msg),
            ),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, ErrorResponse::new("forbidden", msg))
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg))
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorResponse::new("conflict", msg))
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", "internal server error".into()),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound(msg) => ApiError::NotFound(msg),
            FeedError::Forbidden(msg) => ApiError::Forbidden(msg),
            FeedError::Conflict(msg) => ApiError::Conflict(msg),
            FeedError::Validation(msg) => ApiError::BadRequest(msg),
            FeedError::Internal(err) => ApiError::Internal(err),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    kind: &'static str,
    message: String,
}

impl ErrorResponse {
    fn new(kind: &'static str, message: String) -> Self {
        Self { kind, message }
    }
}

/// Identity forwarded by the upstream gateway after it has verified the
/// caller's token. This process never sees credentials, only the result.
const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

fn identity_from_parts(parts: &Parts) -> Result<Option<Identity>, ApiError> {
    let Some(raw_id) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = raw_id
        .to_str()
        .map_err(|_| ApiError::BadRequest("malformed identity header".into()))?
        .trim()
        .to_owned();
    if user_id.is_empty() {
        return Ok(None);
    }
    let role = match parts.headers.get(USER_ROLE_HEADER) {
        Some(raw_role) => raw_role
            .to_str()
            .map_err(|_| ApiError::BadRequest("malformed identity header".into()))?
            .parse::<Role>()
            .map_err(ApiError::BadRequest)?,
        None => Role::default(),
    };
    Ok(Some(Identity { user_id, role }))
}

/// Extractor for operations that require an authenticated caller.
pub(crate) struct AuthedUser(pub Identity);

/// Extractor for operations that also serve anonymous callers.
pub(crate) struct MaybeUser(pub Option<Identity>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match identity_from_parts(parts)? {
            Some(identity) => Ok(AuthedUser(identity)),
            None => Err(ApiError::Unauthorized(
                "missing authenticated identity".into(),
            )),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(identity_from_parts(parts)?))
    }
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/users", post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::toggle_post_like))
        .route("/posts/:id/likes", get(posts::get_post_likes))
        .route("/posts/:id/comments", post(posts::add_comment))
        .route(
            "/posts/:id/comments/:comment_id/like",
            post(posts::toggle_comment_like),
        )
        .route(
            "/posts/:id/comments/:comment_id/likes",
            get(posts::get_comment_likes),
        )
        .route(
            "/posts/:id/comments/:comment_id/replies",
            post(posts::add_reply),
        )
        .route(
            "/posts/:id/comments/:comment_id/replies/:reply_id/like",
            post(posts::toggle_reply_like),
        )
        .route(
            "/posts/:id/comments/:comment_id/replies/:reply_id/likes",
            get(posts::get_reply_likes),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve_http(config: RipplefeedConfig, database: Database) -> Result<()> {
    let state = AppState {
        config: config.clone(),
        database,
    };
    let router = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
