/// HTTP surface: the same catalog operations as the MCP tools, as a JSON API.
///
/// Errors use the body `{"error": {"code", "message"}}`. Admin routes take
/// `Authorization: Bearer <token>` with a token from `/api/auth/login`.
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::api::{
    CategoryListResponse, CourseListResponse, ImportResponse, LoginParams, LoginResponse,
    OkResponse, StatusResponse,
};
use crate::auth::AdminAuth;
use crate::card::CardBuilder;
use crate::catalog::CatalogService;
use crate::error::{AuthError, ExtractionError};
use crate::extract::PdfDocument;
use crate::model::FilterCriteria;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct HttpContext {
    pub catalog: CatalogService,
    pub auth: Arc<AdminAuth>,
    pub cards: CardBuilder,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("upload exceeds {0} bytes")]
    TooLarge(usize),
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                self.to_string(),
            ),
            ApiError::Auth(AuthError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", self.to_string())
            }
            ApiError::Extraction(e) => {
                let (status, code) = match e {
                    ExtractionError::InvalidFileType(_) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "INVALID_FILE_TYPE")
                    }
                    ExtractionError::MissingCredentials => {
                        (StatusCode::SERVICE_UNAVAILABLE, "EXTRACTION_UNCONFIGURED")
                    }
                    ExtractionError::EmptyResponse
                    | ExtractionError::Malformed(_)
                    | ExtractionError::Upstream(_) => {
                        (StatusCode::BAD_GATEWAY, "EXTRACTION_FAILED")
                    }
                    ExtractionError::Aborted(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
                    }
                };
                (status, code, e.user_message().to_string())
            }
            ApiError::TooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(ctx: HttpContext) -> Router {
    let body_limit = ctx.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/health", get(health))
        .route("/api/courses", get(list_courses))
        .route("/api/categories", get(list_categories))
        .route("/api/status", get(extraction_status))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route(
            "/api/admin/upload",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(ctx)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

async fn list_courses(
    State(ctx): State<HttpContext>,
    Query(criteria): Query<FilterCriteria>,
) -> Json<CourseListResponse> {
    let total = ctx.catalog.courses().await.len();
    let matched = ctx.catalog.filtered(&criteria).await;
    Json(CourseListResponse::new(
        ctx.cards.build_all(&matched),
        total,
        &criteria,
    ))
}

async fn list_categories(State(ctx): State<HttpContext>) -> Json<CategoryListResponse> {
    Json(CategoryListResponse::new(ctx.catalog.categories().await))
}

async fn extraction_status(State(ctx): State<HttpContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: ctx.catalog.status().await,
    })
}

async fn login(
    State(ctx): State<HttpContext>,
    Json(params): Json<LoginParams>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = ctx.auth.login(&params.username, &params.password).await?;
    Ok(Json(LoginResponse { token }))
}

async fn logout(
    State(ctx): State<HttpContext>,
    headers: HeaderMap,
) -> Result<Json<OkResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(AuthError::Unauthorized)?;
    Ok(Json(OkResponse {
        ok: ctx.auth.logout(token).await,
    }))
}

async fn upload(
    State(ctx): State<HttpContext>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    ctx.auth.require_admin(bearer_token(&headers)).await?;

    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read upload bytes");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::TooLarge(ctx.max_upload_bytes)
            } else {
                ApiError::BadRequest(e.body_text())
            }
        })?;
        document = Some(PdfDocument::new(file_name, content_type, bytes.to_vec()));
        break;
    }

    let document =
        document.ok_or_else(|| ApiError::BadRequest("missing multipart field `file`".into()))?;
    if document.bytes.len() > ctx.max_upload_bytes {
        return Err(ApiError::TooLarge(ctx.max_upload_bytes));
    }

    let outcome = ctx.catalog.import_document(document).await?;
    Ok(Json(outcome.into()))
}
