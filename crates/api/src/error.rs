use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use soraclean_core::error::CoreError;

/// Message shown when a user has no spendable credits.
pub const PURCHASE_REQUIRED_MESSAGE: &str =
    "You need to purchase a plan to remove watermarks. Visit the pricing page to get started.";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{ "error": ..., "code": ... }`, with extra fields where the
/// browser client relies on them (`needsPurchase`, `details`).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `soraclean_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The user has no subscription with credits left.
    #[error("Insufficient credits")]
    InsufficientCredits,

    /// The server is not configured for real processing.
    #[error("Mock mode enabled")]
    DemoMode,

    /// The provider could not process the video. Carries the provider's
    /// explanation for the client.
    #[error("Failed to process video: {0}")]
    Processing(String),

    /// The provider account itself is out of balance.
    #[error("Provider balance exhausted: {0}")]
    ProviderBalance(String),

    /// The finished artifact could not be fetched from the provider.
    #[error("Failed to download video: {0}")]
    Download(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = Map::new();

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }

            // --- Processing errors ---
            AppError::InsufficientCredits => {
                extra.insert("message".into(), PURCHASE_REQUIRED_MESSAGE.into());
                extra.insert("needsPurchase".into(), Value::Bool(true));
                (
                    StatusCode::FORBIDDEN,
                    "INSUFFICIENT_CREDITS",
                    "Insufficient credits".to_string(),
                )
            }
            AppError::DemoMode => {
                extra.insert(
                    "details".into(),
                    "The app is currently in demo mode and cannot process real videos".into(),
                );
                (
                    StatusCode::BAD_REQUEST,
                    "DEMO_MODE",
                    "Mock mode enabled. Please provide a valid API key and set USE_REAL_API=true"
                        .to_string(),
                )
            }
            AppError::Processing(details) => {
                extra.insert("details".into(), details.clone().into());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROCESSING_FAILED",
                    "Failed to process video".to_string(),
                )
            }
            AppError::ProviderBalance(details) => {
                tracing::error!(error = %details, "Provider balance exhausted");
                extra.insert("details".into(), details.clone().into());
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PROVIDER_BALANCE_EXHAUSTED",
                    "Processing is temporarily unavailable".to_string(),
                )
            }
            AppError::Download(details) => {
                extra.insert("details".into(), details.clone().into());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOWNLOAD_FAILED",
                    "Failed to download video".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Value::Object(map) = &mut body {
            map.extend(extra);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
