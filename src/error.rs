use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::multipart::MultipartRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::identity::RejectionReason;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    /// The request field that failed validation.
    pub field: String,
    /// A human readable description of the failure.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A pool construction error.
    #[error("Pool creation error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row was missing a column the model requires.
    #[error("Missing column: {0}")]
    MissingData(String),

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Token signing failed.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Credentials were missing, wrong, or no longer valid.
    #[error("Authentication failed: {0}")]
    Authentication(RejectionReason),

    /// The caller is authenticated but does not own the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A validation error with per-field detail.
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A multipart error.
    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// An uploaded payload exceeded its size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Shorthand for a validation error on a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Maps the error to its status code and client-safe message.
    ///
    /// Anything that could leak internals collapses to a generic message;
    /// the detail goes to the log instead.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::CreatePool(e) => {
                tracing::error!("Pool creation error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::MissingData(column) => {
                tracing::error!("Row is missing column: {}", column);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Hash(e) => {
                tracing::error!("Password hashing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Token(e) => {
                tracing::error!("Token signing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Join(e) => {
                tracing::error!("Blocking task failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Authentication(reason) => {
                tracing::warn!("Authentication rejected: {}", reason);
                (StatusCode::UNAUTHORIZED, reason.public_message().to_string())
            }

            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }

            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }

            AppError::Validation(errors) => {
                tracing::debug!("Validation failed on {} field(s)", errors.len());
                (StatusCode::BAD_REQUEST, "Validation error".to_string())
            }

            AppError::Conflict(msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Multipart(msg) => {
                tracing::debug!("Multipart error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::UnsupportedMediaType(msg) => {
                tracing::debug!("Unsupported media type: {}", msg);
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone())
            }

            AppError::TooManyRequests(msg) => {
                tracing::warn!("Rate limited: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, msg.clone())
            }

            AppError::PayloadTooLarge(msg) => {
                tracing::debug!("Payload too large: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, msg.clone())
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

/// JSON body shared by every error response.
#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let errors = match &self {
            AppError::Validation(errors) => Some(errors.as_slice()),
            _ => None,
        };

        let body = sonic_rs::to_string(&ErrorBody {
            message: &message,
            error: &message,
            errors,
        })
        .unwrap_or_else(|_| {
            r#"{"message":"Internal server error","error":"Internal server error"}"#.to_string()
        });

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        let errors = report
            .iter()
            .map(|(path, error)| FieldError::new(path.to_string(), error.message().to_string()))
            .collect();
        AppError::Validation(errors)
    }
}

/// Body rejections carry parser detail, which stays in the log.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("JSON body rejected: {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::UnsupportedMediaType("Expected a JSON request body".to_string())
            }
            JsonRejection::JsonDataError(_) => {
                AppError::BadRequest("Request body has the wrong shape".to_string())
            }
            rejection if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge("Request body is too large".to_string())
            }
            _ => AppError::BadRequest("Invalid JSON body".to_string()),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!("Multipart body rejected: {}", rejection.body_text());
        AppError::Multipart("Expected a multipart form body".to_string())
    }
}

/// A path segment that cannot be decoded names nothing.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Path rejected: {}", rejection.body_text());
        AppError::NotFound("Not found".to_string())
    }
}
