use crate::error::AppError;

pub async fn index() -> &'static str {
    "Hello from the server"
}

/// Fallback for every unmatched route.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
