use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::StatusCode;
use serde::Serialize;
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::images::MAX_IMAGE_BYTES;

/// Seconds to wait for the next multipart field before giving up.
const FIELD_TIMEOUT: u64 = 30;

/// `axum::Json` whose rejections render as [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` whose rejections render as [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

/// A multipart body whose rejection renders as [`AppError`].
pub struct Upload(pub Multipart);

impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Upload(multipart))
    }
}

/// `{ "data": ... }`
#[derive(Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// `{ "message": ..., "data": ... }`
#[derive(Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

/// Parses a path id. Anything that is not a UUID cannot name a record, so it
/// is reported as not found.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found.to_string()))
}

/// The text fields and files of a multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    text: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
}

impl FormData {
    /// A trimmed text field. Missing and blank are both `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.text
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// A trimmed text field, empty when absent.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    /// An uploaded file. An empty part counts as no file.
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files
            .get(name)
            .map(Vec::as_slice)
            .filter(|b| !b.is_empty())
    }
}

/// Reads a whole multipart form. Parts named in `file_fields` are kept as
/// bytes and capped at the image size limit; everything else is text.
pub async fn read_form(mut multipart: Multipart, file_fields: &[&str]) -> Result<FormData> {
    let mut form = FormData::default();
    let timeout_duration = Duration::from_secs(FIELD_TIMEOUT);

    loop {
        let mut field = match timeout(timeout_duration, multipart.next_field()).await {
            Ok(Ok(Some(field))) => field,
            Ok(Ok(None)) => break,
            Ok(Err(e)) => return Err(multipart_error(e)),
            Err(_) => return Err(AppError::Multipart("Upload timeout exceeded".into())),
        };

        let name = field.name().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }

        if file_fields.contains(&name.as_str()) {
            let mut data = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::PayloadTooLarge(
                        "File size exceeds the limit".to_string(),
                    ));
                }
                data.extend_from_slice(&chunk);
            }
            form.files.insert(name, data);
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.text.insert(name, value);
        }
    }

    Ok(form)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File size exceeds the limit".to_string())
    } else {
        AppError::Multipart(format!("Invalid form data: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_not_found() {
        let err = parse_id("not-a-uuid", "Post not found").unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Post not found"));

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "x").unwrap(), id);
    }

    #[test]
    fn blank_text_and_empty_files_are_absent() {
        let mut form = FormData::default();
        form.text.insert("title".into(), "  hello ".into());
        form.text.insert("body".into(), "   ".into());
        form.files.insert("coverImage".into(), Vec::new());

        assert_eq!(form.text("title").as_deref(), Some("hello"));
        assert_eq!(form.text("body"), None);
        assert_eq!(form.text_or_empty("category"), "");
        assert!(form.file("coverImage").is_none());
    }
}
