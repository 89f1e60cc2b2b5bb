pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod dto;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::Router;
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

use crate::AppState;
use crate::services::error::{ApiError, LogErr};

/// Build all routes for the API, mounted under /api/v1
pub fn build_routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .merge(users::routes())
        .merge(videos::routes())
        .merge(comments::routes())
        .merge(likes::routes())
        .merge(playlists::routes())
        .merge(tweets::routes())
        .merge(subscriptions::routes())
        .merge(dashboard::routes())
        .merge(healthcheck::routes());

    Router::new().nest("/api/v1", api)
}

/// Parse a path identifier, mapping malformed input to a validation error so
/// the caller gets the uniform envelope rather than axum's plain-text 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation(format!("Invalid {}", what)))
}

/// One uploaded file field from a multipart form
pub(crate) struct UploadedField {
    pub content_type: String,
    pub data: Bytes,
}

/// Collected multipart form: file fields and text fields by name
pub(crate) struct MultipartForm {
    files: HashMap<String, UploadedField>,
    texts: HashMap<String, String>,
}

impl MultipartForm {
    /// Drain a multipart stream into memory. File fields are recognized by
    /// the presence of a filename.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut files = HashMap::new();
        let mut texts = HashMap::new();

        while let Some(field) = multipart.next_field().await.log_err(
            "Multipart field error",
            ApiError::validation("Malformed multipart body"),
        )? {
            let Some(name) = field.name().map(|s| s.to_string()) else {
                continue;
            };

            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.log_err(
                    "Multipart file read error",
                    ApiError::validation("Failed to read uploaded file"),
                )?;
                files.insert(name, UploadedField { content_type, data });
            } else {
                let text = field.text().await.log_err(
                    "Multipart text read error",
                    ApiError::validation("Failed to read form field"),
                )?;
                texts.insert(name, text);
            }
        }

        Ok(Self { files, texts })
    }

    pub fn file(&self, name: &str) -> Option<&UploadedField> {
        self.files.get(name)
    }

    /// Required file field, 400 when missing or empty
    pub fn require_file(&self, name: &str) -> Result<&UploadedField, ApiError> {
        self.files
            .get(name)
            .filter(|f| !f.data.is_empty())
            .ok_or_else(|| ApiError::validation(format!("{} file is required", name)))
    }

    /// Required non-blank text field, 400 when missing
    pub fn require_text(&self, name: &str) -> Result<&str, ApiError> {
        self.texts
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::validation(format!("{} is required", name)))
    }
}
