//! Error taxonomy and the uniform response envelope.
//!
//! Every handler returns `Result<ApiResponse<T>, ApiError>`; both sides
//! serialize to the same `{statusCode, data, message, success}` shape, with
//! `success` derived from the status code range.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 - missing/malformed input
    Validation(String),
    /// 401 - missing or invalid credentials
    Unauthorized(&'static str),
    /// 403 - actor is not the resource owner
    Forbidden(&'static str),
    /// 404 - referenced entity does not exist
    NotFound(&'static str),
    /// 409 - uniqueness conflict (duplicate username/email)
    Conflict(&'static str),
    /// 500 - storage write did not take effect, upload failed, etc.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Unauthorized(msg) => (*msg).to_string(),
            ApiError::Forbidden(msg) => (*msg).to_string(),
            ApiError::NotFound(msg) => (*msg).to_string(),
            ApiError::Conflict(msg) => (*msg).to_string(),
            ApiError::Internal => "Internal server error".to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status(), self.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "statusCode": status.as_u16(),
            "data": null,
            "message": self.message(),
            "success": false,
        });
        (status, Json(body)).into_response()
    }
}

/// Success envelope wrapping every endpoint payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Extension trait for logging errors and converting to ApiError
pub trait LogErr<T> {
    /// Log error with context and return ApiError::Internal
    fn log_500(self, context: &str) -> Result<T, ApiError>;

    /// Log error with context and return a custom ApiError
    fn log_err(self, context: &str, err: ApiError) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            eprintln!("{}: {}", context, e);
            ApiError::Internal
        })
    }

    fn log_err(self, context: &str, err: ApiError) -> Result<T, ApiError> {
        self.map_err(|e| {
            eprintln!("{}: {}", context, e);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::ok(serde_json::json!({"id": 1}), "fetched");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "fetched");
        assert_eq!(json["data"]["id"], 1);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ApiError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Forbidden("nope").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_created_envelope() {
        let resp = ApiResponse::created(5i64, "made");
        assert_eq!(resp.status_code, 201);
        assert!(resp.success);
    }
}
