//! Request authentication: the AuthUser extractor
//!
//! Auth is a hard prerequisite for every owner-gated handler; there is no
//! guest fallback.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::AppState;
use crate::services::{error::ApiError, session};

/// Extractor that validates the access-token cookie (or an
/// `Authorization: Bearer` header) and yields the actor's user id.
pub struct AuthUser(pub i64);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                eprintln!("Cookie extraction error: {:?}", e);
                ApiError::Internal
            })?;

        let token = match jar.get("access_token").map(|c| c.value().to_string()) {
            Some(token) => token,
            None => bearer_token(parts)
                .ok_or(ApiError::Unauthorized("Authentication required"))?,
        };

        let user_id = session::validate_access_token(&token, &state.jwt_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

        Ok(AuthUser(user_id))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}
