//! Cookie building utilities for session management
//!
//! Centralizes cookie formatting so login, refresh, and logout all set the
//! same attributes.

use axum::http::HeaderValue;

use crate::services::error::ApiError;

/// Cookie configuration constants
pub mod config {
    /// Access token cookie name
    pub const ACCESS_TOKEN_NAME: &str = "access_token";
    /// Refresh token cookie name
    pub const REFRESH_TOKEN_NAME: &str = "refresh_token";
    /// Access token max-age in seconds (10 minutes)
    pub const ACCESS_TOKEN_MAX_AGE_SECS: u32 = 600;
    /// Refresh token max-age in seconds (30 days)
    pub const REFRESH_TOKEN_MAX_AGE_SECS: u32 = 30 * 24 * 60 * 60;
    /// Path for both cookies (all routes)
    pub const COOKIE_PATH: &str = "/";
}

fn is_dev() -> bool {
    std::env::var("ENV").as_deref() != Ok("prod")
}

fn cookie_same_site() -> &'static str {
    match std::env::var("COOKIE_SAMESITE")
        .unwrap_or_else(|_| "Lax".to_string())
        .to_lowercase()
        .as_str()
    {
        "none" => "None",
        "strict" => "Strict",
        _ => "Lax",
    }
}

fn build_cookie(name: &str, value: &str, max_age: u32) -> Result<HeaderValue, ApiError> {
    let same_site = cookie_same_site();
    let secure = if is_dev() { "" } else { " Secure;" };
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite={}; Path={}; Max-Age={}",
        name,
        value,
        secure,
        same_site,
        config::COOKIE_PATH,
        max_age
    );
    cookie.parse().map_err(|_| {
        eprintln!("Failed to parse {} cookie header", name);
        ApiError::Internal
    })
}

/// Build an access token Set-Cookie header value
pub fn build_access_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    build_cookie(
        config::ACCESS_TOKEN_NAME,
        token,
        config::ACCESS_TOKEN_MAX_AGE_SECS,
    )
}

/// Build a refresh token Set-Cookie header value
pub fn build_refresh_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    build_cookie(
        config::REFRESH_TOKEN_NAME,
        token,
        config::REFRESH_TOKEN_MAX_AGE_SECS,
    )
}

/// Build a Set-Cookie header value that clears the access token
pub fn build_clear_access_cookie() -> HeaderValue {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path={}; Max-Age=0",
        config::ACCESS_TOKEN_NAME,
        config::COOKIE_PATH
    )
    .parse()
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build a Set-Cookie header value that clears the refresh token
pub fn build_clear_refresh_cookie() -> HeaderValue {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path={}; Max-Age=0",
        config::REFRESH_TOKEN_NAME,
        config::COOKIE_PATH
    )
    .parse()
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = build_access_cookie("tok123").unwrap();
        let s = cookie.to_str().unwrap();
        assert!(s.starts_with("access_token=tok123;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=600"));
        assert!(s.contains("Path=/"));
    }

    #[test]
    fn test_clear_cookie_zeroes_max_age() {
        let cookie = build_clear_refresh_cookie();
        let s = cookie.to_str().unwrap();
        assert!(s.starts_with("refresh_token=;"));
        assert!(s.contains("Max-Age=0"));
    }
}
