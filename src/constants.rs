//! Application constants

/// GCS bucket name for uploaded media (videos, thumbnails, avatars)
pub const BUCKET_NAME: &str = "vidhub_media";

/// Maximum request body size for video uploads (500 MB)
pub const MAX_UPLOAD_SIZE: usize = 500 * 1024 * 1024;

/// Default page size for paginated list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for paginated list endpoints
pub const MAX_PAGE_SIZE: i64 = 100;
