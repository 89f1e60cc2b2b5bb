//! Object-storage collaborator for uploaded media.
//!
//! Uploads go through the GCS client; deletes are best-effort and go through
//! the cloud-storage client. Media is served by public URL, so every stored
//! object keeps both its bucket path and the derived URL.

use bytes::Bytes;
use chrono::Utc;

type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// A persisted object reference: bucket path + public URL.
/// Both are stored on the owning record so deletion never has to re-derive
/// the path from the URL.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

#[derive(Clone)]
pub struct MediaStore {
    gcs: google_cloud_storage::client::Storage,
    bucket: String,
}

impl MediaStore {
    pub fn new(gcs: google_cloud_storage::client::Storage, bucket: String) -> Self {
        Self { gcs, bucket }
    }

    /// Build an object path like `video/user_12/2025-08-31/1756600000000_9f3a21c4.mp4`.
    /// The random suffix keeps two uploads in the same millisecond from
    /// landing on the same object.
    pub fn object_path(kind: &str, user_id: i64, ext: &str) -> String {
        use rand::Rng;
        let now = Utc::now();
        let day_bucket = now.format("%Y-%m-%d").to_string();
        let timestamp = now.timestamp_millis();
        let nonce: u32 = rand::rng().random();
        format!(
            "{}/user_{}/{}/{}_{:08x}.{}",
            kind, user_id, day_bucket, timestamp, nonce, ext
        )
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, path)
    }

    /// Upload bytes to the bucket and return the stored reference
    pub async fn upload(&self, path: &str, data: Bytes) -> Result<StoredFile, StorageError> {
        let bucket = format!("projects/_/buckets/{}", self.bucket);
        self.gcs
            .write_object(&bucket, path, data)
            .send_buffered()
            .await?;
        Ok(StoredFile {
            path: path.to_string(),
            url: self.public_url(path),
        })
    }

    /// Delete an object from the bucket
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let client = cloud_storage::Client::default();
        client.object().delete(&self.bucket, path).await?;
        Ok(())
    }

    /// Delete an object, logging failures instead of propagating them.
    /// Used by the cascade paths where a stale object must not block the
    /// record mutation.
    pub async fn delete_best_effort(&self, path: &str, context: &str) {
        if let Err(e) = self.delete(path).await {
            eprintln!("[storage] {}: failed to delete {}: {}", context, path, e);
        }
    }
}

/// Map a content type to a file extension for object paths
pub fn get_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_shape() {
        let path = MediaStore::object_path("video", 7, "mp4");
        assert!(path.starts_with("video/user_7/"));
        assert!(path.ends_with(".mp4"));
        assert_eq!(path.split('/').count(), 4);
    }

    #[test]
    fn test_object_paths_for_identical_inputs_are_distinct() {
        let a = MediaStore::object_path("avatar", 0, "png");
        let b = MediaStore::object_path("avatar", 0, "png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(get_extension("video/mp4"), "mp4");
        assert_eq!(get_extension("image/jpeg"), "jpg");
        assert_eq!(get_extension("application/pdf"), "bin");
    }
}
