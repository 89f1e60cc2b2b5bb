//! Media probing via ffprobe.
//!
//! Uploaded videos report their own duration; we read it from the bytes with
//! an ffprobe child process before the record is persisted.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

type MediaError = Box<dyn std::error::Error + Send + Sync>;

fn temp_media_path(ext: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("vidhub_probe_{}_{}.{}", std::process::id(), nanos, ext))
}

/// Probe the duration (seconds) of a media payload.
/// Writes the bytes to a temp file, runs ffprobe, and cleans up.
pub async fn probe_duration(data: &[u8], ext: &str) -> Result<f64, MediaError> {
    let path = temp_media_path(ext);
    tokio::fs::write(&path, data).await?;

    let result = run_ffprobe(&path).await;

    // Remove the temp file regardless of probe outcome
    let _ = tokio::fs::remove_file(&path).await;

    result
}

async fn run_ffprobe(path: &PathBuf) -> Result<f64, MediaError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("ffprobe failed: {}", stderr).into());
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

/// ffprobe reports the duration as a decimal string; coerce it to f64
fn parse_duration(raw: &str) -> Result<f64, MediaError> {
    let trimmed = raw.trim();
    let duration: f64 = trimmed
        .parse()
        .map_err(|_| format!("unparseable ffprobe duration: {:?}", trimmed))?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(format!("invalid duration: {}", duration).into());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.5\n").unwrap(), 12.5);
        assert_eq!(parse_duration("0").unwrap(), 0.0);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("-3.0").is_err());
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let a = temp_media_path("mp4");
        let b = temp_media_path("mp4");
        assert_ne!(a, b);
    }
}
