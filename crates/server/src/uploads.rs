use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

/// Product images on disk. Files land in `dir` under a timestamped name and
/// are referenced from product records as `uploads/<file>`, the path the
/// frontend prepends the server origin to.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Writes `bytes` under `<millis>-<sanitized original name>` and returns
    /// the public `uploads/...` path to store on the product.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        let file_name = format!("{}-{}", Utc::now().timestamp_millis(), sanitize(original_name));
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        Ok(format!("uploads/{file_name}"))
    }

    /// Best-effort removal of a previously stored image. Catalog deletes must
    /// not fail because the file already vanished.
    pub async fn remove(&self, image_path: &str) {
        let file_name = match image_path.strip_prefix("uploads/") {
            Some(name) if !name.is_empty() => name,
            _ => {
                warn!(
                    event_name = "uploads.remove_skipped",
                    image_path = %image_path,
                    "image path not managed by the upload store"
                );
                return;
            }
        };

        if let Err(error) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            warn!(
                event_name = "uploads.remove_failed",
                image_path = %image_path,
                error = %error,
                "could not remove stored image"
            );
        }
    }
}

/// Keeps uploaded file names path-safe: anything outside a conservative
/// character set becomes `_`, and path separators can never survive.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
