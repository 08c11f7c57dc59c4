//! Menu image storage on local disk.
//!
//! Files land in `UPLOAD_DIR` under a random name; only the file name is
//! stored on the menu item. Serving the directory is left to the web server.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Accepted image extensions.
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Lower-cased extension of an uploaded file name, if it is an image.
pub fn image_extension(file_name: &str) -> ApiResult<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported image format '{ext}'. Supported: {}",
            SUPPORTED_FORMATS.join(", ")
        )));
    }
    Ok(ext)
}

/// Writes an uploaded image and returns the stored file name.
pub async fn save_image(upload_dir: &Path, original_name: &str, data: &[u8]) -> ApiResult<String> {
    if data.is_empty() {
        return Err(ApiError::BadRequest("Empty image file".to_string()));
    }
    let ext = image_extension(original_name)?;

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(ApiError::internal)?;

    let file_name = format!("{}.{}", Uuid::new_v4().simple(), ext);
    tokio::fs::write(upload_dir.join(&file_name), data)
        .await
        .map_err(ApiError::internal)?;

    debug!(file = %file_name, bytes = data.len(), "Image stored");
    Ok(file_name)
}

/// Removes a previously stored image. Failures are logged, never returned.
pub async fn remove_image(upload_dir: &Path, file_name: &str) {
    let Some(path) = stored_path(upload_dir, file_name) else {
        warn!(file = %file_name, "Refusing to remove image outside upload dir");
        return;
    };

    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(error = %e, path = %path.display(), "Failed to remove image");
    }
}

/// Rejects names that would escape the upload directory.
fn stored_path(upload_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let name = Path::new(file_name);
    match name.file_name() {
        Some(base) if base == name.as_os_str() => Some(upload_dir.join(base)),
        _ => None,
    }
}
