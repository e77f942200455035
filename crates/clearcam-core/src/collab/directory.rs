//! Directory-backed uploader for native platforms.

use super::{BoxFuture, FrameUploader, UploadError, UploadReceipt, UploadRequest, generate_object_path};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Writes exported frames below a base directory, using the same object
/// layout as the remote bucket.
pub struct DirectoryUploader {
    base_path: PathBuf,
}

impl DirectoryUploader {
    /// Create an uploader rooted at `base_path`, creating it if needed.
    pub fn new(base_path: PathBuf) -> Result<Self, UploadError> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| io_error(&base_path, e))?;
        }
        Ok(Self { base_path })
    }

    /// Uploader in the default location.
    ///
    /// On Unix: `~/.local/share/clearcam/frames/`
    /// On Windows: `%LOCALAPPDATA%\clearcam\frames\`
    pub fn default_location() -> Result<Self, UploadError> {
        Self::new(default_upload_dir()?)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

/// Default directory for exported frames.
pub fn default_upload_dir() -> Result<PathBuf, UploadError> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| UploadError::Other("Could not determine home directory".to_string()))?;
    Ok(base.join("clearcam").join("frames"))
}

fn io_error(path: &Path, error: std::io::Error) -> UploadError {
    let message = format!("{}: {}", path.display(), error);
    match error.kind() {
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => UploadError::Permission(message),
        ErrorKind::NotFound => UploadError::Connectivity(message),
        _ => UploadError::Other(message),
    }
}

impl FrameUploader for DirectoryUploader {
    fn upload_frame(&self, request: UploadRequest) -> BoxFuture<'_, Result<UploadReceipt, UploadError>> {
        let object_path = generate_object_path(&request);
        let target = self.base_path.join(&object_path);

        Box::pin(async move {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
            fs::write(&target, &request.image_bytes).map_err(|e| io_error(&target, e))?;
            log::info!(
                "Wrote {} bytes for {} at {:.3}s to {}",
                request.image_bytes.len(),
                request.video_name,
                request.frame_time,
                target.display()
            );
            Ok(UploadReceipt {
                bucket_location: self.base_path.display().to_string(),
                object_path,
            })
        })
    }
}
