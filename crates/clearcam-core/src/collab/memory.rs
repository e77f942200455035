//! In-memory uploader.

use super::{BoxFuture, FrameUploader, UploadError, UploadReceipt, UploadRequest, generate_object_path};
use std::sync::RwLock;

/// Keeps uploaded images in memory. Useful for tests and dry runs.
#[derive(Default)]
pub struct MemoryUploader {
    uploads: RwLock<Vec<(UploadReceipt, UploadRequest)>>,
    failure: RwLock<Option<UploadError>>,
}

impl MemoryUploader {
    pub const BUCKET: &'static str = "memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail with `error`, or succeed again with
    /// `None`.
    pub fn set_failure(&self, error: Option<UploadError>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = error;
        }
    }

    /// Receipts of successful uploads, oldest first.
    pub fn receipts(&self) -> Vec<UploadReceipt> {
        self.uploads
            .read()
            .map(|uploads| uploads.iter().map(|(receipt, _)| receipt.clone()).collect())
            .unwrap_or_default()
    }

    /// Bytes stored under `object_path`.
    pub fn image(&self, object_path: &str) -> Option<Vec<u8>> {
        let uploads = self.uploads.read().ok()?;
        uploads
            .iter()
            .find(|(receipt, _)| receipt.object_path == object_path)
            .map(|(_, request)| request.image_bytes.clone())
    }
}

impl FrameUploader for MemoryUploader {
    fn upload_frame(&self, request: UploadRequest) -> BoxFuture<'_, Result<UploadReceipt, UploadError>> {
        Box::pin(async move {
            let failure = self
                .failure
                .read()
                .map_err(|e| UploadError::Other(format!("Lock error: {}", e)))?
                .clone();
            if let Some(error) = failure {
                return Err(error);
            }
            let receipt = UploadReceipt {
                bucket_location: Self::BUCKET.to_string(),
                object_path: generate_object_path(&request),
            };
            let mut uploads = self
                .uploads
                .write()
                .map_err(|e| UploadError::Other(format!("Lock error: {}", e)))?;
            uploads.push((receipt.clone(), request));
            Ok(receipt)
        })
    }
}
