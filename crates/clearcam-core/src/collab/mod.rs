//! Collaborator interfaces: the video player that supplies frames and the
//! persistence backend that receives exported images.

mod directory;
mod memory;
mod still;

pub use directory::{DirectoryUploader, default_upload_dir};
pub use memory::MemoryUploader;
pub use still::StillFrameSource;

use crate::time_sync::PlaybackStatus;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Boxed future returned by collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Failures reported by the video collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Could not decode video: {0}")]
    Decode(String),
    #[error("Network error while loading video: {0}")]
    Network(String),
    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),
    #[error("Video is not ready")]
    NotReady,
}

/// Failures reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Upload failed, backend unreachable: {0}")]
    Connectivity(String),
    #[error("Upload rejected: {0}")]
    Permission(String),
    #[error("Upload failed: {0}")]
    Other(String),
}

/// A decoded video frame, RGBA8, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedFrame {
    /// Wrap raw RGBA pixels, checking the buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: rgba.repeat(count),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// The video playback collaborator.
pub trait FrameSource: Send + Sync {
    /// Current playback snapshot.
    fn status(&self) -> PlaybackStatus;

    /// Seek and resolve once the frame at `time` is displayable.
    fn seek(&self, time: f64) -> BoxFuture<'_, Result<(), PlaybackError>>;

    /// Decode the frame at the current position at native resolution.
    fn decode_frame(&self) -> BoxFuture<'_, Result<DecodedFrame, PlaybackError>>;

    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;

    fn pause(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;
}

/// An image handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub image_bytes: Vec<u8>,
    pub mime_type: String,
    pub video_name: String,
    pub frame_time: f64,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket_location: String,
    pub object_path: String,
}

impl UploadReceipt {
    /// `bucket/object` form, for display.
    pub fn location(&self) -> String {
        format!("{}/{}", self.bucket_location, self.object_path)
    }
}

/// The persistence collaborator.
pub trait FrameUploader: Send + Sync {
    fn upload_frame(&self, request: UploadRequest) -> BoxFuture<'_, Result<UploadReceipt, UploadError>>;
}

/// Make a video name safe for object paths: anything outside
/// `[A-Za-z0-9_-]` becomes `_`, then the result is lowercased.
pub fn sanitize_video_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() { "video".to_string() } else { safe }
}

/// File extension used for an image MIME type.
pub fn extension_for(mime_type: &str) -> &'static str {
    if mime_type == "image/png" { "png" } else { "jpg" }
}

/// Object path for an upload: `<video>/<video>-<millis>-<token>.<ext>`.
pub fn object_path_for(request: &UploadRequest, token: &str) -> String {
    let video = sanitize_video_name(&request.video_name);
    let millis = if request.frame_time.is_finite() {
        (request.frame_time * 1000.0).round() as i64
    } else {
        chrono::Utc::now().timestamp_millis()
    };
    format!(
        "{video}/{video}-{millis}-{token}.{}",
        extension_for(&request.mime_type)
    )
}

/// Object path with a fresh random token.
pub fn generate_object_path(request: &UploadRequest) -> String {
    let token = Uuid::new_v4().simple().to_string();
    object_path_for(request, &token[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(video: &str, time: f64) -> UploadRequest {
        UploadRequest {
            image_bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
            video_name: video.to_string(),
            frame_time: time,
        }
    }

    #[test]
    fn test_sanitize_video_name() {
        assert_eq!(sanitize_video_name("JA 2.MP4"), "ja_2_mp4");
        assert_eq!(sanitize_video_name("case-07_b"), "case-07_b");
        assert_eq!(sanitize_video_name(""), "video");
    }

    #[test]
    fn test_object_path() {
        assert_eq!(
            object_path_for(&request("JA_2.mp4", 12.4), "deadbeef"),
            "ja_2_mp4/ja_2_mp4-12400-deadbeef.png"
        );
        let mut jpeg = request("clip", 0.0005);
        jpeg.mime_type = "image/jpeg".to_string();
        assert_eq!(object_path_for(&jpeg, "00000000"), "clip/clip-1-00000000.jpg");
    }

    #[test]
    fn test_generated_token_length() {
        let path = generate_object_path(&request("clip", 1.0));
        let file = path.rsplit('/').next().unwrap();
        let token = file.trim_end_matches(".png").rsplit('-').next().unwrap();
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_decoded_frame() {
        assert!(DecodedFrame::new(2, 2, vec![0; 15]).is_none());
        let frame = DecodedFrame::solid(2, 1, [9, 8, 7, 255]);
        assert_eq!(frame.pixel(1, 0), Some([9, 8, 7, 255]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
