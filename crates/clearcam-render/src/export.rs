//! The export pipeline: capture, composite, encode, upload.

use crate::codec::{PNG_MIME, encode_png};
use crate::renderer::FrameCompositor;
use clearcam_core::collab::{DecodedFrame, FrameSource, FrameUploader, UploadReceipt, UploadRequest};
use clearcam_core::export::{ExportError, ExportJob, ExportResolution};
use clearcam_core::outcome::Rejection;
use clearcam_core::time_sync::{capture_seek_time, capture_times};
use clearcam_core::workspace::Workspace;

/// Run one export job to completion.
///
/// Waits for the seek and decode to finish, then flattens the job's shapes
/// onto the frame and uploads the PNG. Does not touch engine state; feed the
/// result to [`Workspace::finish_save`].
pub async fn run_export(
    job: &ExportJob,
    source: &dyn FrameSource,
    compositor: &dyn FrameCompositor,
    uploader: &dyn FrameUploader,
) -> Result<UploadReceipt, ExportError> {
    source.seek(job.ticket.time).await?;
    let frame = source.decode_frame().await?;

    let composed = compositor
        .compose(&frame, &job.shapes, job.display_size, job.native_size)
        .map_err(|e| ExportError::Compose(e.to_string()))?;
    let image_bytes = encode_png(&composed).map_err(|e| ExportError::Encode(e.to_string()))?;
    log::debug!(
        "Encoded {}x{} frame for {} at {:.2}s: {} bytes",
        composed.width,
        composed.height,
        job.video_name,
        job.ticket.time,
        image_bytes.len()
    );

    let receipt = uploader
        .upload_frame(UploadRequest {
            image_bytes,
            mime_type: PNG_MIME.to_string(),
            video_name: job.video_name.clone(),
            frame_time: job.ticket.time,
        })
        .await?;
    Ok(receipt)
}

/// Save the workspace's current frame end to end.
///
/// Holds the workspace for the whole export, so it suits batch use and
/// tests. Interactive hosts call [`Workspace::begin_save`], drive
/// [`run_export`] themselves and keep handling events meanwhile.
pub async fn save_frame(
    workspace: &mut Workspace,
    source: &dyn FrameSource,
    compositor: &dyn FrameCompositor,
    uploader: &dyn FrameUploader,
) -> Result<ExportResolution, Rejection> {
    let job = workspace.begin_save()?;
    let result = run_export(&job, source, compositor, uploader).await;
    Ok(workspace.finish_save(&job.ticket, result))
}

/// Capture timeline thumbnails every `interval` seconds.
///
/// Frames that fail to seek or decode are skipped.
pub async fn capture_thumbnails(source: &dyn FrameSource, interval: f64) -> Vec<(f64, DecodedFrame)> {
    let duration = source.status().duration;
    let mut frames = Vec::new();
    for time in capture_times(duration, interval) {
        let target = capture_seek_time(time, duration);
        if let Err(e) = source.seek(target).await {
            log::warn!("Skipping thumbnail at {:.1}s: {}", time, e);
            continue;
        }
        match source.decode_frame().await {
            Ok(frame) => frames.push((time, frame)),
            Err(e) => log::warn!("Skipping thumbnail at {:.1}s: {}", time, e),
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_image;
    use crate::compositor::RasterCompositor;
    use clearcam_core::collab::{MemoryUploader, PlaybackError, StillFrameSource, UploadError};
    use clearcam_core::export::ExportStatus;
    use clearcam_core::input::Intent;
    use clearcam_core::session::VideoSource;
    use clearcam_core::time_sync::VideoMetadata;

    fn setup(width: u32, height: u32) -> (Workspace, StillFrameSource) {
        let source = StillFrameSource::new(DecodedFrame::solid(width, height, [0, 0, 0, 255]), 65.0);
        let mut ws = Workspace::default();
        let _ = ws.select_video(VideoSource::new("JA_2.mp4", "memory"));
        ws.on_metadata(VideoMetadata {
            duration: 65.0,
            width,
            height,
        });
        (ws, source)
    }

    #[test]
    fn test_save_uploads_composited_png() {
        let (mut ws, source) = setup(1920, 1080);
        ws.seek(12.4);
        let _ = ws.dispatch(&Intent::down(100.0, 100.0));
        let _ = ws.dispatch(&Intent::up(120.0, 100.0));
        assert_eq!(ws.current_shapes().len(), 1);

        let uploader = MemoryUploader::new();
        let resolution = pollster::block_on(save_frame(
            &mut ws,
            &source,
            &RasterCompositor::new(),
            &uploader,
        ))
        .unwrap();
        assert!(matches!(resolution, ExportResolution::Applied(ExportStatus::Saved { .. })));

        let receipt = &uploader.receipts()[0];
        assert!(receipt.object_path.starts_with("ja_2_mp4/ja_2_mp4-12400-"));
        let png = uploader.image(&receipt.object_path).unwrap();
        let image = decode_image(&png).unwrap();
        assert_eq!((image.width, image.height), (1920, 1080));

        // Display canvas is 960x540 for 1080p, so everything doubles.
        assert_eq!(image.pixel(200, 200), Some([0xef, 0x44, 0x44, 255]));
        assert_eq!(image.pixel(239, 200), Some([0xef, 0x44, 0x44, 255]));
        assert_eq!(image.pixel(241, 200), Some([0, 0, 0, 255]));
        assert_eq!(source.status().current_time, 12.4);
    }

    #[test]
    fn test_upload_failure_keeps_local_record() {
        let (mut ws, source) = setup(64, 36);
        ws.seek(2.0);
        let uploader = MemoryUploader::new();
        uploader.set_failure(Some(UploadError::Connectivity("offline".to_string())));

        let resolution = pollster::block_on(save_frame(
            &mut ws,
            &source,
            &RasterCompositor::new(),
            &uploader,
        ))
        .unwrap();
        assert!(matches!(
            resolution,
            ExportResolution::Applied(ExportStatus::SavedLocally { .. })
        ));
        assert_eq!(ws.saved().len(), 1);
        assert!(!ws.is_exporting());
    }

    #[test]
    fn test_decode_failure_reported() {
        let (mut ws, source) = setup(64, 36);
        source.set_failure(Some(PlaybackError::Decode("corrupt frame".to_string())));
        let resolution = pollster::block_on(save_frame(
            &mut ws,
            &source,
            &RasterCompositor::new(),
            &MemoryUploader::new(),
        ))
        .unwrap();
        let ExportResolution::Applied(ExportStatus::Failed { message }) = resolution else {
            panic!("expected failure, got {resolution:?}");
        };
        assert!(message.contains("corrupt frame"));
        assert_eq!(ws.saved().len(), 1);
    }

    #[test]
    fn test_save_rejected_while_playing() {
        let (mut ws, source) = setup(64, 36);
        ws.on_play();
        let result = pollster::block_on(save_frame(
            &mut ws,
            &source,
            &RasterCompositor::new(),
            &MemoryUploader::new(),
        ));
        assert_eq!(result, Err(Rejection::PlaybackActive));
        assert!(ws.saved().is_empty());
    }

    #[test]
    fn test_capture_thumbnails() {
        let source = StillFrameSource::new(DecodedFrame::solid(4, 4, [0, 0, 0, 255]), 25.0);
        let frames = pollster::block_on(capture_thumbnails(&source, 10.0));
        let times: Vec<f64> = frames.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 10.0, 20.0, 25.0]);
        assert!((source.status().current_time - 24.9).abs() < 1e-9);
    }
}
