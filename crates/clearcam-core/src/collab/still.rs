//! A frame source that always shows the same image.

use super::{BoxFuture, DecodedFrame, FrameSource, PlaybackError};
use crate::time_sync::PlaybackStatus;
use std::sync::RwLock;

/// Plays back a single still image over a nominal duration.
///
/// Stands in for a real player when exporting from a captured frame and in
/// tests.
pub struct StillFrameSource {
    frame: DecodedFrame,
    status: RwLock<PlaybackStatus>,
    failure: RwLock<Option<PlaybackError>>,
}

impl StillFrameSource {
    pub fn new(frame: DecodedFrame, duration: f64) -> Self {
        let status = PlaybackStatus {
            current_time: 0.0,
            duration,
            width: frame.width,
            height: frame.height,
            is_playing: false,
        };
        Self {
            frame,
            status: RwLock::new(status),
            failure: RwLock::new(None),
        }
    }

    /// Make decoding and seeking fail with `error` until cleared.
    pub fn set_failure(&self, error: Option<PlaybackError>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = error;
        }
    }

    fn check(&self) -> Result<(), PlaybackError> {
        match self.failure.read() {
            Ok(failure) => failure.clone().map_or(Ok(()), Err),
            Err(_) => Err(PlaybackError::NotReady),
        }
    }

    fn update(&self, f: impl FnOnce(&mut PlaybackStatus)) -> Result<(), PlaybackError> {
        let mut status = self.status.write().map_err(|_| PlaybackError::NotReady)?;
        f(&mut status);
        Ok(())
    }
}

impl FrameSource for StillFrameSource {
    fn status(&self) -> PlaybackStatus {
        self.status.read().map(|s| *s).unwrap_or_default()
    }

    fn seek(&self, time: f64) -> BoxFuture<'_, Result<(), PlaybackError>> {
        Box::pin(async move {
            self.check()?;
            self.update(|status| {
                status.current_time = time.clamp(0.0, status.duration.max(0.0));
            })
        })
    }

    fn decode_frame(&self) -> BoxFuture<'_, Result<DecodedFrame, PlaybackError>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.frame.clone())
        })
    }

    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        Box::pin(async move {
            self.check()?;
            self.update(|status| status.is_playing = true)
        })
    }

    fn pause(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        Box::pin(async move { self.update(|status| status.is_playing = false) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_and_decode() {
        let source = StillFrameSource::new(DecodedFrame::solid(4, 3, [0, 0, 0, 255]), 65.0);
        pollster::block_on(source.seek(80.0)).unwrap();
        let status = source.status();
        assert_eq!(status.current_time, 65.0);
        assert_eq!((status.width, status.height), (4, 3));

        let frame = pollster::block_on(source.decode_frame()).unwrap();
        assert_eq!(frame.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_play_pause_and_failure() {
        let source = StillFrameSource::new(DecodedFrame::solid(1, 1, [0; 4]), 1.0);
        pollster::block_on(source.play()).unwrap();
        assert!(source.status().is_playing);
        pollster::block_on(source.pause()).unwrap();
        assert!(!source.status().is_playing);

        source.set_failure(Some(PlaybackError::Decode("corrupt".to_string())));
        assert_eq!(
            pollster::block_on(source.decode_frame()),
            Err(PlaybackError::Decode("corrupt".to_string()))
        );
    }
}
