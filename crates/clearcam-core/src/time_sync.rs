//! Keeps the annotation bucket in step with the video collaborator's clock.

use serde::{Deserialize, Serialize};

/// Whole-second slot used to address annotations within a video.
pub type TimeBucket = u64;

/// Bucket for a playback time. Truncates; negative or non-finite times have
/// no bucket.
pub fn bucket_for(time: f64) -> Option<TimeBucket> {
    if time.is_finite() && time >= 0.0 {
        Some(time.floor() as TimeBucket)
    } else {
        None
    }
}

/// Metadata reported once the video has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// A full snapshot from the video collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub current_time: f64,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub is_playing: bool,
}

/// What a mutation needs to know about time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditScope {
    pub bucket: Option<TimeBucket>,
    pub playing: bool,
}

/// Consequences of a clock change that the coordinator has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeUpdate {
    pub bucket_changed: bool,
    /// Any in-progress drawing gesture must be dropped.
    pub abort_drawing: bool,
}

/// Playback clock as seen by the engine.
#[derive(Debug, Clone, Default)]
pub struct VideoTimeSync {
    current_time: f64,
    is_playing: bool,
    metadata: Option<VideoMetadata>,
    error: Option<String>,
    /// Bumped whenever the frame identity (video or bucket) changes.
    generation: u64,
}

impl VideoTimeSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn current_bucket(&self) -> Option<TimeBucket> {
        bucket_for(self.current_time)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn metadata(&self) -> Option<VideoMetadata> {
        self.metadata
    }

    /// Duration in seconds, zero until metadata arrives.
    pub fn duration(&self) -> f64 {
        self.metadata.map_or(0.0, |m| m.duration)
    }

    /// Native frame size, once known.
    pub fn native_size(&self) -> Option<(u32, u32)> {
        self.metadata
            .filter(|m| m.width > 0 && m.height > 0)
            .map(|m| (m.width, m.height))
    }

    /// Last playback failure reported by the collaborator.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Metadata has loaded and no failure has been reported since.
    pub fn is_ready(&self) -> bool {
        self.metadata.is_some() && self.error.is_none()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scope(&self) -> EditScope {
        EditScope {
            bucket: self.current_bucket(),
            playing: self.is_playing,
        }
    }

    pub fn on_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.error = None;
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Playback error: {}", message);
        self.error = Some(message);
        self.is_playing = false;
    }

    pub fn on_play(&mut self) {
        self.is_playing = true;
    }

    pub fn on_pause(&mut self) {
        self.is_playing = false;
    }

    /// Record a new playback time.
    pub fn on_time_update(&mut self, time: f64) -> TimeUpdate {
        if !time.is_finite() {
            return TimeUpdate::default();
        }
        let before = self.current_bucket();
        self.current_time = time.max(0.0);
        let bucket_changed = before != self.current_bucket();
        if bucket_changed {
            self.generation += 1;
        }
        TimeUpdate {
            bucket_changed,
            abort_drawing: self.is_playing || bucket_changed,
        }
    }

    /// Move to a time chosen by the user, clamped to the video's duration.
    pub fn seek(&mut self, time: f64) -> TimeUpdate {
        let clamped = match self.metadata {
            Some(m) if m.duration > 0.0 => time.clamp(0.0, m.duration),
            _ => time.max(0.0),
        };
        self.on_time_update(clamped)
    }

    /// Apply a full snapshot from the collaborator.
    pub fn apply_status(&mut self, status: PlaybackStatus) -> TimeUpdate {
        if status.duration > 0.0 {
            self.on_metadata(VideoMetadata {
                duration: status.duration,
                width: status.width,
                height: status.height,
            });
        }
        self.is_playing = status.is_playing;
        self.on_time_update(status.current_time)
    }

    /// Forget everything about the previous video.
    pub fn reset_for_video(&mut self) {
        self.current_time = 0.0;
        self.is_playing = false;
        self.metadata = None;
        self.error = None;
        self.generation += 1;
    }
}

/// Times at which timeline thumbnails are captured: every `interval`
/// seconds from zero, plus the very end when it is more than a second past
/// the last capture.
pub fn capture_times(duration: f64, interval: f64) -> Vec<f64> {
    let mut times = Vec::new();
    if !(duration.is_finite() && duration > 0.0 && interval > 0.0) {
        return times;
    }
    let mut t = 0.0;
    while t < duration {
        times.push(t);
        t += interval;
    }
    match times.last() {
        Some(last) if duration - last <= 1.0 => {}
        _ => times.push(duration),
    }
    times
}

/// Seek target for capturing a frame at `time`; the very last instant of a
/// video often fails to decode.
pub fn capture_seek_time(time: f64, duration: f64) -> f64 {
    time.min((duration - 0.1).max(0.0))
}
