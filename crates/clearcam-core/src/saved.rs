//! Exported annotation records.
//!
//! A [`SavedAnnotationRecord`] is an immutable snapshot taken when a frame is
//! saved. Records live beside the live buckets and are never derived from
//! them afterwards.

use crate::labels::{LabelSelection, PrimaryLabel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default tolerance, in seconds, within which a save replaces an earlier one.
pub const SAVED_TIME_TOLERANCE: f64 = 0.1;

/// One saved annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnnotationRecord {
    /// Playback time in seconds.
    pub time: f64,
    pub label: PrimaryLabel,
    pub sublabels: Vec<String>,
    /// When the save happened; serialized as RFC 3339.
    pub saved_at: DateTime<Utc>,
}

impl SavedAnnotationRecord {
    pub fn new(time: f64, selection: &LabelSelection) -> Self {
        Self::at(time, selection, Utc::now())
    }

    pub fn at(time: f64, selection: &LabelSelection, saved_at: DateTime<Utc>) -> Self {
        Self {
            time,
            label: selection.primary_label,
            sublabels: selection.sublabels.clone(),
            saved_at,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// What [`SavedAnnotations::record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Appended,
    /// An existing record within tolerance was superseded.
    Replaced,
}

/// Saved records for the active video, in save order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAnnotations {
    records: Vec<SavedAnnotationRecord>,
    #[serde(skip, default = "default_tolerance")]
    tolerance: f64,
}

fn default_tolerance() -> f64 {
    SAVED_TIME_TOLERANCE
}

impl Default for SavedAnnotations {
    fn default() -> Self {
        Self::with_tolerance(SAVED_TIME_TOLERANCE)
    }
}

impl SavedAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            records: Vec::new(),
            tolerance: tolerance.max(0.0),
        }
    }

    /// Add a record, replacing the first one whose time is within tolerance.
    pub fn record(&mut self, record: SavedAnnotationRecord) -> RecordChange {
        let existing = self
            .records
            .iter_mut()
            .find(|r| (r.time - record.time).abs() <= self.tolerance);
        match existing {
            Some(slot) => {
                log::debug!("Replacing saved record at {:.2}s with {:.2}s", slot.time, record.time);
                *slot = record;
                RecordChange::Replaced
            }
            None => {
                self.records.push(record);
                RecordChange::Appended
            }
        }
    }

    pub fn records(&self) -> &[SavedAnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records ordered by playback time, latest first.
    pub fn sorted_newest_first(&self) -> Vec<&SavedAnnotationRecord> {
        let mut sorted: Vec<_> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.time.total_cmp(&a.time));
        sorted
    }

    /// Timeline marker positions in `[0, 1]`, one per record in save order.
    pub fn marker_fractions(&self, duration: f64) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| marker_fraction(r.time, duration))
            .collect()
    }
}

/// Position of `time` along a timeline of length `duration`.
pub fn marker_fraction(time: f64, duration: f64) -> Option<f64> {
    if duration > 0.0 && time.is_finite() {
        Some((time / duration).clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
