//! Core data model for the planning pipeline.
//!
//! `Video` records are created once by the metadata normalizer and held
//! read-only for the rest of a run. Day and study plans are constructed once,
//! validated, possibly replaced wholesale by the repair path, then handed to
//! presentation and discarded.

use serde::{Deserialize, Serialize};

/// One playlist entry. The title doubles as the identity key when matching
/// LLM output back to records, so duplicate titles collapse to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub duration_seconds: u64,
}

impl Video {
    pub fn new(title: impl Into<String>, duration_seconds: u64) -> Self {
        Self {
            title: title.into(),
            duration_seconds,
        }
    }
}

/// A topic label with the videos the LLM assigned to it. Produced by the
/// optional grouping path; coverage of the input list may be partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    pub label: String,
    pub videos: Vec<Video>,
}

/// One day's ordered slice of the schedule. Day numbers are 1-based,
/// contiguous and unique within a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub videos: Vec<Video>,
}

impl DayPlan {
    pub fn total_duration_seconds(&self) -> u64 {
        self.videos.iter().map(|v| v.duration_seconds).sum()
    }
}

/// Whether a study plan came straight from the LLM or from the deterministic
/// repair partition after the LLM's assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Delegate,
    Repaired,
}

/// The complete day-by-day assignment returned to the caller. Invariant: the
/// multiset union of all days' videos equals the input video set exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub days: Vec<DayPlan>,
    pub source: PlanSource,
}

impl StudyPlan {
    pub fn total_days(&self) -> usize {
        self.days.len()
    }

    pub fn video_count(&self) -> usize {
        self.days.iter().map(|d| d.videos.len()).sum()
    }
}
