//! Reply validation and deterministic repair.
//!
//! The delegate's reply is free text with no structural guarantee. Extraction
//! takes the first-to-last bracket span after stripping code fences, parsing
//! goes through `serde_json` only (delegate text is never evaluated), and the
//! parsed assignment is checked against three invariants: no known title
//! missing, no foreign title present, and total occurrence count equal to the
//! input count (which catches intra-reply duplication the set checks miss).
//! Any failure is answered by `repair_partition`, which is total for every
//! `N >= 0`, `total_days >= 1`.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::errors::PlannerError;
use crate::grouping::strip_code_fences;
use crate::types::{DayPlan, Video};

/// One day as stated by the delegate, titles not yet resolved to records.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDayPlan {
    pub day: u32,
    pub videos: Vec<String>,
}

/// Why a structurally valid assignment was rejected. Never user-visible;
/// logged when the repair path replaces the delegate's output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleViolation {
    #[error("day numbers are not exactly 1..={expected}")]
    BadDayNumbering { expected: u32 },
    #[error("{0} known title(s) missing from the assignment")]
    MissingTitles(usize),
    #[error("{0} unknown title(s) in the assignment")]
    ForeignTitles(usize),
    #[error("assignment lists {assigned} title occurrence(s), expected {expected}")]
    CountMismatch { assigned: usize, expected: usize },
}

fn extract_array_payload(reply: &str) -> &str {
    let stripped = strip_code_fences(reply);
    match (stripped.find('['), stripped.rfind(']')) {
        (Some(start), Some(end)) if start < end => &stripped[start..=end],
        // No bracket pair: hand the whole text to the parser. Not expected
        // to succeed, but keeps the failure in one place.
        _ => stripped,
    }
}

/// Parse the raw reply into day assignments. Failure is `MalformedResponse`
/// carrying the raw text; no partial recovery is attempted here.
pub fn parse_day_assignments(reply: &str) -> Result<Vec<RawDayPlan>, PlannerError> {
    let candidate = extract_array_payload(reply);
    serde_json::from_str(candidate).map_err(|e| PlannerError::MalformedResponse {
        detail: e.to_string(),
        raw: reply.to_string(),
    })
}

/// Check the assignment against the completeness/uniqueness/day-numbering
/// invariants and resolve titles back to full records (first title match
/// wins). The delegate's per-day video order is preserved; days are
/// normalized to ascending order.
pub fn validate_assignment(
    raw_days: &[RawDayPlan],
    videos: &[Video],
    total_days: u32,
) -> Result<Vec<DayPlan>, ScheduleViolation> {
    let mut day_numbers: Vec<u32> = raw_days.iter().map(|d| d.day).collect();
    day_numbers.sort_unstable();
    let expected_numbers: Vec<u32> = (1..=total_days).collect();
    if day_numbers != expected_numbers {
        return Err(ScheduleViolation::BadDayNumbering {
            expected: total_days,
        });
    }

    let known: HashSet<&str> = videos.iter().map(|v| v.title.as_str()).collect();
    let assigned: Vec<&str> = raw_days
        .iter()
        .flat_map(|d| d.videos.iter().map(String::as_str))
        .collect();
    let assigned_set: HashSet<&str> = assigned.iter().copied().collect();

    let missing = known.difference(&assigned_set).count();
    if missing > 0 {
        return Err(ScheduleViolation::MissingTitles(missing));
    }
    let foreign = assigned_set.difference(&known).count();
    if foreign > 0 {
        return Err(ScheduleViolation::ForeignTitles(foreign));
    }
    if assigned.len() != videos.len() {
        return Err(ScheduleViolation::CountMismatch {
            assigned: assigned.len(),
            expected: videos.len(),
        });
    }

    let mut ordered: Vec<&RawDayPlan> = raw_days.iter().collect();
    ordered.sort_by_key(|d| d.day);

    Ok(ordered
        .into_iter()
        .map(|raw| DayPlan {
            day: raw.day,
            videos: raw
                .videos
                .iter()
                .filter_map(|title| videos.iter().find(|v| &v.title == title).cloned())
                .collect(),
        })
        .collect())
}

/// Deterministic contiguous partition of `videos` into `total_days` days:
/// `base = N / total_days`, and the first `N % total_days` days take one
/// extra video. Always satisfies the completeness invariant; trailing days
/// are empty when there are more days than videos.
pub fn repair_partition(videos: &[Video], total_days: u32) -> Vec<DayPlan> {
    let days = total_days.max(1) as usize;
    let base = videos.len() / days;
    let remainder = videos.len() % days;

    let mut plans = Vec::with_capacity(days);
    let mut index = 0;
    for day in 1..=days {
        let take = base + usize::from(day <= remainder);
        plans.push(DayPlan {
            day: day as u32,
            videos: videos[index..index + take].to_vec(),
        });
        index += take;
    }
    plans
}
