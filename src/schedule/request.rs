//! Distribution request construction.
//!
//! The request text is a collaborator contract: the validator relies on the
//! reply shape demanded here (a strict JSON array of `{"day", "videos"}`
//! objects). The text is deterministic for a given input so prompt changes
//! show up in review rather than at runtime.

use std::fmt::Write as _;

use crate::types::{TopicGroup, Video};

/// What the delegate is asked to distribute: the flat playlist, or the
/// topic-grouped view produced by the grouping path.
pub enum ScheduleInput<'a> {
    Flat(&'a [Video]),
    Grouped(&'a [TopicGroup]),
}

impl ScheduleInput<'_> {
    pub fn video_count(&self) -> usize {
        match self {
            ScheduleInput::Flat(videos) => videos.len(),
            ScheduleInput::Grouped(groups) => groups.iter().map(|g| g.videos.len()).sum(),
        }
    }

    fn listing(&self) -> String {
        let mut out = String::new();
        match self {
            ScheduleInput::Flat(videos) => {
                for video in *videos {
                    let _ = writeln!(out, "- {}", video.title);
                }
            }
            ScheduleInput::Grouped(groups) => {
                for group in *groups {
                    let _ = writeln!(out, "Topic: {}", group.label);
                    for video in &group.videos {
                        let _ = writeln!(out, "- {}", video.title);
                    }
                }
            }
        }
        out
    }
}

/// Build the natural-language distribution request. States the total video
/// count, day count, target per-day count (one decimal) and the ±1 tolerance,
/// and demands a strictly-parseable JSON array reply.
pub fn build_schedule_prompt(
    input: &ScheduleInput<'_>,
    total_days: u32,
    max_videos_per_day: Option<u32>,
) -> String {
    let total_videos = input.video_count();
    let target = total_videos as f64 / total_days as f64;

    let mut prompt = format!(
        "Distribute the following {total_videos} videos across {total_days} study days.\n\
         Target {target:.1} videos per day; each day may deviate from the target by at \
         most 1 video.\n"
    );
    if let Some(cap) = max_videos_per_day {
        let _ = writeln!(prompt, "Never schedule more than {} videos on one day.", cap);
    }
    if matches!(input, ScheduleInput::Grouped(_)) {
        prompt.push_str("Keep videos from the same topic on the same or adjacent days where possible.\n");
    }
    prompt.push_str(
        "Use every video exactly once, copying each title verbatim.\n\
         Respond with ONLY a JSON array of objects, one per day, numbered 1 through the \
         last day, in this exact shape and nothing else:\n\
         [{\"day\": 1, \"videos\": [\"Title A\", \"Title B\"]}]\n\nVideos:\n",
    );
    prompt.push_str(&input.listing());
    prompt
}
