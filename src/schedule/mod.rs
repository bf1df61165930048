//! Day-by-day schedule generation.
//!
//! The planner builds a deterministic distribution request, sends it to the
//! LLM provider, and validates the reply against hard invariants: every input
//! video scheduled exactly once, day numbers contiguous from 1. Any violation
//! or parse failure discards the reply and falls back to a deterministic
//! contiguous partition, so schedule generation never fails on account of the
//! delegate's output. The downgrade is visible to callers through
//! [`PlanSource::Repaired`].

pub mod request;
pub mod validate;

pub use request::{build_schedule_prompt, ScheduleInput};
pub use validate::{
    parse_day_assignments, repair_partition, validate_assignment, RawDayPlan, ScheduleViolation,
};

use tracing::{debug, warn};

use crate::errors::PlannerError;
use crate::grouping::group_videos_by_topic;
use crate::llm::{LlmProvider, LlmProviderInfo};
use crate::types::{PlanSource, StudyPlan, TopicGroup, Video};

/// Orchestrates request building, delegate calls, validation and repair.
pub struct SchedulePlanner {
    provider: Box<dyn LlmProvider>,
}

impl SchedulePlanner {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_info(&self) -> LlmProviderInfo {
        self.provider.info()
    }

    /// Distribute `videos` across `total_days` in playlist order.
    ///
    /// A delegate call failure (network, auth, timeout) surfaces to the
    /// caller; a delegate reply failure (unparseable or invariant-violating)
    /// does not, because the repair partition is total.
    pub async fn generate_study_plan(
        &self,
        videos: &[Video],
        total_days: u32,
        max_videos_per_day: Option<u32>,
    ) -> Result<StudyPlan, PlannerError> {
        check_days(total_days)?;
        let prompt =
            build_schedule_prompt(&ScheduleInput::Flat(videos), total_days, max_videos_per_day);
        self.schedule_with_prompt(&prompt, videos, total_days).await
    }

    /// Group videos by topic first, then distribute with the grouping shown
    /// to the delegate as a coherence hint. Grouping failures propagate as
    /// `ResponseFormat`; the caller decides whether to retry ungrouped.
    /// The returned plan is still validated against the full video list.
    pub async fn generate_study_plan_with_topics(
        &self,
        videos: &[Video],
        total_days: u32,
        max_videos_per_day: Option<u32>,
    ) -> Result<(Vec<TopicGroup>, StudyPlan), PlannerError> {
        check_days(total_days)?;
        let groups = group_videos_by_topic(self.provider.as_ref(), videos).await?;
        debug!(topics = groups.len(), "grouped videos by topic");
        let prompt = build_schedule_prompt(
            &ScheduleInput::Grouped(&groups),
            total_days,
            max_videos_per_day,
        );
        let plan = self.schedule_with_prompt(&prompt, videos, total_days).await?;
        Ok((groups, plan))
    }

    async fn schedule_with_prompt(
        &self,
        prompt: &str,
        videos: &[Video],
        total_days: u32,
    ) -> Result<StudyPlan, PlannerError> {
        let reply = self.provider.generate_text(prompt).await?;

        match parse_day_assignments(&reply) {
            Ok(raw_days) => match validate_assignment(&raw_days, videos, total_days) {
                Ok(days) => {
                    debug!(total_days, "delegate assignment accepted");
                    Ok(StudyPlan {
                        days,
                        source: PlanSource::Delegate,
                    })
                }
                Err(violation) => {
                    warn!(%violation, "delegate assignment rejected; repartitioning deterministically");
                    Ok(repaired_plan(videos, total_days))
                }
            },
            Err(PlannerError::MalformedResponse { detail, .. }) => {
                warn!(%detail, "delegate reply unparseable; repartitioning deterministically");
                Ok(repaired_plan(videos, total_days))
            }
            Err(other) => Err(other),
        }
    }
}

fn check_days(total_days: u32) -> Result<(), PlannerError> {
    if total_days == 0 {
        return Err(PlannerError::InvalidRequest(
            "total_days must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn repaired_plan(videos: &[Video], total_days: u32) -> StudyPlan {
    StudyPlan {
        days: repair_partition(videos, total_days),
        source: PlanSource::Repaired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLlmProvider;

    fn videos(titles: &[&str]) -> Vec<Video> {
        titles.iter().map(|t| Video::new(*t, 60)).collect()
    }

    fn planner(reply: &str) -> SchedulePlanner {
        SchedulePlanner::new(Box::new(StubLlmProvider::with_reply(reply)))
    }

    #[tokio::test]
    async fn test_exact_assignment_is_accepted_in_delegate_order() {
        // Delegate reorders within days; its stated order must be kept.
        let reply = r#"[{"day": 1, "videos": ["B", "A"]}, {"day": 2, "videos": ["C"]}]"#;
        let plan = planner(reply)
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();

        assert_eq!(plan.source, PlanSource::Delegate);
        assert_eq!(plan.days.len(), 2);
        let day1: Vec<&str> = plan.days[0].videos.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(day1, vec!["B", "A"]);
        assert_eq!(plan.days[1].videos[0].title, "C");
    }

    #[tokio::test]
    async fn test_fence_wrapped_assignment_parses_identically() {
        let bare = r#"[{"day": 1, "videos": ["A"]}, {"day": 2, "videos": ["B"]}]"#;
        let fenced = format!("```json\n{}\n```", bare);

        let input = videos(&["A", "B"]);
        let from_bare = planner(bare).generate_study_plan(&input, 2, None).await.unwrap();
        let from_fenced = planner(&fenced).generate_study_plan(&input, 2, None).await.unwrap();
        assert_eq!(from_bare, from_fenced);
        assert_eq!(from_bare.source, PlanSource::Delegate);
    }

    #[tokio::test]
    async fn test_missing_title_triggers_repair() {
        let reply = r#"[{"day": 1, "videos": ["A"]}, {"day": 2, "videos": ["B"]}]"#;
        let plan = planner(reply)
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Repaired);
        assert_eq!(plan.video_count(), 3);
    }

    #[tokio::test]
    async fn test_foreign_title_triggers_repair() {
        let reply = r#"[{"day": 1, "videos": ["A", "Q"]}, {"day": 2, "videos": ["B", "C"]}]"#;
        let plan = planner(reply)
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Repaired);
    }

    #[tokio::test]
    async fn test_duplicated_title_triggers_repair() {
        let reply = r#"[{"day": 1, "videos": ["A", "B"]}, {"day": 2, "videos": ["B", "C"]}]"#;
        let plan = planner(reply)
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Repaired);
        assert_eq!(plan.video_count(), 3);
    }

    #[tokio::test]
    async fn test_free_text_reply_falls_back_to_contiguous_partition() {
        let plan = planner("Sorry, I cannot produce a schedule for that request.")
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();

        assert_eq!(plan.source, PlanSource::Repaired);
        let titles: Vec<Vec<&str>> = plan
            .days
            .iter()
            .map(|d| d.videos.iter().map(|v| v.title.as_str()).collect())
            .collect();
        assert_eq!(titles, vec![vec!["A", "B"], vec!["C"]]);
        assert_eq!(plan.days[0].day, 1);
        assert_eq!(plan.days[1].day, 2);
    }

    #[tokio::test]
    async fn test_bad_day_numbering_triggers_repair() {
        let reply = r#"[{"day": 1, "videos": ["A", "B"]}, {"day": 3, "videos": ["C"]}]"#;
        let plan = planner(reply)
            .generate_study_plan(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Repaired);
    }

    #[tokio::test]
    async fn test_zero_days_is_an_invalid_request() {
        let err = planner("[]")
            .generate_study_plan(&videos(&["A"]), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_topic_path_propagates_grouping_parse_failure() {
        // First reply services the grouping call and is not valid JSON.
        let planner = SchedulePlanner::new(Box::new(StubLlmProvider::with_reply(
            "no structure here",
        )));
        let err = planner
            .generate_study_plan_with_topics(&videos(&["A", "B"]), 2, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::ResponseFormat(_)));
    }

    #[tokio::test]
    async fn test_topic_path_still_enforces_full_coverage() {
        // Grouping covers only A; the schedule reply must still cover all
        // three videos, and does here, so the delegate plan is accepted.
        let planner = SchedulePlanner::new(Box::new(StubLlmProvider::with_replies(vec![
            r#"{"Basics": ["A"]}"#.to_string(),
            r#"[{"day": 1, "videos": ["A", "B"]}, {"day": 2, "videos": ["C"]}]"#.to_string(),
        ])));
        let (groups, plan) = planner
            .generate_study_plan_with_topics(&videos(&["A", "B", "C"]), 2, None)
            .await
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(plan.source, PlanSource::Delegate);
        assert_eq!(plan.video_count(), 3);
    }
}
