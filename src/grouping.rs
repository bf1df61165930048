//! Optional topic grouping path.
//!
//! Asks the delegate to bucket video titles under free-form topic labels and
//! reconciles the labels back to full records. This path makes a weaker
//! guarantee than scheduling: titles the delegate invents are dropped, and a
//! video left out of every group stays ungrouped. Callers must tolerate
//! partial coverage or fall back to the flat list.

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::PlannerError;
use crate::llm::LlmProvider;
use crate::types::{TopicGroup, Video};

/// Build the grouping request. Only titles are sent; durations are not
/// relevant to topical similarity.
pub fn build_grouping_prompt(videos: &[Video]) -> String {
    let titles_text = videos
        .iter()
        .map(|v| format!("- {}", v.title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an educational assistant. Categorize the following video titles \
         into meaningful topics.\n\
         Respond with a single JSON object mapping topic name to a list of the \
         titles below, copied verbatim, and nothing else:\n\
         {{\"Topic Name\": [\"Title 1\", \"Title 2\"]}}\n\n\
         Video titles:\n{}\n",
        titles_text
    )
}

/// Ask the delegate for a topic grouping of `videos` and resolve the reply
/// back to full records. A reply that cannot be parsed as a JSON object is a
/// `ResponseFormat` error; the caller decides whether to proceed ungrouped.
pub async fn group_videos_by_topic(
    provider: &dyn LlmProvider,
    videos: &[Video],
) -> Result<Vec<TopicGroup>, PlannerError> {
    let prompt = build_grouping_prompt(videos);
    let reply = provider.generate_text(&prompt).await?;
    let parsed = parse_grouping_reply(&reply)?;
    Ok(reconcile_groups(parsed, videos))
}

/// Parse the delegate's grouping reply into label -> titles. The reply may be
/// wrapped in code fences or prose; only the first-to-last brace span is
/// considered.
pub fn parse_grouping_reply(reply: &str) -> Result<BTreeMap<String, Vec<String>>, PlannerError> {
    let candidate = extract_object_payload(reply);
    serde_json::from_str(candidate)
        .map_err(|e| PlannerError::ResponseFormat(format!("{} (reply: {:?})", e, reply)))
}

fn extract_object_payload(reply: &str) -> &str {
    let trimmed = strip_code_fences(reply);
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string ("json", "...") on the opening fence line.
        let body = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or(rest);
        let body = body.rfind("```").map(|i| &body[..i]).unwrap_or(body);
        return body.trim();
    }
    trimmed
}

/// Resolve grouped titles back to full records. Title is the join key and
/// the first matching video wins; unknown titles are dropped. Labels whose
/// titles all fail to resolve are omitted.
pub fn reconcile_groups(
    grouped: BTreeMap<String, Vec<String>>,
    videos: &[Video],
) -> Vec<TopicGroup> {
    let mut groups = Vec::with_capacity(grouped.len());
    for (label, titles) in grouped {
        let resolved: Vec<Video> = titles
            .iter()
            .filter_map(|title| videos.iter().find(|v| &v.title == title).cloned())
            .collect();
        if resolved.is_empty() {
            debug!(label = %label, "dropping topic with no resolvable titles");
            continue;
        }
        groups.push(TopicGroup {
            label,
            videos: resolved,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubLlmProvider;

    fn videos() -> Vec<Video> {
        vec![
            Video::new("X", 60),
            Video::new("Y", 120),
            Video::new("Z", 180),
        ]
    }

    #[tokio::test]
    async fn test_grouping_resolves_titles_to_full_records() {
        let provider =
            StubLlmProvider::with_reply(r#"{"Topic1": ["X", "Z"], "Topic2": ["Y"]}"#);
        let groups = group_videos_by_topic(&provider, &videos()).await.unwrap();

        assert_eq!(groups.len(), 2);
        let topic1 = groups.iter().find(|g| g.label == "Topic1").unwrap();
        assert_eq!(topic1.videos, vec![Video::new("X", 60), Video::new("Z", 180)]);
        let topic2 = groups.iter().find(|g| g.label == "Topic2").unwrap();
        assert_eq!(topic2.videos, vec![Video::new("Y", 120)]);
    }

    #[tokio::test]
    async fn test_grouping_drops_unknown_titles_and_tolerates_partial_coverage() {
        // "W" is foreign, "Z" is never grouped; neither is an error.
        let provider = StubLlmProvider::with_reply(r#"{"Topic1": ["X", "W"], "Topic2": ["Y"]}"#);
        let groups = group_videos_by_topic(&provider, &videos()).await.unwrap();

        let all: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.videos.iter().map(|v| v.title.as_str()))
            .collect();
        assert_eq!(all, vec!["X", "Y"]);
    }

    #[tokio::test]
    async fn test_grouping_reply_in_code_fence_parses() {
        let provider =
            StubLlmProvider::with_reply("```json\n{\"Topic1\": [\"X\"]}\n```");
        let groups = group_videos_by_topic(&provider, &videos()).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].videos, vec![Video::new("X", 60)]);
    }

    #[tokio::test]
    async fn test_unparseable_grouping_reply_is_response_format_error() {
        let provider = StubLlmProvider::with_reply("I could not categorize these videos.");
        let err = group_videos_by_topic(&provider, &videos())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::ResponseFormat(_)));
    }

    #[test]
    fn test_topics_with_no_resolvable_titles_are_omitted() {
        let mut grouped = BTreeMap::new();
        grouped.insert("Ghost".to_string(), vec!["W".to_string()]);
        grouped.insert("Real".to_string(), vec!["X".to_string()]);
        let groups = reconcile_groups(grouped, &videos());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Real");
    }
}
