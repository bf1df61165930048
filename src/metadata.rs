//! Playlist metadata retrieval and normalization.
//!
//! Talks to the YouTube Data API (paginated `playlistItems` fetch plus a
//! per-video details call) and converts the platform's ISO-8601 duration
//! encoding into a plain count of seconds. A video whose metadata cannot be
//! parsed is skipped with a warning rather than failing the whole run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::errors::PlannerError;
use crate::types::Video;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 50;

static ISO8601_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .unwrap_or_else(|e| panic!("invalid duration regex: {}", e))
});

/// Convert an ISO-8601 duration (`PT1H2M3S`, `P1DT4H`, ...) to seconds.
pub fn parse_iso8601_duration(duration: &str) -> Result<u64, PlannerError> {
    let caps = ISO8601_DURATION.captures(duration.trim()).ok_or_else(|| {
        PlannerError::MetadataFormat(format!("unparseable ISO-8601 duration: {:?}", duration))
    })?;

    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let (days, hours, minutes, seconds) = (part(1), part(2), part(3), part(4));
    if caps.get(1).is_none()
        && caps.get(2).is_none()
        && caps.get(3).is_none()
        && caps.get(4).is_none()
    {
        // "P" or "PT" alone carries no information.
        return Err(PlannerError::MetadataFormat(format!(
            "empty ISO-8601 duration: {:?}",
            duration
        )));
    }
    Ok(((days * 24 + hours) * 60 + minutes) * 60 + seconds)
}

/// Format seconds as `HH:MM:SS` for display.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Extract the playlist id from a playlist URL's `list` query parameter.
pub fn extract_playlist_id(playlist_url: &str) -> Result<String, PlannerError> {
    let url = Url::parse(playlist_url).map_err(|e| {
        PlannerError::MetadataFormat(format!("invalid playlist URL {:?}: {}", playlist_url, e))
    })?;
    url.query_pairs()
        .find(|(k, _)| k == "list")
        .map(|(_, v)| v.into_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            PlannerError::MetadataFormat(format!(
                "playlist URL has no 'list' parameter: {:?}",
                playlist_url
            ))
        })
}

// Wire shapes for the YouTube Data API.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: VideoSnippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

/// Client for the YouTube Data API.
pub struct YouTubeClient {
    api_key: String,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Build the client. Fails fast with `MissingCredential` when the API key
    /// is empty, before any network call.
    pub fn new(api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self, PlannerError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(PlannerError::MissingCredential(
                "YouTube API key is required".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                PlannerError::MetadataFetch(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self { api_key, client })
    }

    /// Fetch title and duration for every video in a playlist, in playlist
    /// order. Videos with unparseable metadata are skipped.
    pub async fn fetch_playlist_videos(
        &self,
        playlist_url: &str,
    ) -> Result<Vec<Video>, PlannerError> {
        let playlist_id = extract_playlist_id(playlist_url)?;
        let video_ids = self.fetch_playlist_video_ids(&playlist_id).await?;
        debug!(playlist_id = %playlist_id, count = video_ids.len(), "fetched playlist items");

        let mut videos = Vec::with_capacity(video_ids.len());
        for video_id in &video_ids {
            if let Some(video) = self.fetch_video_details(video_id).await? {
                videos.push(video);
            }
        }
        Ok(videos)
    }

    async fn fetch_playlist_video_ids(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<String>, PlannerError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/playlistItems?part=snippet&maxResults={}&playlistId={}&key={}",
                API_BASE, PAGE_SIZE, playlist_id, self.api_key
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", token));
            }

            let response = self.client.get(&url).send().await.map_err(|e| {
                PlannerError::MetadataFetch(format!("playlist request failed: {}", e))
            })?;
            if !response.status().is_success() {
                return Err(PlannerError::MetadataFetch(format!(
                    "playlist request returned HTTP {}; check the playlist URL or API key",
                    response.status().as_u16()
                )));
            }

            let page: PlaylistItemsResponse = response.json().await.map_err(|e| {
                PlannerError::MetadataFetch(format!("unparseable playlist reply: {}", e))
            })?;

            ids.extend(page.items.into_iter().map(|i| i.snippet.resource_id.video_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(ids)
    }

    /// Fetch one video's title and duration. Returns `Ok(None)` when the
    /// video is unavailable or its duration cannot be normalized, matching
    /// the skip-and-continue policy of the playlist fetch.
    pub async fn fetch_video_details(
        &self,
        video_id: &str,
    ) -> Result<Option<Video>, PlannerError> {
        let url = format!(
            "{}/videos?part=contentDetails,snippet&id={}&key={}",
            API_BASE, video_id, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PlannerError::MetadataFetch(format!("video request failed: {}", e)))?;
        if !response.status().is_success() {
            warn!(video_id, status = response.status().as_u16(), "skipping video");
            return Ok(None);
        }

        let body: VideosResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::MetadataFetch(format!("unparseable video reply: {}", e)))?;

        let Some(item) = body.items.into_iter().next() else {
            warn!(video_id, "video has no metadata; skipping");
            return Ok(None);
        };

        match parse_iso8601_duration(&item.content_details.duration) {
            Ok(duration_seconds) => Ok(Some(Video {
                title: item.snippet.title,
                duration_seconds,
            })),
            Err(e) => {
                warn!(video_id, error = %e, "skipping video with malformed duration");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT4M13S").unwrap(), 253);
        assert_eq!(parse_iso8601_duration("PT1H2M3S").unwrap(), 3723);
        assert_eq!(parse_iso8601_duration("PT45S").unwrap(), 45);
        assert_eq!(parse_iso8601_duration("PT2H").unwrap(), 7200);
        assert_eq!(parse_iso8601_duration("P1DT2H").unwrap(), 93600);
        assert_eq!(parse_iso8601_duration("PT0S").unwrap(), 0);
    }

    #[test]
    fn test_parse_iso8601_duration_rejects_garbage() {
        for bad in ["", "P", "PT", "4:13", "PTXS", "one hour"] {
            assert!(
                matches!(
                    parse_iso8601_duration(bad),
                    Err(PlannerError::MetadataFormat(_))
                ),
                "expected MetadataFormat for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(253), "00:04:13");
        assert_eq!(format_duration(3723), "01:02:03");
        assert_eq!(format_duration(360000), "100:00:00");
    }

    #[test]
    fn test_extract_playlist_id() {
        let id = extract_playlist_id(
            "https://www.youtube.com/playlist?list=PL123abc&feature=shared",
        )
        .unwrap();
        assert_eq!(id, "PL123abc");

        // The list parameter also appears on watch URLs.
        let id =
            extract_playlist_id("https://www.youtube.com/watch?v=xyz&list=PL456def").unwrap();
        assert_eq!(id, "PL456def");

        assert!(extract_playlist_id("https://www.youtube.com/watch?v=xyz").is_err());
        assert!(extract_playlist_id("not a url").is_err());
    }
}
