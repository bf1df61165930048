//! Planner configuration.
//!
//! Credentials and model settings are passed explicitly into each component's
//! constructor rather than read from ambient globals, so tests can run with
//! fake credentials.

use serde::{Deserialize, Serialize};

use crate::errors::PlannerError;
use crate::llm::LlmProviderConfig;

/// Everything a run needs: the video platform credential and the delegate
/// provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub youtube_api_key: String,
    pub llm: LlmProviderConfig,
    /// Bound on each external HTTP call, in seconds.
    pub timeout_seconds: u64,
}

impl PlannerConfig {
    pub fn new(youtube_api_key: impl Into<String>, llm: LlmProviderConfig) -> Self {
        let timeout_seconds = llm.timeout_seconds.unwrap_or(30);
        Self {
            youtube_api_key: youtube_api_key.into(),
            llm,
            timeout_seconds,
        }
    }

    /// Fail fast on missing credentials, before any network call.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.youtube_api_key.is_empty() {
            return Err(PlannerError::MissingCredential(
                "YouTube API key is required".to_string(),
            ));
        }
        if self.llm.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(PlannerError::MissingCredential(
                "LLM API key is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let llm = LlmProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmProviderConfig::default()
        };

        let config = PlannerConfig::new("", llm.clone());
        assert!(matches!(
            config.validate(),
            Err(PlannerError::MissingCredential(_))
        ));

        let config = PlannerConfig::new(
            "yt-key",
            LlmProviderConfig {
                api_key: None,
                ..llm.clone()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(PlannerError::MissingCredential(_))
        ));

        let config = PlannerConfig::new("yt-key", llm);
        assert!(config.validate().is_ok());
    }
}
