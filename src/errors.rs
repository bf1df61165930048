//! Error taxonomy for the planning pipeline.

use thiserror::Error;

/// Errors surfaced by the planner and its collaborators.
///
/// `MalformedResponse` is fatal to the delegate path but not to the overall
/// operation: the schedule planner routes it into the deterministic repair
/// partition instead of surfacing it to the end user.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Video platform API unreachable or returned a non-success status.
    #[error("failed to fetch playlist metadata: {0}")]
    MetadataFetch(String),

    /// A duration or field in the platform reply could not be parsed.
    #[error("malformed video metadata: {0}")]
    MetadataFormat(String),

    /// A required API credential is absent. Raised before any network call.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The LLM reply for topic grouping is not parseable. The caller decides
    /// whether to proceed without grouping.
    #[error("topic grouping reply is not parseable: {0}")]
    ResponseFormat(String),

    /// The LLM reply for day distribution is not parseable as the expected
    /// JSON array. Carries the raw reply for diagnostics.
    #[error("schedule reply is not a parseable day/videos array: {detail}")]
    MalformedResponse { detail: String, raw: String },

    /// The LLM endpoint failed, timed out, or returned an unusable payload.
    #[error("LLM delegate unavailable: {0}")]
    DelegateUnavailable(String),

    /// Caller violated an argument contract (e.g. zero days requested).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
