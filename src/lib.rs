//! studyplanner - turn a YouTube playlist into a multi-day study schedule.
//!
//! The pipeline is sequential and single-request: playlist metadata is fetched
//! and normalized, an LLM is asked to distribute the videos across days (and
//! optionally to group them by topic first), and the LLM's reply is validated
//! against hard completeness/uniqueness invariants. When the reply cannot be
//! trusted, a deterministic repair partition replaces it wholesale, so the
//! caller always receives a schedule covering every video exactly once.

pub mod config;
pub mod errors;
pub mod grouping;
pub mod llm;
pub mod metadata;
pub mod schedule;
pub mod types;

pub use config::PlannerConfig;
pub use errors::PlannerError;
pub use schedule::SchedulePlanner;
pub use types::{DayPlan, PlanSource, StudyPlan, TopicGroup, Video};
