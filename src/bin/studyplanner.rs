//! studyplanner CLI - generate a multi-day study schedule from a playlist.
//!
//! # Usage
//!
//! ```bash
//! # Seven-day plan from a playlist
//! studyplanner "https://www.youtube.com/playlist?list=PL..." --days 7
//!
//! # Cap days at 4 videos and group by topic first
//! studyplanner "https://..." --days 5 --max-per-day 4 --group-topics
//!
//! # Machine-readable output
//! studyplanner "https://..." --days 3 --format json
//! ```
//!
//! Credentials come from `--youtube-api-key` / `--llm-api-key` or the
//! `YOUTUBE_API_KEY` / `GROQ_API_KEY` environment variables.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::warn;

use studyplanner::llm::{LlmProviderConfig, LlmProviderFactory, LlmProviderType, DEFAULT_MODEL};
use studyplanner::metadata::{format_duration, YouTubeClient};
use studyplanner::{PlanSource, PlannerConfig, PlannerError, SchedulePlanner, StudyPlan, TopicGroup};

#[derive(Parser)]
#[command(name = "studyplanner")]
#[command(version)]
#[command(about = "Turn a YouTube playlist into a multi-day study schedule", long_about = None)]
struct Cli {
    /// YouTube playlist URL (must carry a `list=` parameter)
    playlist_url: String,

    /// Number of days to spread the playlist over
    #[arg(short, long, default_value_t = 7)]
    days: u32,

    /// Soft cap on videos per day, passed to the delegate
    #[arg(long)]
    max_per_day: Option<u32>,

    /// Group videos by topic before distributing them
    #[arg(long)]
    group_topics: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: String,

    /// API key for the LLM endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    llm_api_key: String,

    /// Model identifier for the LLM endpoint
    #[arg(long, env = "STUDYPLANNER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Override the chat-completions base URL (Groq's by default)
    #[arg(long, env = "STUDYPLANNER_BASE_URL")]
    base_url: Option<String>,

    /// Timeout for each external call, in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyplanner=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let llm_config = LlmProviderConfig {
        provider_type: LlmProviderType::OpenAiCompatible,
        model: cli.model.clone(),
        api_key: Some(cli.llm_api_key.clone()),
        base_url: cli.base_url.clone(),
        timeout_seconds: Some(cli.timeout),
        ..LlmProviderConfig::default()
    };
    let config = PlannerConfig::new(cli.youtube_api_key.clone(), llm_config);
    config.validate().context("invalid configuration")?;

    let youtube = YouTubeClient::new(&config.youtube_api_key, config.timeout_seconds)?;
    let videos = youtube
        .fetch_playlist_videos(&cli.playlist_url)
        .await
        .context("failed to fetch playlist")?;
    if videos.is_empty() {
        anyhow::bail!("no videos found in the playlist");
    }

    let provider = LlmProviderFactory::create(config.llm.clone())?;
    let planner = SchedulePlanner::new(provider);

    let (groups, plan) = if cli.group_topics {
        match planner
            .generate_study_plan_with_topics(&videos, cli.days, cli.max_per_day)
            .await
        {
            Ok((groups, plan)) => (Some(groups), plan),
            // Grouping is best-effort; fall back to the flat path.
            Err(PlannerError::ResponseFormat(detail)) => {
                warn!(%detail, "topic grouping failed; scheduling without topics");
                let plan = planner
                    .generate_study_plan(&videos, cli.days, cli.max_per_day)
                    .await?;
                (None, plan)
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        let plan = planner
            .generate_study_plan(&videos, cli.days, cli.max_per_day)
            .await?;
        (None, plan)
    };

    match cli.format {
        OutputFormat::Plain => print_plain(groups.as_deref(), &plan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn print_plain(groups: Option<&[TopicGroup]>, plan: &StudyPlan) {
    if let Some(groups) = groups {
        println!("Topics:");
        for group in groups {
            println!("  {} ({} videos)", group.label, group.videos.len());
        }
        println!();
    }

    for day in &plan.days {
        println!(
            "Day {} - {} videos, {}",
            day.day,
            day.videos.len(),
            format_duration(day.total_duration_seconds())
        );
        for (idx, video) in day.videos.iter().enumerate() {
            println!(
                "  {:>2}. {} [{}]",
                idx + 1,
                video.title,
                format_duration(video.duration_seconds)
            );
        }
    }

    if plan.source == PlanSource::Repaired {
        println!();
        println!(
            "note: the generated assignment failed validation; this schedule \
             was produced by the deterministic fallback (playlist order)."
        );
    }
}
