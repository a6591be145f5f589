// src/main.rs
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use matchmaker_lib::{
    candidate_generation::profile_snapshot::{load_profiles_from_file, load_scoring_profiles_from_file},
    explanation::{
        annotator::TemplateOnly,
        suggestions::{generate_suggestions, SuggestionKind},
        ExplanationAnnotator, LlmClient, TextGenerator,
    },
    matching::{generate_matches, manager::BestMatchesOutcome, run_group_matching, score_pool, Matcher},
    models::{
        matching::GroupSize,
        profile::{Profile, ScoringProfile},
    },
    utils::{env::load_env, llm_config::LlmConfig, match_config::MatchConfig, progress_config::ProgressConfig},
};

#[derive(Parser)]
#[command(author, version, about = "Profile matching engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank every qualifying pair or triple of a profile snapshot
    Match {
        /// JSON snapshot of group-matching profiles
        #[arg(long)]
        profiles: PathBuf,
        /// Overrides MATCH_GROUP_SIZE (2 or 3)
        #[arg(long)]
        group_size: Option<u8>,
        /// Skip the explanation stage even when text generation is enabled
        #[arg(long)]
        no_explain: bool,
    },
    /// Overall compatibility of one user against the rest of a pool
    Score {
        #[arg(long)]
        profiles: PathBuf,
        #[arg(long)]
        user: String,
    },
    /// Best explained matches for one user
    BestMatches {
        #[arg(long)]
        profiles: PathBuf,
        #[arg(long)]
        user: String,
        /// Overrides MAX_MATCHES
        #[arg(long)]
        max: Option<usize>,
        /// Overrides COMPATIBILITY_THRESHOLD
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Conversation starters, ice breakers or growth ideas for two profiles
    Suggest {
        #[arg(long)]
        profiles: PathBuf,
        #[arg(long)]
        user: String,
        #[arg(long)]
        other: String,
        /// conversation-starters | ice-breakers | growth-suggestions | growth-opportunities
        #[arg(long, default_value = "conversation-starters")]
        kind: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<T: Serialize> {
    run_id: String,
    generated_at: DateTime<Utc>,
    command: &'static str,
    result: T,
}

fn print_report<T: Serialize>(command: &'static str, result: T) -> Result<()> {
    let report = RunReport {
        run_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        command,
        result,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
    println!("{}", json);
    Ok(())
}

fn find_scoring<'a>(pool: &'a [ScoringProfile], id: &str) -> Result<&'a ScoringProfile> {
    pool.iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow!("Profile {} not found in snapshot", id))
}

fn find_profile<'a>(pool: &'a [Profile], id: &str) -> Result<&'a Profile> {
    pool.iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow!("Profile {} not found in snapshot", id))
}

async fn best_matches_with<G: TextGenerator>(
    generator: G,
    match_config: &MatchConfig,
    llm_config: &LlmConfig,
    user: &ScoringProfile,
    pool: &[ScoringProfile],
    max_matches: usize,
    threshold: u32,
) -> BestMatchesOutcome {
    let annotator = ExplanationAnnotator::new(generator, Matcher::default())
        .with_cap(match_config.explanation_cap)
        .with_timeout(llm_config.request_timeout)
        .with_concurrency(llm_config.max_concurrent_requests);
    generate_matches(user, pool, max_matches, threshold, &annotator).await
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let cli = Cli::parse();
    let start_time = Instant::now();

    let mut match_config = MatchConfig::from_env();
    let llm_config = LlmConfig::from_env();
    let progress_config = ProgressConfig::from_env();

    match cli.command {
        Command::Match {
            profiles,
            group_size,
            no_explain,
        } => {
            if let Some(size) = group_size {
                match_config.options.group_size = GroupSize::try_from(size)?;
            }
            match_config.log_config();
            llm_config.log_config();

            let pool = load_profiles_from_file(&profiles)?;
            let matcher = Matcher::default();
            let options = match_config.match_options();

            let outcome = if llm_config.enabled && !no_explain {
                let client = LlmClient::new(llm_config.clone())?;
                let annotator = ExplanationAnnotator::new(client, matcher.clone())
                    .with_cap(match_config.explanation_cap)
                    .with_timeout(llm_config.request_timeout)
                    .with_concurrency(llm_config.max_concurrent_requests);
                let multi_progress = progress_config.create_multi_progress();
                let pb = progress_config.explanation_bar(multi_progress.as_ref(), annotator.cap() as u64);
                run_group_matching(&matcher, &pool, &options, Some(&annotator), pb).await
            } else {
                run_group_matching::<LlmClient>(&matcher, &pool, &options, None, None).await
            };
            print_report("match", outcome)?;
        }
        Command::Score { profiles, user } => {
            let pool = load_scoring_profiles_from_file(&profiles)?;
            let user = find_scoring(&pool, &user)?;
            print_report("score", score_pool(user, &pool))?;
        }
        Command::BestMatches {
            profiles,
            user,
            max,
            threshold,
        } => {
            match_config.log_config();
            llm_config.log_config();
            let pool = load_scoring_profiles_from_file(&profiles)?;
            let user = find_scoring(&pool, &user)?;
            let max_matches = max.unwrap_or(match_config.max_matches);
            let threshold = threshold.unwrap_or(match_config.compatibility_threshold).min(100);

            let outcome = if llm_config.enabled {
                let client = LlmClient::new(llm_config.clone())?;
                best_matches_with(client, &match_config, &llm_config, user, &pool, max_matches, threshold).await
            } else {
                best_matches_with(TemplateOnly, &match_config, &llm_config, user, &pool, max_matches, threshold).await
            };
            print_report("best-matches", outcome)?;
        }
        Command::Suggest {
            profiles,
            user,
            other,
            kind,
        } => {
            let kind = SuggestionKind::parse(&kind).ok_or_else(|| anyhow!("Unknown suggestion kind '{}'", kind))?;
            if !llm_config.enabled {
                bail!("Suggestions need a text generator; set LLM_ENABLED=true");
            }
            llm_config.log_config();
            let pool = load_profiles_from_file(&profiles)?;
            let user = find_profile(&pool, &user)?;
            let other = find_profile(&pool, &other)?;
            let client = LlmClient::new(llm_config.clone())?;
            let suggestions = generate_suggestions(&client, kind, user, other).await?;
            print_report("suggest", suggestions)?;
        }
    }

    info!("Run finished in {:.2?}", start_time.elapsed());
    Ok(())
}
