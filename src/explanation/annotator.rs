// src/explanation/annotator.rs
// Attaches short "why you matched" texts to the top of a ranked list. Each
// entry's external call is isolated: failure or timeout falls back to a
// deterministic template instead of failing the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::explanation::generator::{TextGenerator, TextPrompt};
use crate::matching::candidates::Matcher;
use crate::matching::normalize::{clean_token, NormalizedProfile};
use crate::matching::shared::shared_tokens;
use crate::models::matching::{CandidateGroup, CompatibilityScore, ScoredMatch};
use crate::models::profile::{Dimension, Profile, ScoringProfile};
use crate::models::stats_models::AnnotationStats;

pub const FALLBACK_EXPLANATION: &str = "Growth potential";
pub const MAX_EXPLANATION_CHARS: usize = 30;
pub const DEFAULT_EXPLANATION_CAP: usize = 10;
pub const DEFAULT_EXPLANATION_TIMEOUT: Duration = Duration::from_secs(10);

const EXPLANATION_SYSTEM_PROMPT: &str =
    "You create very short match explanations. Maximum 30 characters. Use 2-4 words only.";

/// Generator used when no text-generation service is configured; every call
/// fails immediately so the templates take over.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateOnly;

impl TextGenerator for TemplateOnly {
    fn generate(&self, _prompt: &TextPrompt) -> impl std::future::Future<Output = Result<String>> + Send {
        async { Err(anyhow!("no text generator configured")) }
    }
}

enum CallOutcome {
    Generated(String),
    Failed,
    TimedOut,
}

pub struct ExplanationAnnotator<G: TextGenerator> {
    generator: G,
    matcher: Matcher,
    cap: usize,
    call_timeout: Duration,
    concurrency: Arc<Semaphore>,
}

impl<G: TextGenerator> ExplanationAnnotator<G> {
    pub fn new(generator: G, matcher: Matcher) -> Self {
        Self {
            generator,
            matcher,
            cap: DEFAULT_EXPLANATION_CAP,
            call_timeout: DEFAULT_EXPLANATION_TIMEOUT,
            concurrency: Arc::new(Semaphore::new(num_cpus::get().min(8).max(1))),
        }
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.concurrency = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    async fn call(&self, prompt: TextPrompt, label: &str) -> CallOutcome {
        let _permit = match self.concurrency.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Explanation semaphore closed before call for {}", label);
                return CallOutcome::Failed;
            }
        };

        match timeout(self.call_timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(raw)) => match shorten_explanation(&raw) {
                Some(text) => CallOutcome::Generated(text),
                None => {
                    warn!("Empty explanation returned for {}", label);
                    CallOutcome::Failed
                }
            },
            Ok(Err(e)) => {
                warn!("Explanation generation failed for {}: {}", label, e);
                CallOutcome::Failed
            }
            Err(_) => {
                warn!("Explanation generation for {} timed out after {:?}", label, self.call_timeout);
                CallOutcome::TimedOut
            }
        }
    }

    /// Returns an annotated copy of `ranked`. The first `cap` entries get an
    /// explanation (generated or templated); the rest get `None`.
    pub async fn annotate(
        &self,
        ranked: &[CandidateGroup],
        method_pb: Option<ProgressBar>,
    ) -> (Vec<CandidateGroup>, AnnotationStats) {
        let start_time = Instant::now();
        let mut stats = AnnotationStats::default();
        let capped = ranked.len().min(self.cap);

        if let Some(pb) = &method_pb {
            pb.set_length(capped as u64);
            pb.set_position(0);
            pb.set_message("Explaining top matches...");
        }

        let calls = ranked[..capped].iter().map(|group| {
            let prompt = group_prompt(&group.group, group);
            let label = group.member_ids().join("+");
            let pb = method_pb.clone();
            async move {
                let outcome = self.call(prompt, &label).await;
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                outcome
            }
        });
        let outcomes = join_all(calls).await;

        let mut annotated = Vec::with_capacity(ranked.len());
        for (idx, group) in ranked.iter().enumerate() {
            let mut copy = group.clone();
            copy.explanation = match outcomes.get(idx) {
                Some(CallOutcome::Generated(text)) => {
                    stats.generated += 1;
                    Some(text.clone())
                }
                Some(outcome) => {
                    if matches!(outcome, CallOutcome::TimedOut) {
                        stats.timeouts += 1;
                    }
                    stats.fallbacks += 1;
                    Some(self.fallback_group_explanation(group))
                }
                None => {
                    stats.skipped_beyond_cap += 1;
                    None
                }
            };
            annotated.push(copy);
        }

        stats.entries_annotated = capped;
        stats.processing_time = start_time.elapsed();
        if let Some(pb) = method_pb {
            pb.finish_and_clear();
        }
        info!(
            "Annotated {} of {} matches ({} generated, {} fallbacks, {} timeouts) in {:.2?}",
            stats.entries_annotated,
            ranked.len(),
            stats.generated,
            stats.fallbacks,
            stats.timeouts,
            stats.processing_time
        );

        (annotated, stats)
    }

    /// Explanation for one scored pair, falling back to the values/goals template.
    pub async fn explain_pair(&self, user: &ScoringProfile, other: &ScoringProfile) -> String {
        let label = format!("{}+{}", user.id, other.id);
        match self.call(scored_pair_prompt(user, other), &label).await {
            CallOutcome::Generated(text) => text,
            CallOutcome::Failed | CallOutcome::TimedOut => fallback_pair_explanation(user, other),
        }
    }

    /// Scored matches with explanations, all calls issued concurrently.
    pub async fn explain_scored(
        &self,
        user: &ScoringProfile,
        scored: Vec<(ScoringProfile, CompatibilityScore)>,
    ) -> Vec<ScoredMatch> {
        let explanations = join_all(scored.iter().map(|(other, _)| self.explain_pair(user, other))).await;
        scored
            .into_iter()
            .zip(explanations)
            .map(|((profile, compatibility), explanation)| ScoredMatch {
                profile,
                compatibility,
                explanation,
            })
            .collect()
    }

    /// Template from the highest-priority shared attribute, then any
    /// complementary pair, then the generic growth text.
    pub fn fallback_group_explanation(&self, group: &CandidateGroup) -> String {
        let normalizer = self.matcher.normalizer();
        let members: Vec<NormalizedProfile> = group.group.iter().map(|p| normalizer.normalize_profile(p)).collect();
        let prefix = if members.len() > 2 { "All" } else { "Both" };

        for dim in Dimension::ALL {
            if let Some(token) = first_shared_token(&members, dim) {
                let text = match dim {
                    Dimension::Values => format!("{} value {}", prefix, token),
                    Dimension::Goals => format!("{} want {}", prefix, token),
                    other => format!("Shared {}: {}", other.label(), token),
                };
                return clamp_chars(&text);
            }
        }

        if let [a, b] = members.as_slice() {
            if let Some((x, y)) = self.matcher.detector().first_pair(a, b) {
                return clamp_chars(&format!("Complementary: {}/{}", x, y));
            }
        }

        FALLBACK_EXPLANATION.to_string()
    }
}

fn first_shared_token(members: &[NormalizedProfile], dimension: Dimension) -> Option<String> {
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            if let Some(token) = shared_tokens(members[i].get(dimension), members[j].get(dimension)).next() {
                return Some(token.clone());
            }
        }
    }
    None
}

/// Deterministic explanation for a scored pair from shared values and goals.
pub fn fallback_pair_explanation(user: &ScoringProfile, other: &ScoringProfile) -> String {
    let first_shared = |mine: &[String], theirs: &[String]| {
        let theirs: Vec<String> = theirs.iter().filter_map(|t| clean_token(t)).collect();
        mine.iter().filter_map(|t| clean_token(t)).find(|t| theirs.contains(t))
    };
    let value = first_shared(&user.core_values, &other.core_values);
    let goal = first_shared(&user.personal_goals, &other.personal_goals);

    let text = match (value, goal) {
        (Some(v), Some(g)) => format!("{} + {}", v, g),
        (Some(v), None) => format!("Both value {}", v),
        (None, Some(g)) => format!("Both want {}", g),
        (None, None) => FALLBACK_EXPLANATION.to_string(),
    };
    clamp_chars(&text)
}

fn clamp_chars(text: &str) -> String {
    if text.chars().count() > MAX_EXPLANATION_CHARS {
        let head: String = text.chars().take(MAX_EXPLANATION_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// First non-empty line of a completion, unquoted and limited to 30 chars.
pub fn shorten_explanation(raw: &str) -> Option<String> {
    let line = raw
        .lines()
        .map(|l| l.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .find(|l| !l.is_empty())?;
    Some(clamp_chars(line))
}

fn profile_summary(profile: &Profile) -> String {
    let mut lines = vec![format!("Name: {}", profile.name)];
    for dim in Dimension::ALL {
        let tokens = profile.attribute(dim);
        if !tokens.is_empty() {
            lines.push(format!("{}: {}", capitalize(dim.label()), tokens.join(", ")));
        }
    }
    if !profile.public_profiles.is_empty() {
        let links: Vec<String> = profile
            .public_profiles
            .iter()
            .map(|(platform, url)| format!("{}: {}", platform, url))
            .collect();
        lines.push(format!("Public Profiles: {}", links.join(", ")));
    }
    lines.join("\n")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn group_prompt(members: &[Profile], group: &CandidateGroup) -> TextPrompt {
    let summaries: Vec<String> = members.iter().map(profile_summary).collect();
    let mut shared_lines = Vec::new();
    for dim in Dimension::ALL {
        let count = group.shared.get(dim);
        if count > 0 {
            shared_lines.push(format!("- shared {}: {}", dim.label(), count));
        }
    }
    if group.complementary > 0 {
        shared_lines.push(format!("- complementary pairs (e.g. mentor/mentee): {}", group.complementary));
    }

    let user = format!(
        "Given the following user profiles, create a VERY SHORT explanation (maximum 30 characters) of why they match. Use only 2-4 words.\n\n{}\n\nOverlap:\n{}\n\nShort explanation (max 30 chars):",
        summaries.join("\n\n"),
        shared_lines.join("\n")
    );
    debug!("Built explanation prompt of {} chars", user.len());
    TextPrompt::new(EXPLANATION_SYSTEM_PROMPT, user).with_limits(20, 0.3)
}

fn scored_pair_prompt(user: &ScoringProfile, other: &ScoringProfile) -> TextPrompt {
    let summary = |p: &ScoringProfile| {
        format!(
            "Name: {}\nValues: {}\nGoals: {}\nCommunication: {}\nBio: {}",
            p.name,
            p.core_values.join(", "),
            p.personal_goals.join(", "),
            p.preferred_communication.join(", "),
            p.bio
        )
    };
    let prompt = format!(
        "Given the following user profiles, create a VERY SHORT explanation (maximum 30 characters) of why they match. Use only 2-4 words.\n\n{}\n\n{}\n\nShort explanation (max 30 chars):",
        summary(user),
        summary(other)
    );
    TextPrompt::new(EXPLANATION_SYSTEM_PROMPT, prompt).with_limits(20, 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::candidates::flexible_match;
    use crate::models::matching::MatchOptions;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds, fails or hangs depending on which profile name is in the prompt.
    struct ScriptedGenerator {
        calls: AtomicUsize,
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, prompt: &TextPrompt) -> impl Future<Output = Result<String>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = prompt.user.clone();
            async move {
                if text.contains("Name: Hang") {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("too late".to_string())
                } else if text.contains("Name: Broken") {
                    Err(anyhow!("service unavailable"))
                } else {
                    Ok("\"Kindred explorers who both love long mountain hikes\"\nextra".to_string())
                }
            }
        }
    }

    fn named(id: &str, name: &str, values: &[&str]) -> Profile {
        let mut profile = Profile::new(id).with(Dimension::Values, values);
        profile.name = name.to_string();
        profile
    }

    #[test]
    fn test_shorten_explanation() {
        assert_eq!(shorten_explanation("  \n\"Shared curiosity\"\nmore"), Some("Shared curiosity".to_string()));
        assert_eq!(shorten_explanation("   "), None);
        let long = shorten_explanation("A remarkably long explanation that keeps going").unwrap();
        assert_eq!(long.chars().count(), 30);
        assert!(long.ends_with("..."));
    }

    #[test]
    fn test_fallback_pair_explanation_templates() {
        let mut a = ScoringProfile::new("a");
        let mut b = ScoringProfile::new("b");
        assert_eq!(fallback_pair_explanation(&a, &b), "Growth potential");

        a.core_values = vec!["Empathy".to_string()];
        b.core_values = vec!["empathy".to_string()];
        assert_eq!(fallback_pair_explanation(&a, &b), "Both value empathy");

        a.personal_goals = vec!["travel".to_string()];
        b.personal_goals = vec!["travel".to_string()];
        assert_eq!(fallback_pair_explanation(&a, &b), "empathy + travel");

        a.core_values.clear();
        assert_eq!(fallback_pair_explanation(&a, &b), "Both want travel");
    }

    #[test]
    fn test_fallback_group_explanation_priority() {
        let annotator = ExplanationAnnotator::new(TemplateOnly, Matcher::default());
        let a = Profile::new("a")
            .with(Dimension::Goals, &["travel"])
            .with(Dimension::Interests, &["chess"]);
        let b = Profile::new("b")
            .with(Dimension::Goals, &["travel"])
            .with(Dimension::Interests, &["chess"]);
        let groups = flexible_match(&[a, b], &MatchOptions::default());
        assert_eq!(annotator.fallback_group_explanation(&groups[0]), "Both want travel");

        let mentor = Profile::new("m").with(Dimension::ConnectionType, &["mentor"]);
        let mentee = Profile::new("n").with(Dimension::ConnectionType, &["mentee"]);
        let groups = flexible_match(&[mentor, mentee], &MatchOptions::default());
        assert_eq!(annotator.fallback_group_explanation(&groups[0]), "Complementary: mentor/mentee");
    }

    #[tokio::test]
    async fn test_annotate_isolates_failures_and_caps() {
        let pool = vec![
            named("ok1", "Alice", &["empathy"]),
            named("ok2", "Bob", &["empathy"]),
            named("bad", "Broken", &["empathy"]),
            named("late", "Hang", &["empathy"]),
        ];
        let ranked = flexible_match(&pool, &MatchOptions::default());
        assert_eq!(ranked.len(), 6);

        let generator = ScriptedGenerator { calls: AtomicUsize::new(0) };
        let annotator = ExplanationAnnotator::new(generator, Matcher::default())
            .with_cap(5)
            .with_timeout(Duration::from_millis(50));
        let (annotated, stats) = annotator.annotate(&ranked, None).await;

        assert_eq!(annotated.len(), 6);
        assert_eq!(annotator.generator.calls.load(Ordering::SeqCst), 5);
        assert_eq!(stats.entries_annotated, 5);
        assert_eq!(stats.skipped_beyond_cap, 1);
        assert!(annotated[5].explanation.is_none());

        for group in &annotated[..5] {
            let ids = group.member_ids();
            let explanation = group.explanation.as_deref().unwrap();
            if ids.contains(&"bad") || ids.contains(&"late") {
                assert_eq!(explanation, "Both value empathy");
            } else {
                assert_eq!(explanation, "Kindred explorers who both ...");
            }
        }
        assert!(stats.timeouts >= 1);
        assert_eq!(stats.generated + stats.fallbacks, 5);
    }

    #[tokio::test]
    async fn test_template_only_never_fails() {
        let ranked = flexible_match(
            &[named("a", "A", &["growth"]), named("b", "B", &["growth"])],
            &MatchOptions::default(),
        );
        let annotator = ExplanationAnnotator::new(TemplateOnly, Matcher::default());
        let (annotated, stats) = annotator.annotate(&ranked, None).await;
        assert_eq!(annotated[0].explanation.as_deref(), Some("Both value growth"));
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.generated, 0);
    }
}
