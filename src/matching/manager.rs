// src/matching/manager.rs
// Orchestrates the two request paths: group matching (enumerate, rank,
// optionally annotate) and best-match listing (score, filter, explain).

use std::time::Instant;

use indicatif::ProgressBar;
use log::{debug, info};
use serde::Serialize;

use crate::explanation::annotator::ExplanationAnnotator;
use crate::explanation::generator::TextGenerator;
use crate::matching::candidates::Matcher;
use crate::matching::compatibility::compatible_only;
use crate::matching::ranking::rank_candidates;
use crate::models::matching::{CandidateGroup, MatchOptions, ScoredMatch};
use crate::models::profile::{Profile, ScoringProfile};
use crate::models::stats_models::{AnnotationStats, MatchingStats, ScoringStats};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMatchingOutcome {
    pub matches: Vec<CandidateGroup>,
    pub matching_stats: MatchingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_stats: Option<AnnotationStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMatchesOutcome {
    pub matches: Vec<ScoredMatch>,
    pub scoring_stats: ScoringStats,
}

/// Enumerates and ranks candidate groups. With an annotator the top entries
/// get explanations; without one every explanation stays `None`.
pub async fn run_group_matching<G: TextGenerator>(
    matcher: &Matcher,
    profiles: &[Profile],
    options: &MatchOptions,
    annotator: Option<&ExplanationAnnotator<G>>,
    method_pb: Option<ProgressBar>,
) -> GroupMatchingOutcome {
    let start_time = Instant::now();
    info!(
        "Starting group matching over {} profiles (group size {})",
        profiles.len(),
        options.group_size.members()
    );

    let (mut candidates, matching_stats) = matcher.enumerate_candidates(profiles, options);
    rank_candidates(&mut candidates);

    let (matches, annotation_stats) = match annotator {
        Some(annotator) if !candidates.is_empty() => {
            let (annotated, stats) = annotator.annotate(&candidates, method_pb).await;
            (annotated, Some(stats))
        }
        _ => {
            if let Some(pb) = method_pb {
                pb.finish_and_clear();
            }
            (candidates, None)
        }
    };

    info!(
        "Group matching finished: {} ranked matches in {:.2?}",
        matches.len(),
        start_time.elapsed()
    );
    GroupMatchingOutcome {
        matches,
        matching_stats,
        annotation_stats,
    }
}

/// Best matches for `user`: candidates at or above `threshold`, sorted by
/// overall score (ties keep pool order), truncated to `max_matches`, then
/// explained. Only the kept entries are sent for explanation.
pub async fn generate_matches<G: TextGenerator>(
    user: &ScoringProfile,
    pool: &[ScoringProfile],
    max_matches: usize,
    threshold: u32,
    annotator: &ExplanationAnnotator<G>,
) -> BestMatchesOutcome {
    let (mut compatible, scoring_stats) = compatible_only(user, pool, threshold);
    compatible.sort_by(|a, b| b.1.overall_score.cmp(&a.1.overall_score));
    compatible.truncate(max_matches);
    debug!(
        "Keeping {} of {} compatible candidates for {}",
        compatible.len(),
        scoring_stats.above_threshold,
        user.id
    );

    let kept = compatible
        .into_iter()
        .map(|(profile, score)| (profile.clone(), score))
        .collect();
    let matches = annotator.explain_scored(user, kept).await;

    info!(
        "Generated {} best matches for {} (threshold {}, avg score {:.1})",
        matches.len(),
        user.id,
        threshold,
        scoring_stats.avg_score
    );
    BestMatchesOutcome { matches, scoring_stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::annotator::TemplateOnly;
    use crate::models::matching::GroupSize;
    use crate::models::profile::{Availability, Dimension};

    fn scoring(id: &str, values: &[&str], goals: &[&str], timezone: Option<&str>) -> ScoringProfile {
        let mut profile = ScoringProfile::new(id);
        profile.core_values = values.iter().map(|s| s.to_string()).collect();
        profile.personal_goals = goals.iter().map(|s| s.to_string()).collect();
        profile.preferred_communication = vec!["chat".to_string()];
        profile.availability = Availability {
            timezone: timezone.map(str::to_string),
            preferred_times: vec!["evening".to_string()],
        };
        profile
    }

    #[tokio::test]
    async fn test_run_group_matching_without_annotator() {
        let profiles = vec![
            Profile::new("a").with(Dimension::Values, &["empathy", "growth"]),
            Profile::new("b").with(Dimension::Values, &["empathy"]),
            Profile::new("c").with(Dimension::Values, &["Empathy", "growth"]),
        ];
        let outcome = run_group_matching::<TemplateOnly>(
            &Matcher::default(),
            &profiles,
            &MatchOptions::default(),
            None,
            None,
        )
        .await;

        assert_eq!(outcome.matches.len(), 3);
        assert_eq!(outcome.matches[0].member_ids(), vec!["a", "c"]);
        assert_eq!(outcome.matches[0].shared.shared_values, 2);
        assert!(outcome.matches.iter().all(|m| m.explanation.is_none()));
        assert!(outcome.annotation_stats.is_none());
        assert_eq!(outcome.matching_stats.candidates_evaluated, 3);
    }

    #[tokio::test]
    async fn test_run_group_matching_with_templates() {
        let profiles = vec![
            Profile::new("a").with(Dimension::Goals, &["travel"]),
            Profile::new("b").with(Dimension::Goals, &["travel"]),
            Profile::new("c").with(Dimension::Goals, &["travel"]),
        ];
        let annotator = ExplanationAnnotator::new(TemplateOnly, Matcher::default());
        let options = MatchOptions::default().with_group_size(GroupSize::Triple);
        let outcome =
            run_group_matching(&Matcher::default(), &profiles, &options, Some(&annotator), None).await;

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].shared.shared_goals, 3);
        assert_eq!(outcome.matches[0].explanation.as_deref(), Some("All want travel"));
        assert_eq!(outcome.annotation_stats.map(|s| s.fallbacks), Some(1));
    }

    #[tokio::test]
    async fn test_generate_matches_filters_sorts_and_truncates() {
        let user = scoring("me", &["honesty", "growth"], &["travel"], Some("UTC"));
        let pool = vec![
            user.clone(),
            scoring("close", &["honesty"], &["travel"], Some("UTC")),
            scoring("closest", &["honesty", "growth"], &["travel"], Some("UTC")),
            scoring("far", &["chaos"], &["sleep"], None),
            scoring("also-close", &["honesty"], &["travel"], Some("UTC")),
        ];
        let annotator = ExplanationAnnotator::new(TemplateOnly, Matcher::default());

        let outcome = generate_matches(&user, &pool, 2, 50, &annotator).await;
        let ids: Vec<&str> = outcome.matches.iter().map(|m| m.profile.id.as_str()).collect();
        assert_eq!(ids, vec!["closest", "close"]);
        assert_eq!(outcome.scoring_stats.candidates_scored, 4);
        assert_eq!(outcome.scoring_stats.above_threshold, 3);
        assert_eq!(outcome.matches[0].explanation, "honesty + travel");
        assert!(outcome.matches[0].compatibility.overall_score >= outcome.matches[1].compatibility.overall_score);
    }

    #[tokio::test]
    async fn test_generate_matches_empty_pool() {
        let user = scoring("me", &["honesty"], &[], None);
        let annotator = ExplanationAnnotator::new(TemplateOnly, Matcher::default());
        let outcome = generate_matches(&user, &[], 10, 70, &annotator).await;
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.scoring_stats.candidates_scored, 0);
    }
}
