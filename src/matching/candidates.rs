// src/matching/candidates.rs
// Candidate enumeration: every unordered pair or triple of the pool, filtered
// by OR-combined per-dimension thresholds or a complementary pair.

use std::time::Instant;

use log::{debug, info, warn};

use crate::matching::complementary::{ComplementaryDetector, ComplementaryTable};
use crate::matching::normalize::{AttributeNormalizer, NormalizedProfile, SynonymTable};
use crate::matching::ranking::rank_candidates;
use crate::matching::shared::pair_shared_counts;
use crate::models::matching::{CandidateGroup, GroupSize, MatchOptions, SharedCounts};
use crate::models::profile::{Dimension, Profile};
use crate::models::stats_models::MatchingStats;

// Pool sizes above which enumeration cost is worth a warning.
const LARGE_POOL_PAIRS: usize = 5_000;
const LARGE_POOL_TRIPLES: usize = 400;

/// Group matcher holding the injected synonym and complementary tables.
#[derive(Debug, Clone)]
pub struct Matcher {
    normalizer: AttributeNormalizer,
    detector: ComplementaryDetector,
}

impl Default for Matcher {
    fn default() -> Self {
        let normalizer = AttributeNormalizer::default();
        let detector = ComplementaryDetector::new(ComplementaryTable::builtin(&normalizer));
        Self { normalizer, detector }
    }
}

impl Matcher {
    pub fn new(synonyms: SynonymTable, complementary: ComplementaryTable) -> Self {
        if complementary.is_empty() {
            debug!("Matcher built without complementary pairs; only shared counts can qualify a group");
        }
        Self {
            normalizer: AttributeNormalizer::new(synonyms),
            detector: ComplementaryDetector::new(complementary),
        }
    }

    pub fn normalizer(&self) -> &AttributeNormalizer {
        &self.normalizer
    }

    pub fn detector(&self) -> &ComplementaryDetector {
        &self.detector
    }

    /// Qualifying candidates ranked by the lexicographic shared-count key.
    pub fn flexible_match(&self, profiles: &[Profile], options: &MatchOptions) -> Vec<CandidateGroup> {
        let (mut candidates, _stats) = self.enumerate_candidates(profiles, options);
        rank_candidates(&mut candidates);
        candidates
    }

    /// Qualifying candidates in enumeration order plus run statistics.
    pub fn enumerate_candidates(&self, profiles: &[Profile], options: &MatchOptions) -> (Vec<CandidateGroup>, MatchingStats) {
        let start_time = Instant::now();
        let mut stats = MatchingStats {
            profiles_considered: profiles.len(),
            ..Default::default()
        };
        let group_size = options.group_size;

        if profiles.len() < group_size.members() {
            debug!(
                "Pool of {} profiles is smaller than group size {}, nothing to enumerate",
                profiles.len(),
                group_size.members()
            );
            stats.processing_time = start_time.elapsed();
            return (Vec::new(), stats);
        }

        let large = match group_size {
            GroupSize::Pair => profiles.len() > LARGE_POOL_PAIRS,
            GroupSize::Triple => profiles.len() > LARGE_POOL_TRIPLES,
        };
        if large {
            warn!(
                "Enumerating groups of {} over a LARGE pool ({} profiles); this is a full O(n^{}) scan",
                group_size.members(),
                profiles.len(),
                group_size.members()
            );
        }

        let normalized: Vec<NormalizedProfile> = profiles
            .iter()
            .map(|p| self.normalizer.normalize_profile(p))
            .collect();
        let n = normalized.len();
        let empty_profiles = normalized.iter().filter(|p| p.is_empty()).count();
        if empty_profiles > 0 {
            debug!("{} of {} profiles have no attributes after normalization", empty_profiles, n);
        }
        let mut candidates = Vec::new();

        match group_size {
            GroupSize::Pair => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        stats.candidates_evaluated += 1;
                        let shared = pair_shared_counts(&normalized[i], &normalized[j]);
                        let complementary = self.detector.count(&normalized[i], &normalized[j]);
                        if let Some(candidate) = qualify(&[i, j], profiles, shared, complementary, options, &mut stats) {
                            candidates.push(candidate);
                        }
                    }
                }
            }
            GroupSize::Triple => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        for k in (j + 1)..n {
                            stats.candidates_evaluated += 1;
                            let mut shared = SharedCounts::default();
                            for (a, b) in [(i, j), (i, k), (j, k)] {
                                let pair = pair_shared_counts(&normalized[a], &normalized[b]);
                                for dim in Dimension::ALL {
                                    shared.add(dim, pair.get(dim));
                                }
                            }
                            // Complementary detection is defined for pairs only.
                            if let Some(candidate) = qualify(&[i, j, k], profiles, shared, 0, options, &mut stats) {
                                candidates.push(candidate);
                            }
                        }
                    }
                }
            }
        }

        stats.qualifying_candidates = candidates.len();
        stats.processing_time = start_time.elapsed();
        info!(
            "Group enumeration completed: {} of {} candidate groups qualified (size {}, {} complementary-only) in {:.2?}",
            stats.qualifying_candidates,
            stats.candidates_evaluated,
            group_size.members(),
            stats.complementary_only,
            stats.processing_time
        );

        (candidates, stats)
    }
}

/// Whether one dimension's shared count reaches its threshold. Thresholds are
/// scaled by the number of member pairs, and a dimension never qualifies with
/// zero shared attributes.
pub fn meets_threshold(shared: usize, min_shared: usize, group_size: GroupSize) -> bool {
    let required = min_shared.saturating_mul(group_size.pair_count()).max(1);
    shared >= required
}

/// True when any dimension meets its threshold (OR, never AND).
pub fn any_dimension_qualifies(shared: &SharedCounts, options: &MatchOptions) -> bool {
    Dimension::ALL
        .iter()
        .any(|dim| meets_threshold(shared.get(*dim), options.min_shared(*dim), options.group_size))
}

fn qualify(
    members: &[usize],
    profiles: &[Profile],
    shared: SharedCounts,
    complementary: usize,
    options: &MatchOptions,
    stats: &mut MatchingStats,
) -> Option<CandidateGroup> {
    let by_dimension = any_dimension_qualifies(&shared, options);
    if !by_dimension && complementary == 0 {
        return None;
    }
    if !by_dimension {
        stats.complementary_only += 1;
    }
    Some(CandidateGroup {
        group: members.iter().map(|&idx| profiles[idx].clone()).collect(),
        shared,
        complementary,
        explanation: None,
    })
}

/// `Matcher::flexible_match` with the built-in tables.
pub fn flexible_match(profiles: &[Profile], options: &MatchOptions) -> Vec<CandidateGroup> {
    Matcher::default().flexible_match(profiles, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool() -> Vec<Profile> {
        vec![
            Profile::new("alice")
                .with(Dimension::Values, &["empathy", "growth", "curiosity"])
                .with(Dimension::Goals, &["find a mentor", "expand network"])
                .with(Dimension::Preferences, &["small group", "in-person"]),
            Profile::new("bob")
                .with(Dimension::Values, &["integrity", "creativity", "curiosity"])
                .with(Dimension::Goals, &["collaborate on projects"])
                .with(Dimension::Preferences, &["one-on-one", "remote"]),
            Profile::new("carol")
                .with(Dimension::Values, &["community", "growth", "empathy"])
                .with(Dimension::Goals, &["make new friends", "learn new skills"])
                .with(Dimension::Preferences, &["small group", "remote"]),
            Profile::new("dave"),
        ]
    }

    #[test]
    fn test_pure_shared_values() {
        let a = Profile::new("a").with(Dimension::Values, &["empathy", "growth"]);
        let b = Profile::new("b").with(Dimension::Values, &["empathy", "curiosity"]);
        let matches = flexible_match(&[a, b], &MatchOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].shared.shared_values, 1);
        assert_eq!(matches[0].member_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_synonym_equivalence() {
        let a = Profile::new("a").with(Dimension::ConnectionType, &["mentorship"]);
        let b = Profile::new("b").with(Dimension::ConnectionType, &["mentor"]);
        let matches = flexible_match(&[a, b], &MatchOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].shared.shared_connection_type, 1);
        assert_eq!(matches[0].complementary, 0);
    }

    #[test]
    fn test_complementary_only_match_is_included() {
        let a = Profile::new("a").with(Dimension::ConnectionType, &["mentor"]);
        let b = Profile::new("b").with(Dimension::ConnectionType, &["mentee"]);
        let mut options = MatchOptions::default();
        for dim in Dimension::ALL {
            options.set_min_shared(dim, 5);
        }
        let (matches, stats) = Matcher::default().enumerate_candidates(&[a, b], &options);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].shared.is_empty());
        assert_eq!(matches[0].complementary, 1);
        assert_eq!(stats.complementary_only, 1);
    }

    #[test]
    fn test_no_self_matching() {
        let single = vec![Profile::new("solo").with(Dimension::Values, &["empathy"])];
        assert!(flexible_match(&single, &MatchOptions::default()).is_empty());
        assert!(flexible_match(&[], &MatchOptions::default()).is_empty());

        let triple_options = MatchOptions::default().with_group_size(GroupSize::Triple);
        assert!(flexible_match(&pool()[..2], &triple_options).is_empty());
    }

    #[test]
    fn test_no_duplicate_pairs() {
        let mut profiles = pool();
        for p in profiles.iter_mut() {
            p.values.push("kindness".to_string());
        }
        let n = profiles.len();
        let matches = flexible_match(&profiles, &MatchOptions::default());
        assert_eq!(matches.len(), n * (n - 1) / 2);

        let mut seen = HashSet::new();
        for m in &matches {
            let mut ids = m.member_ids();
            assert_ne!(ids[0], ids[1]);
            ids.sort();
            assert!(seen.insert(ids.join("|")));
        }
    }

    #[test]
    fn test_empty_profiles_do_not_qualify_without_signal() {
        let matches = flexible_match(&[Profile::new("x"), Profile::new("y")], &MatchOptions::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_thresholds_are_or_combined() {
        let a = Profile::new("a").with(Dimension::Interests, &["chess", "hiking"]);
        let b = Profile::new("b").with(Dimension::Interests, &["hiking", "chess"]);
        let mut options = MatchOptions::default();
        options.set_min_shared(Dimension::Values, 3);
        options.set_min_shared(Dimension::Interests, 2);
        let matches = flexible_match(&[a.clone(), b.clone()], &options);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].shared.shared_interests, 2);

        options.set_min_shared(Dimension::Interests, 3);
        assert!(flexible_match(&[a, b], &options).is_empty());
    }

    #[test]
    fn test_triples_sum_pairwise_counts() {
        let options = MatchOptions::default().with_group_size(GroupSize::Triple);
        let matches = flexible_match(&pool()[..3], &options);
        assert_eq!(matches.len(), 1);
        let triple = &matches[0];
        assert_eq!(triple.group.len(), 3);
        // alice-bob: curiosity, alice-carol: empathy + growth, bob-carol: none
        assert_eq!(triple.shared.shared_values, 3);
        // alice-carol: small group, bob-carol: remote
        assert_eq!(triple.shared.shared_preferences, 2);
        assert_eq!(triple.complementary, 0);
    }

    #[test]
    fn test_triple_threshold_scaled_by_pair_count() {
        assert!(meets_threshold(3, 1, GroupSize::Triple));
        assert!(!meets_threshold(2, 1, GroupSize::Triple));
        assert!(meets_threshold(1, 1, GroupSize::Pair));
        assert!(!meets_threshold(0, 0, GroupSize::Pair));
        assert!(meets_threshold(1, 0, GroupSize::Triple));
        assert!(!meets_threshold(usize::MAX - 1, usize::MAX, GroupSize::Triple));
    }

    #[test]
    fn test_huge_threshold_does_not_overflow() {
        let raw = format!(r#"{{"minSharedValues": {}, "groupSize": 3}}"#, usize::MAX);
        let options: MatchOptions = serde_json::from_str(&raw).unwrap();
        let profiles: Vec<Profile> = ["a", "b", "c"]
            .iter()
            .map(|id| Profile::new(*id).with(Dimension::Values, &["empathy"]))
            .collect();
        // no other dimension has a positive count
        assert!(flexible_match(&profiles, &options).is_empty());

        let mut pair_options = options.with_group_size(GroupSize::Pair);
        pair_options.set_min_shared(Dimension::Interests, usize::MAX);
        assert!(flexible_match(&profiles, &pair_options).is_empty());
    }

    #[test]
    fn test_triple_count_bounded() {
        let mut profiles = pool();
        profiles.push(Profile::new("erin").with(Dimension::Values, &["growth"]));
        for p in profiles.iter_mut() {
            p.values.push("kindness".to_string());
        }
        let options = MatchOptions::default().with_group_size(GroupSize::Triple);
        let (matches, stats) = Matcher::default().enumerate_candidates(&profiles, &options);
        assert_eq!(stats.candidates_evaluated, 10);
        assert_eq!(matches.len(), 10);
    }
}
