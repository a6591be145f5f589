// src/matching/compatibility.rs
// Single-pair weighted compatibility scoring (values, goals, communication,
// availability and bio keyword overlap).

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use crate::matching::normalize::clean_token;
use crate::matching::shared::count_shared;
use crate::models::matching::CompatibilityScore;
use crate::models::profile::{ProfileId, ScoringProfile};
use crate::models::stats_models::ScoringStats;

const VALUES_WEIGHT: f64 = 0.40;
const GOALS_WEIGHT: f64 = 0.25;
const COMMUNICATION_WEIGHT: f64 = 0.20;
const AVAILABILITY_WEIGHT: f64 = 0.10;
const INTERESTS_WEIGHT: f64 = 0.05;

const SAME_TIMEZONE_SCORE: f64 = 100.0;
const DIFFERENT_TIMEZONE_SCORE: f64 = 50.0;
const UNKNOWN_TIMEZONE_SCORE: f64 = 0.0;

/// Bio words must be longer than this to count as a shared interest.
const MIN_KEYWORD_CHARS: usize = 3;

pub const DEFAULT_COMPATIBILITY_THRESHOLD: u32 = 70;

fn token_set(tokens: &[String]) -> BTreeSet<String> {
    tokens.iter().filter_map(|t| clean_token(t)).collect()
}

/// `|A ∩ B| / max(|A|, |B|) × 100` over distinct cleaned tokens; 0 when both
/// sides are empty.
pub fn alignment_ratio(a: &[String], b: &[String]) -> f64 {
    let left = token_set(a);
    let right = token_set(b);
    let denominator = left.len().max(right.len());
    if denominator == 0 {
        return 0.0;
    }
    count_shared(&left, &right) as f64 / denominator as f64 * 100.0
}

fn timezone_score(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a.and_then(clean_token), b.and_then(clean_token)) {
        (Some(x), Some(y)) if x == y => SAME_TIMEZONE_SCORE,
        (None, None) => UNKNOWN_TIMEZONE_SCORE,
        _ => DIFFERENT_TIMEZONE_SCORE,
    }
}

/// Mean of the timezone component and the preferred-times ratio. A timezone
/// stated on only one side counts as different; neither side stating one
/// scores 0.
pub fn availability_match(user: &ScoringProfile, other: &ScoringProfile) -> f64 {
    let timezone_score = timezone_score(user.availability.timezone.as_deref(), other.availability.timezone.as_deref());
    let times_score = if token_set(&user.availability.preferred_times).is_empty() {
        0.0
    } else {
        alignment_ratio(&user.availability.preferred_times, &other.availability.preferred_times)
    };
    (timezone_score + times_score) / 2.0
}

/// Shared bio keywords (longer than three characters) over the longer bio's
/// word count, × 100.
pub fn interests_overlap(user_bio: &str, other_bio: &str) -> f64 {
    let user_words: Vec<String> = user_bio.split_whitespace().map(str::to_lowercase).collect();
    let other_words: HashSet<String> = other_bio.split_whitespace().map(str::to_lowercase).collect();
    let other_count = other_bio.split_whitespace().count();

    let denominator = user_words.len().max(other_count);
    if denominator == 0 {
        return 0.0;
    }

    let shared = user_words
        .iter()
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS)
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|w| other_words.contains(*w))
        .count();
    shared as f64 / denominator as f64 * 100.0
}

pub fn calculate_compatibility_score(user: &ScoringProfile, other: &ScoringProfile) -> CompatibilityScore {
    let values_alignment = alignment_ratio(&user.core_values, &other.core_values);
    let goals_alignment = alignment_ratio(&user.personal_goals, &other.personal_goals);
    let communication_style = alignment_ratio(&user.preferred_communication, &other.preferred_communication);
    let availability = availability_match(user, other);
    let interests = interests_overlap(&user.bio, &other.bio);

    let weighted = VALUES_WEIGHT * values_alignment
        + GOALS_WEIGHT * goals_alignment
        + COMMUNICATION_WEIGHT * communication_style
        + AVAILABILITY_WEIGHT * availability
        + INTERESTS_WEIGHT * interests;

    CompatibilityScore {
        values_alignment,
        goals_alignment,
        communication_style,
        availability_match: availability,
        interests_overlap: interests,
        overall_score: weighted.round().clamp(0.0, 100.0) as u32,
    }
}

/// Overall score for every candidate in `pool` except the user themself.
pub fn score_pool(user: &ScoringProfile, pool: &[ScoringProfile]) -> BTreeMap<ProfileId, u32> {
    pool.iter()
        .filter(|candidate| candidate.id != user.id)
        .map(|candidate| (candidate.id.clone(), calculate_compatibility_score(user, candidate).overall_score))
        .collect()
}

/// Candidates scoring at or above `threshold`, in pool order, with their scores.
pub fn compatible_only<'a>(
    user: &ScoringProfile,
    pool: &'a [ScoringProfile],
    threshold: u32,
) -> (Vec<(&'a ScoringProfile, CompatibilityScore)>, ScoringStats) {
    let mut stats = ScoringStats::default();
    let mut total = 0u64;
    let mut compatible = Vec::new();

    for candidate in pool.iter().filter(|c| c.id != user.id) {
        let score = calculate_compatibility_score(user, candidate);
        stats.candidates_scored += 1;
        total += u64::from(score.overall_score);
        if score.overall_score >= threshold {
            compatible.push((candidate, score));
        }
    }

    stats.above_threshold = compatible.len();
    stats.avg_score = if stats.candidates_scored > 0 {
        total as f64 / stats.candidates_scored as f64
    } else {
        0.0
    };
    debug!(
        "Scored {} candidates for {}: {} at or above {} (avg {:.1})",
        stats.candidates_scored, user.id, stats.above_threshold, threshold, stats.avg_score
    );

    (compatible, stats)
}
