// src/models/stats_models.rs

use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MatchingStats {
    pub profiles_considered: usize,
    pub candidates_evaluated: usize,
    pub qualifying_candidates: usize,
    /// Qualified only through a complementary pair.
    pub complementary_only: usize,
    #[serde(skip)]
    pub processing_time: std::time::Duration,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct AnnotationStats {
    pub entries_annotated: usize,
    pub generated: usize,
    pub fallbacks: usize,
    pub timeouts: usize,
    pub skipped_beyond_cap: usize,
    #[serde(skip)]
    pub processing_time: std::time::Duration,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ScoringStats {
    pub candidates_scored: usize,
    pub above_threshold: usize,
    pub avg_score: f64,
}
