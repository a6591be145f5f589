// src/matching/ranking.rs

use crate::models::matching::CandidateGroup;

/// Sorts descending by sharedValues, sharedGoals, sharedPreferences,
/// sharedInterests, sharedCommunicationStyle, sharedConnectionType,
/// sharedGrowthAreas, sharedAvailability, sharedIdentityTags and finally the
/// complementary count. The sort is stable: full ties keep enumeration order.
pub fn rank_candidates(candidates: &mut [CandidateGroup]) {
    candidates.sort_by(|a, b| a.rank_cmp(b));
}
