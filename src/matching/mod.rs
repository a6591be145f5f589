pub mod candidates;
pub mod compatibility;
pub mod complementary;
pub mod manager;
pub mod normalize;
pub mod ranking;
pub mod shared;

pub use candidates::{flexible_match, Matcher};
pub use compatibility::{calculate_compatibility_score, compatible_only, score_pool};
pub use complementary::{ComplementaryDetector, ComplementaryTable};
pub use manager::{generate_matches, run_group_matching};
pub use normalize::{AttributeNormalizer, NormalizedProfile, SynonymTable};
pub use ranking::rank_candidates;
