// src/matching/shared.rs
// Shared-attribute counting between two profiles, one dimension at a time.

use std::collections::BTreeSet;

use crate::matching::normalize::NormalizedProfile;
use crate::models::matching::SharedCounts;
use crate::models::profile::Dimension;

/// Number of distinct elements present in both sets.
pub fn count_shared(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    // Walk the smaller set; the relation is symmetric either way.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|token| large.contains(*token)).count()
}

/// Shared counts for one pair of normalized profiles across all nine dimensions.
pub fn pair_shared_counts(a: &NormalizedProfile, b: &NormalizedProfile) -> SharedCounts {
    let mut counts = SharedCounts::default();
    for dim in Dimension::ALL {
        counts.set(dim, count_shared(a.get(dim), b.get(dim)));
    }
    counts
}

/// Shared tokens of one dimension, in sorted order.
pub fn shared_tokens<'a>(a: &'a BTreeSet<String>, b: &'a BTreeSet<String>) -> impl Iterator<Item = &'a String> {
    a.intersection(b)
}
