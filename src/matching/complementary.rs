// src/matching/complementary.rs
// Detection of attribute pairs that are valuable precisely because they differ.

use std::collections::BTreeMap;

use crate::matching::normalize::{AttributeNormalizer, NormalizedProfile};
use crate::models::profile::Dimension;

// Built-in complementary pairs: (dimension, x, y)
const DEFAULT_COMPLEMENTARY_PAIRS: [(Dimension, &str, &str); 1] = [
    (Dimension::ConnectionType, "mentor", "mentee"),
];

/// Ordered token pairs per dimension considered complementary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplementaryTable {
    pairs: BTreeMap<Dimension, Vec<(String, String)>>,
}

impl ComplementaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. Tokens go through `normalizer` so the table speaks the
    /// same canonical vocabulary as normalized profiles.
    pub fn with_pair(mut self, normalizer: &AttributeNormalizer, dimension: Dimension, x: &str, y: &str) -> Self {
        if let (Some(x), Some(y)) = (normalizer.normalize_token(x), normalizer.normalize_token(y)) {
            let entry = self.pairs.entry(dimension).or_default();
            if !entry.contains(&(x.clone(), y.clone())) {
                entry.push((x, y));
            }
        }
        self
    }

    pub fn builtin(normalizer: &AttributeNormalizer) -> Self {
        DEFAULT_COMPLEMENTARY_PAIRS
            .iter()
            .fold(Self::new(), |table, (dim, x, y)| table.with_pair(normalizer, *dim, x, y))
    }

    pub fn pairs(&self, dimension: Dimension) -> &[(String, String)] {
        self.pairs.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.pairs.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone)]
pub struct ComplementaryDetector {
    table: ComplementaryTable,
}

impl ComplementaryDetector {
    pub fn new(table: ComplementaryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ComplementaryTable {
        &self.table
    }

    /// Count for one dimension: pairs with A∋x, B∋y plus pairs with A∋y, B∋x.
    pub fn count_dimension(&self, dimension: Dimension, a: &NormalizedProfile, b: &NormalizedProfile) -> usize {
        let (left, right) = (a.get(dimension), b.get(dimension));
        self.table
            .pairs(dimension)
            .iter()
            .map(|(x, y)| {
                let forward = usize::from(left.contains(x) && right.contains(y));
                let backward = usize::from(left.contains(y) && right.contains(x));
                forward + backward
            })
            .sum()
    }

    /// Total over every dimension present in the table.
    pub fn count(&self, a: &NormalizedProfile, b: &NormalizedProfile) -> usize {
        self.table
            .dimensions()
            .map(|dim| self.count_dimension(dim, a, b))
            .sum()
    }

    /// First complementary pair found between the two profiles, oriented so
    /// the first token belongs to `a`.
    pub fn first_pair<'t>(&'t self, a: &NormalizedProfile, b: &NormalizedProfile) -> Option<(&'t str, &'t str)> {
        for dim in self.table.dimensions() {
            let (left, right) = (a.get(dim), b.get(dim));
            for (x, y) in self.table.pairs(dim) {
                if left.contains(x) && right.contains(y) {
                    return Some((x.as_str(), y.as_str()));
                }
                if left.contains(y) && right.contains(x) {
                    return Some((y.as_str(), x.as_str()));
                }
            }
        }
        None
    }
}

impl Default for ComplementaryDetector {
    fn default() -> Self {
        Self::new(ComplementaryTable::builtin(&AttributeNormalizer::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Profile;

    fn normalized(profile: Profile) -> NormalizedProfile {
        AttributeNormalizer::default().normalize_profile(&profile)
    }

    #[test]
    fn test_mentor_mentee_both_directions() {
        let detector = ComplementaryDetector::default();
        let mentor = normalized(Profile::new("a").with(Dimension::ConnectionType, &["Mentor"]));
        let mentee = normalized(Profile::new("b").with(Dimension::ConnectionType, &["mentee"]));
        assert_eq!(detector.count(&mentor, &mentee), 1);
        assert_eq!(detector.count(&mentee, &mentor), 1);
        assert_eq!(detector.first_pair(&mentee, &mentor), Some(("mentee", "mentor")));
    }

    #[test]
    fn test_mutual_overlap_counts_twice() {
        let detector = ComplementaryDetector::default();
        let a = normalized(Profile::new("a").with(Dimension::ConnectionType, &["mentor", "mentee"]));
        let b = normalized(Profile::new("b").with(Dimension::ConnectionType, &["mentorship", "being mentored"]));
        assert_eq!(detector.count(&a, &b), 2);
    }

    #[test]
    fn test_no_pair_when_same_side() {
        let detector = ComplementaryDetector::default();
        let a = normalized(Profile::new("a").with(Dimension::ConnectionType, &["mentor"]));
        let b = normalized(Profile::new("b").with(Dimension::ConnectionType, &["mentor"]));
        assert_eq!(detector.count(&a, &b), 0);
        assert_eq!(detector.first_pair(&a, &b), None);
    }

    #[test]
    fn test_custom_table() {
        let normalizer = AttributeNormalizer::default();
        let table = ComplementaryTable::new()
            .with_pair(&normalizer, Dimension::GrowthAreas, "Teaching", "Learning")
            .with_pair(&normalizer, Dimension::GrowthAreas, "teaching", "learning");
        assert_eq!(table.pairs(Dimension::GrowthAreas).len(), 1);
        assert!(table.pairs(Dimension::ConnectionType).is_empty());

        let detector = ComplementaryDetector::new(table);
        let a = normalized(Profile::new("a").with(Dimension::GrowthAreas, &["learning"]));
        let b = normalized(Profile::new("b").with(Dimension::GrowthAreas, &["teaching"]));
        assert_eq!(detector.count(&a, &b), 1);
        assert_eq!(detector.count_dimension(Dimension::ConnectionType, &a, &b), 0);
    }
}
