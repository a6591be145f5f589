// src/matching/normalize.rs
// Attribute normalization: lower-casing, whitespace cleanup and synonym canonicalization.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::profile::{Dimension, Profile, ProfileId};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// Built-in synonyms: (variant, canonical)
const DEFAULT_SYNONYMS: [(&str, &str); 23] = [
    // Mentoring
    ("mentorship", "mentor"), ("mentoring", "mentor"), ("mentors", "mentor"),
    ("being a mentor", "mentor"), ("mentees", "mentee"), ("being mentored", "mentee"),
    // Identity
    ("lgbtq", "lgbtq+"), ("lgbt", "lgbtq+"), ("lgbtqia", "lgbtq+"), ("lgbtqia+", "lgbtq+"),
    ("queer", "lgbtq+"),
    // Meeting format
    ("one on one", "one-on-one"), ("1:1", "one-on-one"), ("1-on-1", "one-on-one"),
    ("in person", "in-person"), ("small groups", "small group"),
    ("online", "remote"), ("virtual", "remote"),
    // Time slots
    ("morning", "mornings"), ("evening", "evenings"), ("weekend", "weekends"),
    // Networking
    ("networking", "expand network"), ("collaboration", "collaborate on projects"),
];

/// Variant → canonical token table, injected into the normalizer.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    canonical: HashMap<String, String>,
}

impl SynonymTable {
    /// Builds a table from (variant, canonical) pairs. Keys and values are
    /// cleaned the same way tokens are, and chains (a → b, b → c) are
    /// collapsed so every lookup lands on a fixed point.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut raw: HashMap<String, String> = HashMap::new();
        for (variant, canonical) in pairs {
            let (Some(variant), Some(canonical)) = (clean_token(variant.as_ref()), clean_token(canonical.as_ref())) else {
                continue;
            };
            if variant != canonical {
                raw.insert(variant, canonical);
            }
        }

        let mut canonical = HashMap::with_capacity(raw.len());
        for variant in raw.keys() {
            let mut target = &raw[variant];
            // Bounded walk; a cycle stops at whatever token it reached.
            for _ in 0..raw.len() {
                match raw.get(target) {
                    Some(next) if next != variant => target = next,
                    _ => break,
                }
            }
            canonical.insert(variant.clone(), target.clone());
        }

        // A cycle would leave a canonical value that is itself a key.
        canonical.retain(|_, target| !raw.contains_key(target.as_str()));
        debug!("Synonym table built with {} entries", canonical.len());

        Self { canonical }
    }

    pub fn empty() -> Self {
        Self { canonical: HashMap::new() }
    }

    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.canonical.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::new(DEFAULT_SYNONYMS)
    }
}

/// Lower-cases, trims and collapses inner whitespace. Returns `None` for
/// tokens that are empty after cleanup.
pub fn clean_token(token: &str) -> Option<String> {
    let lowered = token.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    Some(WHITESPACE_RUN.replace_all(&lowered, " ").into_owned())
}

#[derive(Debug, Clone, Default)]
pub struct AttributeNormalizer {
    synonyms: SynonymTable,
}

impl AttributeNormalizer {
    pub fn new(synonyms: SynonymTable) -> Self {
        if synonyms.is_empty() {
            debug!("Attribute normalizer running without synonyms");
        } else {
            debug!("Attribute normalizer using {} synonyms", synonyms.len());
        }
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn normalize_token(&self, token: &str) -> Option<String> {
        let cleaned = clean_token(token)?;
        match self.synonyms.lookup(&cleaned) {
            Some(canonical) => Some(canonical.to_string()),
            None => Some(cleaned),
        }
    }

    /// Canonical set for a free-text token list. Idempotent.
    pub fn normalize<S: AsRef<str>>(&self, tokens: &[S]) -> BTreeSet<String> {
        tokens
            .iter()
            .filter_map(|t| self.normalize_token(t.as_ref()))
            .collect()
    }

    pub fn normalize_profile(&self, profile: &Profile) -> NormalizedProfile {
        NormalizedProfile {
            id: profile.id.clone(),
            attributes: std::array::from_fn(|i| self.normalize(profile.attribute(Dimension::ALL[i]))),
        }
    }
}

/// A profile's attribute sets after normalization; the only form the
/// counters and detectors compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedProfile {
    pub id: ProfileId,
    attributes: [BTreeSet<String>; Dimension::COUNT],
}

impl NormalizedProfile {
    pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
        &self.attributes[dimension.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.iter().all(BTreeSet::is_empty)
    }
}
