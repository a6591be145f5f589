// src/models/matching.rs
// Transient results produced by the group matcher and the compatibility scorer.

use std::cmp::Ordering;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::models::profile::{Dimension, Profile, ScoringProfile};

/// Per-dimension shared counts for one candidate group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCounts {
    pub shared_values: usize,
    pub shared_goals: usize,
    pub shared_preferences: usize,
    pub shared_interests: usize,
    pub shared_communication_style: usize,
    pub shared_connection_type: usize,
    pub shared_growth_areas: usize,
    pub shared_availability: usize,
    pub shared_identity_tags: usize,
}

impl SharedCounts {
    pub fn get(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Values => self.shared_values,
            Dimension::Goals => self.shared_goals,
            Dimension::Preferences => self.shared_preferences,
            Dimension::Interests => self.shared_interests,
            Dimension::CommunicationStyle => self.shared_communication_style,
            Dimension::ConnectionType => self.shared_connection_type,
            Dimension::GrowthAreas => self.shared_growth_areas,
            Dimension::Availability => self.shared_availability,
            Dimension::IdentityTags => self.shared_identity_tags,
        }
    }

    fn slot_mut(&mut self, dimension: Dimension) -> &mut usize {
        match dimension {
            Dimension::Values => &mut self.shared_values,
            Dimension::Goals => &mut self.shared_goals,
            Dimension::Preferences => &mut self.shared_preferences,
            Dimension::Interests => &mut self.shared_interests,
            Dimension::CommunicationStyle => &mut self.shared_communication_style,
            Dimension::ConnectionType => &mut self.shared_connection_type,
            Dimension::GrowthAreas => &mut self.shared_growth_areas,
            Dimension::Availability => &mut self.shared_availability,
            Dimension::IdentityTags => &mut self.shared_identity_tags,
        }
    }

    pub fn set(&mut self, dimension: Dimension, count: usize) {
        *self.slot_mut(dimension) = count;
    }

    pub fn add(&mut self, dimension: Dimension, count: usize) {
        *self.slot_mut(dimension) += count;
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d) == 0)
    }
}

/// An unordered group of two or three profiles evaluated as a potential match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateGroup {
    /// Members in enumeration order, not rank order.
    pub group: Vec<Profile>,
    #[serde(flatten)]
    pub shared: SharedCounts,
    /// Complementary pairs found across every dimension in the complementary
    /// table. The built-in table only covers connection type, hence the name.
    #[serde(rename = "complementaryConnectionType")]
    pub complementary: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl CandidateGroup {
    /// Ranking key in priority order: nine shared counts then the
    /// complementary count.
    pub fn rank_key(&self) -> [usize; Dimension::COUNT + 1] {
        let mut key = [0usize; Dimension::COUNT + 1];
        for dim in Dimension::ALL {
            key[dim.index()] = self.shared.get(dim);
        }
        key[Dimension::COUNT] = self.complementary;
        key
    }

    /// Descending comparison on `rank_key`.
    pub fn rank_cmp(&self, other: &CandidateGroup) -> Ordering {
        other.rank_key().cmp(&self.rank_key())
    }

    pub fn member_ids(&self) -> Vec<&str> {
        self.group.iter().map(|p| p.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GroupSize {
    #[default]
    Pair,
    Triple,
}

impl GroupSize {
    pub fn members(self) -> usize {
        match self {
            GroupSize::Pair => 2,
            GroupSize::Triple => 3,
        }
    }

    /// Number of member pairs inside one group; shared counts are summed over
    /// these pairs and thresholds are scaled by the same factor.
    pub fn pair_count(self) -> usize {
        let n = self.members();
        n * (n - 1) / 2
    }
}

impl TryFrom<u8> for GroupSize {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(GroupSize::Pair),
            3 => Ok(GroupSize::Triple),
            other => Err(anyhow!("group size must be 2 or 3, got {}", other)),
        }
    }
}

impl From<GroupSize> for u8 {
    fn from(size: GroupSize) -> Self {
        size.members() as u8
    }
}

/// Minimum shared count per dimension. A dimension only qualifies a group
/// when its shared count is positive and reaches the (scaled) minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    #[serde(default = "default_min_shared_values")]
    pub min_shared_values: usize,
    #[serde(default)]
    pub min_shared_goals: usize,
    #[serde(default)]
    pub min_shared_preferences: usize,
    #[serde(default)]
    pub min_shared_interests: usize,
    #[serde(default)]
    pub min_shared_communication_style: usize,
    #[serde(default)]
    pub min_shared_connection_type: usize,
    #[serde(default)]
    pub min_shared_growth_areas: usize,
    #[serde(default)]
    pub min_shared_availability: usize,
    #[serde(default)]
    pub min_shared_identity_tags: usize,
    #[serde(default)]
    pub group_size: GroupSize,
}

fn default_min_shared_values() -> usize {
    1
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_shared_values: default_min_shared_values(),
            min_shared_goals: 0,
            min_shared_preferences: 0,
            min_shared_interests: 0,
            min_shared_communication_style: 0,
            min_shared_connection_type: 0,
            min_shared_growth_areas: 0,
            min_shared_availability: 0,
            min_shared_identity_tags: 0,
            group_size: GroupSize::Pair,
        }
    }
}

impl MatchOptions {
    pub fn min_shared(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Values => self.min_shared_values,
            Dimension::Goals => self.min_shared_goals,
            Dimension::Preferences => self.min_shared_preferences,
            Dimension::Interests => self.min_shared_interests,
            Dimension::CommunicationStyle => self.min_shared_communication_style,
            Dimension::ConnectionType => self.min_shared_connection_type,
            Dimension::GrowthAreas => self.min_shared_growth_areas,
            Dimension::Availability => self.min_shared_availability,
            Dimension::IdentityTags => self.min_shared_identity_tags,
        }
    }

    pub fn set_min_shared(&mut self, dimension: Dimension, min: usize) {
        let slot = match dimension {
            Dimension::Values => &mut self.min_shared_values,
            Dimension::Goals => &mut self.min_shared_goals,
            Dimension::Preferences => &mut self.min_shared_preferences,
            Dimension::Interests => &mut self.min_shared_interests,
            Dimension::CommunicationStyle => &mut self.min_shared_communication_style,
            Dimension::ConnectionType => &mut self.min_shared_connection_type,
            Dimension::GrowthAreas => &mut self.min_shared_growth_areas,
            Dimension::Availability => &mut self.min_shared_availability,
            Dimension::IdentityTags => &mut self.min_shared_identity_tags,
        };
        *slot = min;
    }

    pub fn with_group_size(mut self, group_size: GroupSize) -> Self {
        self.group_size = group_size;
        self
    }
}

/// Weighted alignment of exactly one (self, other) pair. Sub-scores are kept
/// unrounded so `overall_score` can be recomputed from them exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityScore {
    pub values_alignment: f64,
    pub goals_alignment: f64,
    pub communication_style: f64,
    pub availability_match: f64,
    pub interests_overlap: f64,
    pub overall_score: u32,
}

/// One entry of a "best matches" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    pub profile: ScoringProfile,
    pub compatibility: CompatibilityScore,
    pub explanation: String,
}
