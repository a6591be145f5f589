// src/models/profile.rs
// Participant records as consumed by the matching and scoring engines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type ProfileId = String;

pub const DEFAULT_PROFILE_NAME: &str = "Anonymous";

/// The nine multi-valued attribute dimensions compared by the group matcher.
///
/// Variants are declared in ranking priority order, so `Dimension::ALL`
/// doubles as the lexicographic key order used when sorting candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Values,
    Goals,
    Preferences,
    Interests,
    CommunicationStyle,
    ConnectionType,
    GrowthAreas,
    Availability,
    IdentityTags,
}

impl Dimension {
    pub const COUNT: usize = 9;

    pub const ALL: [Dimension; Dimension::COUNT] = [
        Dimension::Values,
        Dimension::Goals,
        Dimension::Preferences,
        Dimension::Interests,
        Dimension::CommunicationStyle,
        Dimension::ConnectionType,
        Dimension::GrowthAreas,
        Dimension::Availability,
        Dimension::IdentityTags,
    ];

    /// Position in `ALL`; used to index per-dimension arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Field name as it appears in profile documents.
    pub fn field_name(self) -> &'static str {
        match self {
            Dimension::Values => "values",
            Dimension::Goals => "goals",
            Dimension::Preferences => "preferences",
            Dimension::Interests => "interests",
            Dimension::CommunicationStyle => "communicationStyle",
            Dimension::ConnectionType => "connectionType",
            Dimension::GrowthAreas => "growthAreas",
            Dimension::Availability => "availability",
            Dimension::IdentityTags => "identityTags",
        }
    }

    /// Human readable label for prompts and templated explanations.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Values => "values",
            Dimension::Goals => "goals",
            Dimension::Preferences => "preferences",
            Dimension::Interests => "interests",
            Dimension::CommunicationStyle => "communication style",
            Dimension::ConnectionType => "connection type",
            Dimension::GrowthAreas => "growth areas",
            Dimension::Availability => "availability",
            Dimension::IdentityTags => "identity",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A participant's attribute record used by the group matcher.
///
/// Attribute lists keep the author's original spelling for display; matching
/// always goes through `NormalizedProfile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub communication_style: Vec<String>,
    #[serde(default)]
    pub connection_type: Vec<String>,
    #[serde(default)]
    pub growth_areas: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub identity_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub public_profiles: BTreeMap<String, String>,
}

fn default_name() -> String {
    DEFAULT_PROFILE_NAME.to_string()
}

impl Profile {
    pub fn new(id: impl Into<ProfileId>) -> Self {
        Self {
            id: id.into(),
            name: default_name(),
            values: Vec::new(),
            goals: Vec::new(),
            preferences: Vec::new(),
            interests: Vec::new(),
            communication_style: Vec::new(),
            connection_type: Vec::new(),
            growth_areas: Vec::new(),
            availability: Vec::new(),
            identity_tags: Vec::new(),
            location: None,
            timezone: None,
            public_profiles: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Values => &self.values,
            Dimension::Goals => &self.goals,
            Dimension::Preferences => &self.preferences,
            Dimension::Interests => &self.interests,
            Dimension::CommunicationStyle => &self.communication_style,
            Dimension::ConnectionType => &self.connection_type,
            Dimension::GrowthAreas => &self.growth_areas,
            Dimension::Availability => &self.availability,
            Dimension::IdentityTags => &self.identity_tags,
        }
    }

    pub fn attribute_mut(&mut self, dimension: Dimension) -> &mut Vec<String> {
        match dimension {
            Dimension::Values => &mut self.values,
            Dimension::Goals => &mut self.goals,
            Dimension::Preferences => &mut self.preferences,
            Dimension::Interests => &mut self.interests,
            Dimension::CommunicationStyle => &mut self.communication_style,
            Dimension::ConnectionType => &mut self.connection_type,
            Dimension::GrowthAreas => &mut self.growth_areas,
            Dimension::Availability => &mut self.availability,
            Dimension::IdentityTags => &mut self.identity_tags,
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, dimension: Dimension, tokens: &[&str]) -> Self {
        *self.attribute_mut(dimension) = tokens.iter().map(|t| t.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub preferred_times: Vec<String>,
}

/// Profile shape used by the single-pair compatibility scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringProfile {
    pub id: ProfileId,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub core_values: Vec<String>,
    #[serde(default)]
    pub personal_goals: Vec<String>,
    #[serde(default)]
    pub preferred_communication: Vec<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub bio: String,
}

impl ScoringProfile {
    pub fn new(id: impl Into<ProfileId>) -> Self {
        Self {
            id: id.into(),
            name: default_name(),
            core_values: Vec::new(),
            personal_goals: Vec::new(),
            preferred_communication: Vec::new(),
            availability: Availability::default(),
            bio: String::new(),
        }
    }
}
