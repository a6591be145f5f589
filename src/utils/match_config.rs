// src/utils/match_config.rs
use std::env;

use log::{info, warn};

use crate::explanation::annotator::DEFAULT_EXPLANATION_CAP;
use crate::matching::compatibility::DEFAULT_COMPATIBILITY_THRESHOLD;
use crate::models::matching::{GroupSize, MatchOptions};
use crate::models::profile::Dimension;

pub const DEFAULT_MAX_MATCHES: usize = 10;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub options: MatchOptions,
    pub compatibility_threshold: u32,
    pub max_matches: usize,
    pub explanation_cap: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            options: MatchOptions::default(),
            compatibility_threshold: DEFAULT_COMPATIBILITY_THRESHOLD,
            max_matches: DEFAULT_MAX_MATCHES,
            explanation_cap: DEFAULT_EXPLANATION_CAP,
        }
    }
}

fn min_shared_var(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Values => "MIN_SHARED_VALUES",
        Dimension::Goals => "MIN_SHARED_GOALS",
        Dimension::Preferences => "MIN_SHARED_PREFERENCES",
        Dimension::Interests => "MIN_SHARED_INTERESTS",
        Dimension::CommunicationStyle => "MIN_SHARED_COMMUNICATION_STYLE",
        Dimension::ConnectionType => "MIN_SHARED_CONNECTION_TYPE",
        Dimension::GrowthAreas => "MIN_SHARED_GROWTH_AREAS",
        Dimension::Availability => "MIN_SHARED_AVAILABILITY",
        Dimension::IdentityTags => "MIN_SHARED_IDENTITY_TAGS",
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}='{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut options = defaults.options;

        for dim in Dimension::ALL {
            let min = parse_var(min_shared_var(dim), defaults.options.min_shared(dim));
            options.set_min_shared(dim, min);
        }

        let raw_size: u8 = parse_var("MATCH_GROUP_SIZE", u8::from(defaults.options.group_size));
        options.group_size = GroupSize::try_from(raw_size).unwrap_or_else(|e| {
            warn!("{}; using pairs", e);
            GroupSize::Pair
        });

        Self {
            options,
            compatibility_threshold: parse_var("COMPATIBILITY_THRESHOLD", defaults.compatibility_threshold).min(100),
            max_matches: parse_var("MAX_MATCHES", defaults.max_matches),
            explanation_cap: parse_var("EXPLANATION_CAP", defaults.explanation_cap),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        self.options
    }

    pub fn log_config(&self) {
        info!("🧩 Group matching: {} members per group", self.options.group_size.members());
        let thresholds: Vec<String> = Dimension::ALL
            .iter()
            .filter(|d| self.options.min_shared(**d) > 0)
            .map(|d| format!("{}>={}", d, self.options.min_shared(*d)))
            .collect();
        if thresholds.is_empty() {
            info!("   Minimums: none (any positive overlap qualifies)");
        } else {
            info!("   Minimums: {}", thresholds.join(", "));
        }
        info!(
            "🎯 Compatibility threshold: {}, max matches: {}, explanation cap: {}",
            self.compatibility_threshold, self.max_matches, self.explanation_cap
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.options.min_shared_values, 1);
        assert_eq!(config.options.group_size, GroupSize::Pair);
        assert_eq!(config.compatibility_threshold, 70);
        assert_eq!(config.max_matches, 10);
        assert_eq!(config.explanation_cap, 10);
    }

    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        env::set_var("MIN_SHARED_GOALS", "2");
        env::set_var("MIN_SHARED_IDENTITY_TAGS", "lots");
        env::set_var("MATCH_GROUP_SIZE", "3");
        env::set_var("COMPATIBILITY_THRESHOLD", "55");
        env::set_var("MAX_MATCHES", "4");

        let config = MatchConfig::from_env();
        assert_eq!(config.options.min_shared(Dimension::Goals), 2);
        assert_eq!(config.options.min_shared(Dimension::IdentityTags), 0);
        assert_eq!(config.match_options().group_size, GroupSize::Triple);
        assert_eq!(config.compatibility_threshold, 55);
        assert_eq!(config.max_matches, 4);

        env::set_var("MATCH_GROUP_SIZE", "7");
        assert_eq!(MatchConfig::from_env().options.group_size, GroupSize::Pair);

        for key in [
            "MIN_SHARED_GOALS",
            "MIN_SHARED_IDENTITY_TAGS",
            "MATCH_GROUP_SIZE",
            "COMPATIBILITY_THRESHOLD",
            "MAX_MATCHES",
        ] {
            env::remove_var(key);
        }
    }
}
