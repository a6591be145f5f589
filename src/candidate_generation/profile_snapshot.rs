// src/candidate_generation/profile_snapshot.rs
// Loads participant pools from a JSON document-store snapshot. Documents are
// loosely typed, so every field is coerced rather than strictly deserialized.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::models::profile::{Availability, Dimension, Profile, ProfileId, ScoringProfile, DEFAULT_PROFILE_NAME};

fn string_list(doc: &Map<String, Value>, key: &str) -> Vec<String> {
    match doc.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn optional_string(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn display_name(doc: &Map<String, Value>) -> String {
    doc.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_PROFILE_NAME)
        .to_string()
}

/// Coerces one document into a `Profile`. `id` always comes from the caller.
pub fn coerce_profile(id: impl Into<ProfileId>, doc: &Value) -> Profile {
    let mut profile = Profile::new(id);
    let Some(doc) = doc.as_object() else {
        return profile;
    };

    profile.name = display_name(doc);
    for dim in Dimension::ALL {
        *profile.attribute_mut(dim) = string_list(doc, dim.field_name());
    }
    profile.location = optional_string(doc, "location");
    profile.timezone = optional_string(doc, "timezone");
    profile.public_profiles = match doc.get("publicProfiles") {
        Some(Value::Object(links)) => links
            .iter()
            .filter_map(|(platform, url)| url.as_str().map(|u| (platform.clone(), u.to_string())))
            .collect::<BTreeMap<_, _>>(),
        _ => BTreeMap::new(),
    };
    profile
}

pub fn coerce_scoring_profile(id: impl Into<ProfileId>, doc: &Value) -> ScoringProfile {
    let mut profile = ScoringProfile::new(id);
    let Some(doc) = doc.as_object() else {
        return profile;
    };

    profile.name = display_name(doc);
    profile.core_values = string_list(doc, "coreValues");
    profile.personal_goals = string_list(doc, "personalGoals");
    profile.preferred_communication = string_list(doc, "preferredCommunication");
    profile.bio = optional_string(doc, "bio").unwrap_or_default();
    profile.availability = match doc.get("availability") {
        Some(Value::Object(avail)) => Availability {
            timezone: optional_string(avail, "timezone"),
            preferred_times: string_list(avail, "preferredTimes"),
        },
        _ => Availability::default(),
    };
    profile
}

/// Splits a snapshot into (id, document) entries. Accepts an array of
/// documents carrying `id` or an object keyed by id.
fn snapshot_entries(snapshot: &Value) -> Result<Vec<(String, &Value)>> {
    match snapshot {
        Value::Array(docs) => {
            let mut entries = Vec::with_capacity(docs.len());
            for (idx, doc) in docs.iter().enumerate() {
                match doc.get("id").and_then(Value::as_str) {
                    Some(id) if !id.trim().is_empty() => entries.push((id.to_string(), doc)),
                    _ => warn!("Skipping snapshot document {} without a string id", idx),
                }
            }
            Ok(entries)
        }
        Value::Object(docs) => Ok(docs.iter().map(|(id, doc)| (id.clone(), doc)).collect()),
        other => Err(anyhow!(
            "Snapshot must be an array or an object of documents, found {}",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                _ => "a string",
            }
        )),
    }
}

pub fn parse_profiles(snapshot: &Value) -> Result<Vec<Profile>> {
    let profiles: Vec<Profile> = snapshot_entries(snapshot)?
        .into_iter()
        .map(|(id, doc)| coerce_profile(id, doc))
        .collect();
    debug!("Parsed {} profiles from snapshot", profiles.len());
    Ok(profiles)
}

pub fn parse_scoring_profiles(snapshot: &Value) -> Result<Vec<ScoringProfile>> {
    let profiles: Vec<ScoringProfile> = snapshot_entries(snapshot)?
        .into_iter()
        .map(|(id, doc)| coerce_scoring_profile(id, doc))
        .collect();
    debug!("Parsed {} scoring profiles from snapshot", profiles.len());
    Ok(profiles)
}

fn read_snapshot(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Snapshot {} is not valid JSON", path.display()))
}

pub fn load_profiles_from_file(path: impl AsRef<Path>) -> Result<Vec<Profile>> {
    let path = path.as_ref();
    let profiles = parse_profiles(&read_snapshot(path)?)?;
    info!("Loaded {} profiles from {}", profiles.len(), path.display());
    Ok(profiles)
}

pub fn load_scoring_profiles_from_file(path: impl AsRef<Path>) -> Result<Vec<ScoringProfile>> {
    let path = path.as_ref();
    let profiles = parse_scoring_profiles(&read_snapshot(path)?)?;
    info!("Loaded {} scoring profiles from {}", profiles.len(), path.display());
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_coerce_profile_tolerates_bad_fields() {
        let doc = json!({
            "name": "",
            "values": ["Empathy", 7, null, "growth"],
            "goals": "travel",
            "timezone": 5,
            "location": "Lisbon",
            "publicProfiles": {"github": "https://github.com/x", "bad": 1}
        });
        let profile = coerce_profile("u1", &doc);
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.name, "Anonymous");
        assert_eq!(profile.values, vec!["Empathy", "growth"]);
        assert!(profile.goals.is_empty());
        assert_eq!(profile.timezone, None);
        assert_eq!(profile.location.as_deref(), Some("Lisbon"));
        assert_eq!(profile.public_profiles.len(), 1);

        let not_an_object = coerce_profile("u2", &json!("oops"));
        assert_eq!(not_an_object.name, "Anonymous");
        assert!(not_an_object.values.is_empty());
    }

    #[test]
    fn test_coerce_scoring_profile() {
        let doc = json!({
            "name": "Bea",
            "coreValues": ["honesty"],
            "personalGoals": ["learn rust", false],
            "availability": {"timezone": "UTC", "preferredTimes": ["evening"]},
            "bio": "Hiking and chess"
        });
        let profile = coerce_scoring_profile("b", &doc);
        assert_eq!(profile.name, "Bea");
        assert_eq!(profile.personal_goals, vec!["learn rust"]);
        assert_eq!(profile.availability.timezone.as_deref(), Some("UTC"));
        assert_eq!(profile.bio, "Hiking and chess");
        assert!(profile.preferred_communication.is_empty());
    }

    #[test]
    fn test_snapshot_shapes() {
        let array = json!([{"id": "a", "values": ["x"]}, {"values": ["y"]}, {"id": "c"}]);
        let ids: Vec<String> = parse_profiles(&array).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let object = json!({"k1": {"name": "One"}, "k2": {}});
        let profiles = parse_profiles(&object).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].id, "k1");
        assert_eq!(profiles[0].name, "One");

        assert!(parse_profiles(&json!(42)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "s1", "coreValues": ["kindness"]}}]"#).unwrap();
        let profiles = load_scoring_profiles_from_file(file.path()).unwrap();
        assert_eq!(profiles[0].core_values, vec!["kindness"]);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        assert!(load_profiles_from_file(broken.path()).is_err());
    }
}
