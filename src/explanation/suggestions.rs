// src/explanation/suggestions.rs
// Free-form suggestions for a matched pair. Unlike explanations there is no
// template to fall back on, so generator errors propagate to the caller.

use std::fmt;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::explanation::generator::{TextGenerator, TextPrompt};
use crate::models::profile::Profile;

const SUGGESTION_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// Growth opportunities shorter than this are treated as list debris.
const MIN_OPPORTUNITY_CHARS: usize = 20;
const OPPORTUNITY_LIMIT: usize = 3;

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(?:(?:\d+[.)]|[-*"'])\s*)+"#).expect("valid list marker regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ConversationStarters,
    IceBreakers,
    GrowthSuggestions,
    GrowthOpportunities,
}

impl SuggestionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "conversation_starters" | "starters" => Some(SuggestionKind::ConversationStarters),
            "ice_breakers" | "icebreakers" => Some(SuggestionKind::IceBreakers),
            "growth_suggestions" => Some(SuggestionKind::GrowthSuggestions),
            "growth_opportunities" => Some(SuggestionKind::GrowthOpportunities),
            _ => None,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            SuggestionKind::ConversationStarters => "conversation starters",
            SuggestionKind::IceBreakers => "ice breaker activities",
            SuggestionKind::GrowthSuggestions => "growth and learning opportunities",
            SuggestionKind::GrowthOpportunities => "growth opportunities",
        }
    }

    fn criteria(self) -> &'static [&'static str] {
        match self {
            SuggestionKind::ConversationStarters => &[
                "Reference shared values or goals",
                "Are open-ended and encourage discussion",
                "Show genuine interest in the other person",
                "Are professional but friendly",
                "Avoid generic or cliché questions",
            ],
            SuggestionKind::IceBreakers => &[
                "Are appropriate for their communication preferences",
                "Help build rapport quickly",
                "Are engaging and fun",
                "Can be done in a short time",
                "Don't require special equipment",
            ],
            SuggestionKind::GrowthSuggestions => &[
                "Leverage each person's strengths",
                "Address areas for development",
                "Are mutually beneficial",
                "Are specific and actionable",
                "Align with their values and goals",
            ],
            SuggestionKind::GrowthOpportunities => &[
                "Are relevant to their shared or unique interests, values, or goals",
                "Can be worked on together or individually",
                "Are positive, practical, and inspiring",
            ],
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

fn join_or(tokens: &[String], empty: &str) -> String {
    if tokens.is_empty() {
        empty.to_string()
    } else {
        tokens.join(", ")
    }
}

fn describe(label: &str, profile: &Profile, kind: SuggestionKind) -> String {
    let mut lines = vec![
        format!("{} ({}):", label, profile.name),
        format!("- Core Values: {}", join_or(&profile.values, "N/A")),
        format!("- Personal Goals: {}", join_or(&profile.goals, "N/A")),
    ];
    match kind {
        SuggestionKind::IceBreakers => {
            lines.push(format!(
                "- Communication Preferences: {}",
                join_or(&profile.communication_style, "N/A")
            ));
        }
        SuggestionKind::GrowthOpportunities => {
            lines.push(format!("- Interests: {}", join_or(&profile.interests, "N/A")));
        }
        _ => {}
    }
    lines.join("\n")
}

pub fn build_prompt(kind: SuggestionKind, user: &Profile, other: &Profile) -> TextPrompt {
    let criteria: Vec<String> = kind
        .criteria()
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect();
    let prompt = format!(
        "Generate 3 {noun} based on these user profiles:\n\n{}\n\n{}\n\nGenerate 3 {noun} that:\n{}\n\nFormat each one on a new line.",
        describe("User 1", user, kind),
        describe("User 2", other, kind),
        criteria.join("\n"),
        noun = kind.noun(),
    );
    TextPrompt::new(SUGGESTION_SYSTEM_PROMPT, prompt)
}

/// Non-empty trimmed lines of a completion.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Growth opportunities arrive either as a JSON array of strings or as a
/// loose list; list markers are stripped and short fragments dropped.
pub fn parse_opportunities(raw: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(raw.trim()) {
        return items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    }

    split_lines(raw)
        .into_iter()
        .map(|line| {
            let stripped = LIST_MARKER.replace(&line, "");
            stripped.trim_end_matches(['"', '\'']).trim().to_string()
        })
        .filter(|line| line.chars().count() > MIN_OPPORTUNITY_CHARS)
        .take(OPPORTUNITY_LIMIT)
        .collect()
}

pub async fn generate_suggestions<G: TextGenerator>(
    generator: &G,
    kind: SuggestionKind,
    user: &Profile,
    other: &Profile,
) -> Result<Vec<String>> {
    let prompt = build_prompt(kind, user, other);
    debug!("Requesting {} for {} and {}", kind, user.id, other.id);

    let raw = generator
        .generate(&prompt)
        .await
        .with_context(|| format!("Failed to generate {} for {} and {}", kind, user.id, other.id))?;

    let suggestions = match kind {
        SuggestionKind::GrowthOpportunities => parse_opportunities(&raw),
        _ => split_lines(&raw),
    };
    if suggestions.is_empty() {
        return Err(anyhow!("Text generator returned no {}", kind));
    }

    info!("Generated {} {} for {} and {}", suggestions.len(), kind, user.id, other.id);
    Ok(suggestions)
}
