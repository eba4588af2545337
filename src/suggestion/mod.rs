// Suggestion model and lifecycle store (pending → approved | rejected)

mod store;

pub use store::SuggestionStore;

use crate::analysis::{Alert, ProposedAction, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod tests;

/// Marker appended to the reasoning of suggestions produced by the AI fallback path
pub const AI_UNAVAILABLE_MARKER: &str = "(AI analysis unavailable)";

/// Where a suggestion came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Heuristic,
    Ai,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionSource::Heuristic => "heuristic",
            SuggestionSource::Ai => "ai",
        }
    }
}

impl fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Reviewable recommendation produced from an alert
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub robot_id: String,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    pub severity: Severity,
    pub source: SuggestionSource,
    pub confidence: f64,
    pub proposed_action: Option<ProposedAction>,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a suggestion
#[derive(Clone, Debug, PartialEq)]
pub struct NewSuggestion {
    pub robot_id: String,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    pub severity: Severity,
    pub source: SuggestionSource,
    pub confidence: f64,
    pub proposed_action: Option<ProposedAction>,
}

impl NewSuggestion {
    /// Heuristic suggestion carrying the alert's fields unchanged (confidence 1.0)
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            robot_id: alert.robot_id.clone(),
            title: alert.title.clone(),
            description: alert.description.clone(),
            reasoning: alert.reasoning.clone(),
            severity: alert.severity,
            source: SuggestionSource::Heuristic,
            confidence: 1.0,
            proposed_action: alert.proposed_action.clone(),
        }
    }

    /// Heuristic suggestion used when AI escalation failed for `alert`
    pub fn ai_fallback(alert: &Alert) -> Self {
        let mut suggestion = Self::from_alert(alert);
        suggestion.reasoning = format!("{} {}", alert.reasoning, AI_UNAVAILABLE_MARKER);
        suggestion
    }
}
