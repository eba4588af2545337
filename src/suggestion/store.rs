use crate::suggestion::{NewSuggestion, Suggestion, SuggestionStatus};
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

/// In-memory suggestion store.
///
/// Status changes happen under the DashMap entry guard, so a concurrent
/// approve and reject of the same id cannot both succeed.
pub struct SuggestionStore {
    suggestions: DashMap<String, Suggestion>,
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self {
            suggestions: DashMap::new(),
        }
    }

    /// Store a new pending suggestion
    pub fn create(&self, new: NewSuggestion) -> Suggestion {
        let suggestion = Suggestion {
            id: Uuid::now_v7().to_string(),
            robot_id: new.robot_id,
            title: new.title,
            description: new.description,
            reasoning: new.reasoning,
            severity: new.severity,
            source: new.source,
            confidence: new.confidence,
            proposed_action: new.proposed_action,
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
        };
        self.suggestions
            .insert(suggestion.id.clone(), suggestion.clone());
        suggestion
    }

    pub fn get(&self, id: &str) -> Option<Suggestion> {
        self.suggestions.get(id).map(|s| s.clone())
    }

    /// Pending suggestions, most recent first, optionally for one robot
    pub fn get_pending(&self, robot_id: Option<&str>) -> Vec<Suggestion> {
        let mut pending: Vec<Suggestion> = self
            .suggestions
            .iter()
            .filter(|s| s.status == SuggestionStatus::Pending)
            .filter(|s| robot_id.map_or(true, |id| s.robot_id == id))
            .map(|s| s.value().clone())
            .collect();
        sort_newest_first(&mut pending);
        pending
    }

    /// All suggestions regardless of status, most recent first
    pub fn get_all(&self, limit: usize) -> Vec<Suggestion> {
        let mut all: Vec<Suggestion> = self.suggestions.iter().map(|s| s.value().clone()).collect();
        sort_newest_first(&mut all);
        all.truncate(limit);
        all
    }

    /// Approve a pending suggestion.
    ///
    /// Returns None if the id is unknown or the suggestion already left `pending`.
    pub fn approve(&self, id: &str) -> Option<Suggestion> {
        self.transition(id, SuggestionStatus::Approved)
    }

    /// Reject a pending suggestion. Same not-found semantics as [`approve`](Self::approve).
    pub fn reject(&self, id: &str) -> Option<Suggestion> {
        self.transition(id, SuggestionStatus::Rejected)
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    fn transition(&self, id: &str, status: SuggestionStatus) -> Option<Suggestion> {
        let mut suggestion = self.suggestions.get_mut(id)?;
        if suggestion.status != SuggestionStatus::Pending {
            return None;
        }
        suggestion.status = status;

        info!(
            suggestion_id = %id,
            robot_id = %suggestion.robot_id,
            status = ?status,
            "Suggestion status changed"
        );
        Some(suggestion.clone())
    }
}

impl Default for SuggestionStore {
    fn default() -> Self {
        Self::new()
    }
}

// UUIDv7 ids break ties between suggestions created in the same instant
fn sort_newest_first(items: &mut [Suggestion]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
