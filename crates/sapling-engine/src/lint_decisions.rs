//! Externally supplied per-diagnostic verdicts.
//!
//! An editor or review tool that previewed a lint run can feed back what
//! the user chose for each finding. While a pass runs with decisions, every
//! diagnostic is suppressed unless a decision at its position asks for it to
//! be fixed.

use std::collections::HashMap;

use sapling_core::{Position, SourceLocation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LintDecisionAction {
    /// Apply the fix (or the suggestion picked by `id`).
    Fix,
    /// Leave the code alone and record a suppression to be written.
    Suppress,
    /// Leave the code alone.
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LintDecision {
    pub action: LintDecisionAction,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_value: Option<String>,
    /// Start of the diagnostic this decision answers.
    pub start: Position,
    /// Index of the chosen suggestion, for `fix`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
}

impl LintDecision {
    pub fn new(action: LintDecisionAction, category: impl Into<String>, start: Position) -> Self {
        LintDecision {
            action,
            category: category.into(),
            category_value: None,
            start,
            id: None,
        }
    }

    pub fn with_category_value(mut self, value: impl Into<String>) -> Self {
        self.category_value = Some(value.into());
        self
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = Some(id);
        self
    }

    fn applies_to(&self, category: &str, category_value: Option<&str>) -> bool {
        self.category == category
            && match &self.category_value {
                Some(value) => category_value == Some(value.as_str()),
                None => true,
            }
    }
}

/// Key decisions are looked up by: `line:column` of the diagnostic start.
pub fn position_key(start: Position) -> String {
    format!("{}:{}", start.line, start.column)
}

/// Decisions indexed by position.
///
/// `None` input means "no decisions": gating is off. An empty list still
/// turns gating on, which suppresses everything.
#[derive(Debug, Clone, Default)]
pub struct LintDecisions {
    active: bool,
    by_position: HashMap<String, Vec<LintDecision>>,
}

impl LintDecisions {
    pub fn new(decisions: Option<Vec<LintDecision>>) -> Self {
        let Some(decisions) = decisions else {
            return Self::default();
        };
        let mut by_position: HashMap<String, Vec<LintDecision>> = HashMap::new();
        for decision in decisions {
            by_position
                .entry(position_key(decision.start))
                .or_default()
                .push(decision);
        }
        LintDecisions {
            active: true,
            by_position,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The decision for a diagnostic of `category` starting at `location`.
    pub fn find(
        &self,
        category: &str,
        category_value: Option<&str>,
        location: &SourceLocation,
    ) -> Option<&LintDecision> {
        self.by_position
            .get(&position_key(location.start))?
            .iter()
            .find(|decision| decision.applies_to(category, category_value))
    }
}

/// A suppression comment a later stage should insert, produced by a
/// `suppress` decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSuppression {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_value: Option<String>,
    pub location: SourceLocation,
}
