//! Diagnostics model: the recoverable findings a pass produces.
//!
//! Diagnostics never abort a pass. They accumulate on the pass context and are
//! handed back to the caller together with the reduced tree. A diagnostic that
//! matched a suppression is still recorded, but flagged `suppressed` so that
//! reporting can filter it without losing the information.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Integrity, SourceLocation, SourceType};

/// Well-known diagnostic categories emitted by the engine itself.
pub mod categories {
    /// A suppression comment that names no category.
    pub const SUPPRESSIONS_MISSING_TARGET: &str = "suppressions/missingTarget";
    /// The same category listed twice in one suppression comment.
    pub const SUPPRESSIONS_DUPLICATE: &str = "suppressions/duplicate";
    /// A suppression whose range is nested inside an earlier one of the same category.
    pub const SUPPRESSIONS_OVERLAP: &str = "suppressions/overlap";
    /// A suppression comment with no `: explanation` tail.
    pub const SUPPRESSIONS_MISSING_EXPLANATION: &str = "suppressions/missingExplanation";
    /// A comment that looks like a suppression but uses the wrong prefix form.
    pub const SUPPRESSIONS_UNKNOWN_PREFIX: &str = "suppressions/unknownPrefix";
    /// A suppression target that is not a well-formed category.
    pub const SUPPRESSIONS_INVALID_CATEGORY: &str = "suppressions/invalidCategory";
}

// ============================================================================
// Description and Origin
// ============================================================================

/// What a diagnostic says.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticDescription {
    /// Category, e.g. `lint/js/noDebugger`.
    pub category: String,
    /// Optional refinement of the category, e.g. a rule option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_value: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Extra advice lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advice: Vec<String>,
}

impl DiagnosticDescription {
    /// Create a description with no category value and no advice.
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        DiagnosticDescription {
            category: category.into(),
            category_value: None,
            message: message.into(),
            advice: Vec::new(),
        }
    }

    /// Attach a category value.
    pub fn with_category_value(mut self, value: impl Into<String>) -> Self {
        self.category_value = Some(value.into());
        self
    }

    /// Append an advice line.
    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice.push(advice.into());
        self
    }
}

/// Which pass produced a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DiagnosticOrigin {
    /// Pass category, e.g. `compile` or `lint`.
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DiagnosticOrigin {
    pub fn new(category: impl Into<String>) -> Self {
        DiagnosticOrigin {
            category: category.into(),
            message: None,
        }
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A single finding, stamped by the context that recorded it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub description: DiagnosticDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origins: Vec<DiagnosticOrigin>,
    /// A fix is available for this finding.
    #[serde(default)]
    pub fixable: bool,
    /// Matched a suppression or was gated off by lint decisions.
    #[serde(default)]
    pub suppressed: bool,
}

impl Diagnostic {
    /// Create an unstamped diagnostic.
    pub fn new(description: DiagnosticDescription, location: Option<SourceLocation>) -> Self {
        Diagnostic {
            description,
            location,
            integrity: None,
            source_type: None,
            origins: Vec::new(),
            fixable: false,
            suppressed: false,
        }
    }

    /// Category shortcut.
    pub fn category(&self) -> &str {
        &self.description.category
    }

    fn dedup_key(&self) -> (DiagnosticDescription, Option<SourceLocation>) {
        (self.description.clone(), self.location.clone())
    }
}

// ============================================================================
// Diagnostics collection
// ============================================================================

/// Ordered diagnostics with duplicate elimination.
///
/// Two diagnostics are duplicates when both description and location are
/// equal. The first occurrence keeps its position, but a suppressed
/// duplicate marks it suppressed, so a finding reported again after its
/// suppression was discovered does not stay active.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    seen: HashMap<(DiagnosticDescription, Option<SourceLocation>), usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic. Returns `false` if it was a duplicate and dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        let key = diagnostic.dedup_key();
        if let Some(&index) = self.seen.get(&key) {
            if diagnostic.suppressed {
                self.items[index].suppressed = true;
            }
            return false;
        }
        self.seen.insert(key, self.items.len());
        self.items.push(diagnostic);
        true
    }

    /// All recorded diagnostics in insertion order, suppressed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics that should surface to the user.
    pub fn active(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.suppressed)
    }

    /// Diagnostics that were recorded but suppressed.
    pub fn suppressed(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.suppressed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn at_line(line: u32) -> Option<SourceLocation> {
        Some(SourceLocation::new(
            "a.js",
            Position::new(line, 0),
            Position::new(line, 4),
        ))
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut diags = Diagnostics::new();
        let desc = DiagnosticDescription::new("lint/foo", "bad");
        assert!(diags.push(Diagnostic::new(desc.clone(), at_line(1))));
        assert!(!diags.push(Diagnostic::new(desc.clone(), at_line(1))));
        assert!(diags.push(Diagnostic::new(desc, at_line(2))));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn suppressed_duplicate_suppresses_first_entry() {
        let mut diags = Diagnostics::new();
        let desc = DiagnosticDescription::new("lint/foo", "bad");
        assert!(diags.push(Diagnostic::new(desc.clone(), at_line(1))));

        let mut again = Diagnostic::new(desc.clone(), at_line(1));
        again.suppressed = true;
        assert!(!diags.push(again));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.active().count(), 0);

        // An active duplicate never un-suppresses.
        assert!(!diags.push(Diagnostic::new(desc, at_line(1))));
        assert_eq!(diags.suppressed().count(), 1);
    }

    #[test]
    fn category_value_distinguishes_duplicates() {
        let mut diags = Diagnostics::new();
        let desc = DiagnosticDescription::new("lint/foo", "bad");
        diags.push(Diagnostic::new(desc.clone(), at_line(1)));
        diags.push(Diagnostic::new(desc.with_category_value("x"), at_line(1)));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn active_and_suppressed_partition() {
        let mut diags = Diagnostics::new();
        let mut hidden = Diagnostic::new(DiagnosticDescription::new("lint/a", "a"), at_line(1));
        hidden.suppressed = true;
        diags.push(hidden);
        diags.push(Diagnostic::new(DiagnosticDescription::new("lint/b", "b"), at_line(1)));
        assert_eq!(diags.active().count(), 1);
        assert_eq!(diags.suppressed().count(), 1);
        assert_eq!(diags.active().next().unwrap().category(), "lint/b");
    }

    #[test]
    fn diagnostic_serializes_camel_case() {
        let desc = DiagnosticDescription::new("lint/foo", "bad").with_category_value("v");
        let json = serde_json::to_string(&Diagnostic::new(desc, None)).unwrap();
        assert!(json.contains("\"categoryValue\":\"v\""));
        assert!(!json.contains("location"));
        assert!(json.contains("\"suppressed\":false"));
    }
}
