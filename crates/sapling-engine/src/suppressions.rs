//! Comment suppressions.
//!
//! A leading comment of the form
//!
//! ```text
//! // sapling-ignore lint/noDebugger lint/maxParams(3): legacy entry point
//! ```
//!
//! suppresses diagnostics of the listed categories on the lines spanned by
//! the node the comment is attached to. A category may carry a value in
//! parentheses, which then has to match the diagnostic's category value.
//! Everything after the first top-level `:` is the explanation.
//!
//! Malformed comments never stop a pass: they become diagnostics of their
//! own under `suppressions/*`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sapling_ast::{Comment, CommentId, Node, NodeRef};
use sapling_core::config::SuppressionConfig;
use sapling_core::diagnostics::categories;
use sapling_core::{DiagnosticDescription, SourceLocation};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::ReduceResult;
use crate::path::Path;
use crate::signal::Signal;
use crate::visitor::Visitor;
use crate::visitor_state::VisitorState;

static TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*(?:/[A-Za-z0-9_-]+)*)(?:\(([^()]*)\))?").unwrap()
});

/// An active suppression: a category silenced over a line range of one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suppression {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_value: Option<String>,
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Where the suppression comment is, for reporting on the suppression itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_location: Option<SourceLocation>,
}

impl Suppression {
    pub fn new(category: impl Into<String>, path: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Suppression {
            category: category.into(),
            category_value: None,
            path: path.into(),
            start_line,
            end_line,
            comment_location: None,
        }
    }

    pub fn with_category_value(mut self, value: impl Into<String>) -> Self {
        self.category_value = Some(value.into());
        self
    }

    /// Whether this suppression silences `description` reported at `location`.
    pub fn matches(&self, description: &DiagnosticDescription, location: &SourceLocation) -> bool {
        if self.category != description.category {
            return false;
        }
        if let Some(value) = &self.category_value {
            if description.category_value.as_ref() != Some(value) {
                return false;
            }
        }
        self.path == location.path && location.within_lines(self.start_line, self.end_line)
    }

    fn covers(&self, other: &Suppression) -> bool {
        self.path == other.path
            && self.category == other.category
            && self.category_value == other.category_value
            && other.start_line >= self.start_line
            && other.end_line <= self.end_line
    }

    fn location(&self) -> SourceLocation {
        self.comment_location
            .clone()
            .unwrap_or_else(|| SourceLocation::lines(self.path.clone(), self.start_line, self.end_line))
    }
}

/// A diagnostic produced while reading suppressions.
pub type SuppressionDiagnostic = (DiagnosticDescription, Option<SourceLocation>);

/// What one comment yielded.
#[derive(Debug, Default)]
pub struct ParsedComment {
    pub suppressions: Vec<Suppression>,
    pub diagnostics: Vec<SuppressionDiagnostic>,
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone)]
pub struct SuppressionParser {
    prefix: String,
    require_explanation: bool,
}

impl SuppressionParser {
    pub fn new(config: &SuppressionConfig) -> Self {
        SuppressionParser {
            prefix: config.prefix.trim().to_string(),
            require_explanation: config.require_explanation,
        }
    }

    /// Read the suppressions in `comment`, attached to `target` in file `path`.
    pub fn parse(&self, comment: &Comment, target: &Node, path: &str) -> ParsedComment {
        let mut parsed = ParsedComment::default();
        let at = comment.loc.clone().or_else(|| target.loc.clone());

        for line in comment.lines() {
            if line.strip_prefix('@').and_then(|l| self.strip_prefix(l)).is_some() {
                parsed.diagnostics.push((
                    DiagnosticDescription::new(
                        categories::SUPPRESSIONS_UNKNOWN_PREFIX,
                        format!("Unknown suppression prefix @{}", self.prefix),
                    )
                    .with_advice(format!("Write `{}` without the @", self.prefix)),
                    at.clone(),
                ));
                continue;
            }
            let Some(rest) = self.strip_prefix(line) else {
                continue;
            };
            self.parse_directive(rest, target, path, &at, &mut parsed);
        }
        parsed
    }

    /// The text after the prefix, if `line` starts with it as a whole word.
    fn strip_prefix<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with(':') {
            Some(rest)
        } else {
            None
        }
    }

    fn parse_directive(
        &self,
        rest: &str,
        target: &Node,
        path: &str,
        at: &Option<SourceLocation>,
        parsed: &mut ParsedComment,
    ) {
        let (targets, explanation) = split_explanation(rest);
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
        let mut found = Vec::new();

        let mut remaining = targets.trim_start();
        while !remaining.is_empty() {
            let matched = TARGET.captures(remaining).and_then(|caps| {
                let end = caps.get(0)?.end();
                let at_boundary = remaining[end..].is_empty()
                    || remaining[end..].starts_with(char::is_whitespace);
                at_boundary.then(|| {
                    let category = caps[1].to_string();
                    let value = caps.get(2).map(|m| m.as_str().trim().to_string());
                    (category, value, end)
                })
            });

            let consumed = match matched {
                Some((category, value, end)) => {
                    if seen.insert((category.clone(), value.clone())) {
                        found.push((category, value));
                    } else {
                        parsed.diagnostics.push((
                            DiagnosticDescription::new(
                                categories::SUPPRESSIONS_DUPLICATE,
                                format!("Duplicate suppression category {}", category),
                            ),
                            at.clone(),
                        ));
                    }
                    end
                }
                None => {
                    let end = remaining.find(char::is_whitespace).unwrap_or(remaining.len());
                    parsed.diagnostics.push((
                        DiagnosticDescription::new(
                            categories::SUPPRESSIONS_INVALID_CATEGORY,
                            format!("Invalid suppression category {}", &remaining[..end]),
                        ),
                        at.clone(),
                    ));
                    end
                }
            };
            remaining = remaining[consumed..].trim_start();
        }

        if found.is_empty() {
            parsed.diagnostics.push((
                DiagnosticDescription::new(
                    categories::SUPPRESSIONS_MISSING_TARGET,
                    "Suppression comment names no category to suppress",
                )
                .with_advice(format!("Example: `{} lint/someRule: reason`", self.prefix)),
                at.clone(),
            ));
            return;
        }

        if self.require_explanation && explanation.is_none_or(str::is_empty) {
            parsed.diagnostics.push((
                DiagnosticDescription::new(
                    categories::SUPPRESSIONS_MISSING_EXPLANATION,
                    "Suppression comment has no explanation",
                )
                .with_advice(format!("Add the reason after a colon: `{} {}: reason`", self.prefix, found[0].0)),
                at.clone(),
            ));
        }

        let Some(loc) = &target.loc else {
            return;
        };
        for (category, value) in found {
            parsed.suppressions.push(Suppression {
                category,
                category_value: value,
                path: path.to_string(),
                start_line: loc.start.line,
                end_line: loc.end.line,
                comment_location: at.clone(),
            });
        }
    }
}

/// Split `targets: explanation` at the first colon outside parentheses.
fn split_explanation(text: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return (&text[..index], Some(text[index + 1..].trim())),
            _ => {}
        }
    }
    (text, None)
}

/// Suppressions nested inside an earlier suppression of the same category.
pub fn overlapping(suppressions: &[Suppression]) -> Vec<SuppressionDiagnostic> {
    suppressions
        .iter()
        .enumerate()
        .filter(|(index, later)| suppressions[..*index].iter().any(|earlier| earlier.covers(later)))
        .map(|(_, later)| {
            (
                DiagnosticDescription::new(
                    categories::SUPPRESSIONS_OVERLAP,
                    format!(
                        "Suppression of {} is already covered by an enclosing suppression",
                        later.category
                    ),
                ),
                Some(later.location()),
            )
        })
        .collect()
}

// ============================================================================
// Discovery visitor
// ============================================================================

/// Collects suppressions from leading comments as the traversal reaches them.
///
/// Always runs first in a root pass so that later visitors' diagnostics see
/// every suppression covering the node they are on.
pub(crate) struct SuppressionVisitor {
    parser: SuppressionParser,
}

impl SuppressionVisitor {
    pub(crate) fn new(config: &SuppressionConfig) -> Self {
        SuppressionVisitor {
            parser: SuppressionParser::new(config),
        }
    }

    fn collect(&self, node: &NodeRef, context: &mut Context, seen: &mut HashSet<CommentId>) {
        for comment in &node.leading_comments {
            if !seen.insert(comment.id) {
                continue;
            }
            let parsed = self.parser.parse(comment, node, context.ast().path());
            for (description, location) in parsed.diagnostics {
                context.add_diagnostic(description, location);
            }
            for suppression in parsed.suppressions {
                context.add_suppression(suppression);
            }
        }
    }
}

impl Visitor for SuppressionVisitor {
    type State = HashSet<CommentId>;

    fn name(&self) -> &str {
        "suppressions"
    }

    fn enter(
        &self,
        path: &Path,
        context: &mut Context,
        state: &mut VisitorState<HashSet<CommentId>>,
    ) -> ReduceResult<Signal> {
        if path.is_root() {
            let mut seen = HashSet::new();
            self.collect(path.node(), context, &mut seen);
            state.reset(seen);
        } else if !path.node().leading_comments.is_empty() {
            self.collect(path.node(), context, state.get_mut()?);
        }
        Ok(Signal::Retain)
    }
}
