//! Per-pass context.
//!
//! A [`Context`] owns everything one pass over one [`Ast`] accumulates:
//! diagnostics, suppressions, records and cache dependencies. It also
//! carries the pass configuration (frozen, origin, lint decisions). Visitors
//! receive it mutably in every hook.
//!
//! # Pass Lifecycle
//!
//! 1. Build with [`Context::new`] and [`ContextOptions`]
//! 2. Call [`Context::reduce_root`] once with the pass's visitors
//! 3. Read results in place, or take them with [`Context::into_result`]

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use sapling_ast::{Ast, NodeRef};
use sapling_core::config::{ProjectConfig, SuppressionConfig};
use sapling_core::{Diagnostic, DiagnosticDescription, DiagnosticOrigin, Diagnostics, SourceLocation};
use tracing::{debug, debug_span, trace};

use crate::error::{ReduceError, ReduceResult};
use crate::lint_decisions::{LintDecision, LintDecisionAction, LintDecisions, PendingSuppression};
use crate::path::{Path, PathOptions};
use crate::records::Records;
use crate::reduce::Reducer;
use crate::suppressions::{overlapping, Suppression, SuppressionVisitor};
use crate::visitor::VisitorSet;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Run visitors for their side effects only; every signal is ignored.
    pub frozen: bool,
    /// Stamped onto every diagnostic.
    pub origin: DiagnosticOrigin,
    /// `Some` turns on lint-decision gating.
    pub lint_decisions: Option<Vec<LintDecision>>,
    /// Suppressions known before the pass starts.
    pub suppressions: Vec<Suppression>,
    pub suppression_config: SuppressionConfig,
    pub no_scope_creation: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            frozen: false,
            origin: DiagnosticOrigin::new("sapling"),
            lint_decisions: None,
            suppressions: Vec::new(),
            suppression_config: SuppressionConfig::default(),
            no_scope_creation: false,
        }
    }
}

impl ContextOptions {
    /// Options taken from a project configuration.
    pub fn from_project(config: &ProjectConfig) -> Self {
        ContextOptions {
            suppression_config: config.suppressions.clone(),
            no_scope_creation: config.reduce.no_scope_creation,
            ..ContextOptions::default()
        }
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn with_origin(mut self, origin: DiagnosticOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_lint_decisions(mut self, decisions: Vec<LintDecision>) -> Self {
        self.lint_decisions = Some(decisions);
        self
    }

    pub fn with_suppressions(mut self, suppressions: Vec<Suppression>) -> Self {
        self.suppressions = suppressions;
        self
    }
}

// ============================================================================
// Diagnostics bookkeeping
// ============================================================================

/// What happened to a diagnostic handed to the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticOutcome {
    /// False when an identical diagnostic was already recorded.
    pub added: bool,
    pub suppressed: bool,
    /// The lint decision that applied, if any.
    pub decision: Option<LintDecision>,
}

/// An alternative fix offered alongside a fixable diagnostic.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub fixed: NodeRef,
}

/// A diagnostic that comes with a fix.
#[derive(Debug, Clone)]
pub struct FixableDiagnostic {
    /// Node the diagnostic is reported on.
    pub target: NodeRef,
    /// Node to keep when the fix is not applied. Defaults to `target`.
    pub old: Option<NodeRef>,
    /// Default fix.
    pub fixed: Option<NodeRef>,
    pub suggestions: Vec<Suggestion>,
}

impl FixableDiagnostic {
    pub fn new(target: &NodeRef, fixed: NodeRef) -> Self {
        FixableDiagnostic {
            target: Arc::clone(target),
            old: None,
            fixed: Some(fixed),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(target: &NodeRef, suggestions: Vec<Suggestion>) -> Self {
        FixableDiagnostic {
            target: Arc::clone(target),
            old: None,
            fixed: None,
            suggestions,
        }
    }
}

/// Everything a finished pass produced.
#[derive(Debug)]
pub struct PassResult {
    /// The input AST with the reduced root (same generation when unchanged).
    pub ast: Ast,
    pub diagnostics: Diagnostics,
    pub suppressions: Vec<Suppression>,
    pub records: Records,
    pub cache_dependencies: BTreeSet<String>,
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug)]
pub struct Context {
    ast: Ast,
    frozen: bool,
    origin: DiagnosticOrigin,
    suppression_config: SuppressionConfig,
    no_scope_creation: bool,
    diagnostics: Diagnostics,
    suppressions: Vec<Suppression>,
    lint_decisions: LintDecisions,
    records: Records,
    cache_dependencies: BTreeSet<String>,
    reduced_root: Option<NodeRef>,
    reduced: bool,
}

impl Context {
    pub fn new(ast: Ast, options: ContextOptions) -> Self {
        Context {
            ast,
            frozen: options.frozen,
            origin: options.origin,
            suppression_config: options.suppression_config,
            no_scope_creation: options.no_scope_creation,
            diagnostics: Diagnostics::new(),
            suppressions: options.suppressions,
            lint_decisions: LintDecisions::new(options.lint_decisions),
            records: Records::new(),
            cache_dependencies: BTreeSet::new(),
            reduced_root: None,
            reduced: false,
        }
    }

    /// The AST this pass runs over (always the input root).
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn origin(&self) -> &DiagnosticOrigin {
        &self.origin
    }

    /// Path options every traversal of this context uses.
    pub fn path_options(&self) -> PathOptions {
        PathOptions {
            no_scope_creation: self.no_scope_creation,
        }
    }

    /// Run `visitors` over the whole tree. May be called once per context.
    ///
    /// A suppression-discovery visitor always runs ahead of `visitors`.
    /// After the walk, suppressions nested in an earlier suppression of the
    /// same category are reported.
    pub fn reduce_root(&mut self, visitors: VisitorSet<'_>) -> ReduceResult<NodeRef> {
        if self.reduced {
            return Err(ReduceError::AlreadyReduced);
        }
        self.reduced = true;

        let span = debug_span!("reduce_root", path = %self.ast.path(), frozen = self.frozen);
        let _guard = span.enter();

        let mut visitors = visitors;
        visitors.prepend(SuppressionVisitor::new(&self.suppression_config));
        debug!(visitors = ?visitors, "starting pass");

        let root = self.ast.root().clone();
        let path = Path::root(root.clone(), None, self.path_options());
        let reduced = Reducer::new(self, &mut visitors)
            .reduce_node(&path)?
            .into_single()?;

        if self.frozen && !Arc::ptr_eq(&reduced, &root) {
            return Err(ReduceError::FrozenMutation);
        }

        for (description, location) in overlapping(&self.suppressions) {
            self.add_diagnostic(description, location);
        }

        debug!(
            changed = !Arc::ptr_eq(&reduced, &root),
            diagnostics = self.diagnostics.len(),
            suppressions = self.suppressions.len(),
            "finished pass"
        );
        self.reduced_root = Some(reduced.clone());
        Ok(reduced)
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Record a diagnostic, applying suppressions and lint-decision gating.
    pub fn add_diagnostic(
        &mut self,
        description: DiagnosticDescription,
        location: Option<SourceLocation>,
    ) -> DiagnosticOutcome {
        self.record(description, location, false)
    }

    /// Record a diagnostic located at `node`.
    pub fn add_node_diagnostic(
        &mut self,
        node: &NodeRef,
        description: DiagnosticDescription,
    ) -> DiagnosticOutcome {
        self.record(description, node.loc.clone(), false)
    }

    /// Record a fixable diagnostic and return the node the caller should keep.
    ///
    /// Without lint decisions the fix is applied unless the diagnostic is
    /// suppressed. With lint decisions it is applied only under a `fix`
    /// decision, whose `id` picks a suggestion.
    pub fn add_fixable_diagnostic(
        &mut self,
        fix: FixableDiagnostic,
        description: DiagnosticDescription,
    ) -> NodeRef {
        let outcome = self.record(description, fix.target.loc.clone(), true);
        let old = fix.old.unwrap_or_else(|| Arc::clone(&fix.target));
        if outcome.suppressed {
            return old;
        }

        let chosen = outcome
            .decision
            .and_then(|decision| decision.id)
            .and_then(|id| fix.suggestions.get(id))
            .map(|suggestion| Arc::clone(&suggestion.fixed));
        chosen
            .or(fix.fixed)
            .or_else(|| fix.suggestions.first().map(|s| Arc::clone(&s.fixed)))
            .unwrap_or(old)
    }

    fn record(
        &mut self,
        description: DiagnosticDescription,
        location: Option<SourceLocation>,
        fixable: bool,
    ) -> DiagnosticOutcome {
        let mut suppressed = location.as_ref().is_some_and(|loc| {
            self.suppressions
                .iter()
                .any(|suppression| suppression.matches(&description, loc))
        });

        let mut decision = None;
        if self.lint_decisions.is_active() {
            decision = location.as_ref().and_then(|loc| {
                self.lint_decisions
                    .find(&description.category, description.category_value.as_deref(), loc)
                    .cloned()
            });
            match (&decision, &location) {
                (Some(d), _) if d.action == LintDecisionAction::Fix => {}
                (Some(d), Some(loc)) if d.action == LintDecisionAction::Suppress => {
                    self.records.push(PendingSuppression {
                        category: description.category.clone(),
                        category_value: description.category_value.clone(),
                        location: loc.clone(),
                    });
                    suppressed = true;
                }
                _ => suppressed = true,
            }
        }

        if suppressed {
            trace!(category = %description.category, "diagnostic suppressed");
        }

        let mut diagnostic = Diagnostic::new(description, location);
        diagnostic.integrity = self.ast.integrity().cloned();
        diagnostic.source_type = Some(self.ast.source_type());
        diagnostic.origins = vec![self.origin.clone()];
        diagnostic.fixable = fixable;
        diagnostic.suppressed = suppressed;

        DiagnosticOutcome {
            added: self.diagnostics.push(diagnostic),
            suppressed,
            decision,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn has_lint_decisions(&self) -> bool {
        self.lint_decisions.is_active()
    }

    // ------------------------------------------------------------------------
    // Suppressions
    // ------------------------------------------------------------------------

    pub fn suppressions(&self) -> &[Suppression] {
        &self.suppressions
    }

    pub fn add_suppression(&mut self, suppression: Suppression) {
        trace!(category = %suppression.category, start = suppression.start_line, end = suppression.end_line, "suppression");
        self.suppressions.push(suppression);
    }

    // ------------------------------------------------------------------------
    // Records and cache dependencies
    // ------------------------------------------------------------------------

    pub fn add_record<R: Any + Send + Sync>(&mut self, record: R) {
        self.records.push(record);
    }

    pub fn records_of<R: Any>(&self) -> impl Iterator<Item = &R> {
        self.records.of::<R>()
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Note that the pass's output depends on the file at `path`.
    pub fn add_cache_dependency(&mut self, path: impl Into<String>) {
        self.cache_dependencies.insert(path.into());
    }

    pub fn cache_dependencies(&self) -> &BTreeSet<String> {
        &self.cache_dependencies
    }

    /// Consume the context.
    pub fn into_result(self) -> PassResult {
        let ast = match &self.reduced_root {
            Some(root) => self.ast.with_root(root.clone()),
            None => self.ast,
        };
        PassResult {
            ast,
            diagnostics: self.diagnostics,
            suppressions: self.suppressions,
            records: self.records,
            cache_dependencies: self.cache_dependencies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapling_ast::build;
    use sapling_core::{Position, SourceType};

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new("a.js", Position::new(line, 0), Position::new(line, 5))
    }

    fn context(options: ContextOptions) -> Context {
        let ast = Ast::with_source(build::program(vec![]), "a.js", "debugger;")
            .with_source_type(SourceType::Script);
        Context::new(ast, options)
    }

    mod diagnostic_tests {
        use super::*;

        #[test]
        fn diagnostics_are_stamped() {
            let mut ctx = context(ContextOptions::default().with_origin(DiagnosticOrigin::new("lint")));
            let outcome = ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), Some(loc(1)));
            assert!(outcome.added);
            assert!(!outcome.suppressed);

            let diagnostic = ctx.diagnostics().iter().next().unwrap();
            assert_eq!(diagnostic.source_type, Some(SourceType::Script));
            assert_eq!(diagnostic.origins[0].category, "lint");
            assert!(diagnostic.integrity.as_ref().unwrap().to_string().starts_with("sha256-"));
        }

        #[test]
        fn duplicates_are_dropped() {
            let mut ctx = context(ContextOptions::default());
            let description = DiagnosticDescription::new("lint/a", "m");
            assert!(ctx.add_diagnostic(description.clone(), Some(loc(1))).added);
            assert!(!ctx.add_diagnostic(description, Some(loc(1))).added);
            assert_eq!(ctx.diagnostics().len(), 1);
        }

        #[test]
        fn suppressions_flag_matching_diagnostics() {
            let mut ctx = context(
                ContextOptions::default().with_suppressions(vec![Suppression::new("lint/a", "a.js", 1, 3)]),
            );
            assert!(ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), Some(loc(2))).suppressed);
            assert!(!ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), Some(loc(4))).suppressed);
            assert!(!ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), None).suppressed);
            assert_eq!(ctx.diagnostics().active().count(), 2);
        }
    }

    mod decision_tests {
        use super::*;

        #[test]
        fn decisions_suppress_everything_not_fixed() {
            let decisions = vec![LintDecision::new(LintDecisionAction::Fix, "lint/a", Position::new(1, 0))];
            let mut ctx = context(ContextOptions::default().with_lint_decisions(decisions));
            assert!(ctx.has_lint_decisions());
            assert!(!ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), Some(loc(1))).suppressed);
            assert!(ctx.add_diagnostic(DiagnosticDescription::new("lint/b", "m"), Some(loc(1))).suppressed);
            assert!(ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), None).suppressed);
        }

        #[test]
        fn suppress_decision_records_pending_suppression() {
            let decisions = vec![LintDecision::new(LintDecisionAction::Suppress, "lint/a", Position::new(2, 0))];
            let mut ctx = context(ContextOptions::default().with_lint_decisions(decisions));
            let outcome = ctx.add_diagnostic(DiagnosticDescription::new("lint/a", "m"), Some(loc(2)));
            assert!(outcome.suppressed);
            let pending: Vec<_> = ctx.records_of::<PendingSuppression>().collect();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].location, loc(2));
        }

        #[test]
        fn fix_is_applied_without_decisions() {
            let target = build::null_literal().with_location(loc(1));
            let fixed = build::boolean_literal(false);
            let mut ctx = context(ContextOptions::default());
            let kept = ctx.add_fixable_diagnostic(
                FixableDiagnostic::new(&target, fixed.clone()),
                DiagnosticDescription::new("lint/a", "m"),
            );
            assert!(Arc::ptr_eq(&kept, &fixed));
            assert!(ctx.diagnostics().iter().next().unwrap().fixable);
        }

        #[test]
        fn fix_is_withheld_when_suppressed() {
            let target = build::null_literal().with_location(loc(1));
            let mut ctx = context(
                ContextOptions::default().with_suppressions(vec![Suppression::new("lint/a", "a.js", 1, 1)]),
            );
            let kept = ctx.add_fixable_diagnostic(
                FixableDiagnostic::new(&target, build::boolean_literal(false)),
                DiagnosticDescription::new("lint/a", "m"),
            );
            assert!(Arc::ptr_eq(&kept, &target));
        }

        #[test]
        fn decision_id_selects_suggestion() {
            let target = build::null_literal().with_location(loc(3));
            let first = build::boolean_literal(true);
            let second = build::boolean_literal(false);
            let suggestions = vec![
                Suggestion { title: "a".into(), description: "first".into(), fixed: first },
                Suggestion { title: "b".into(), description: "second".into(), fixed: second.clone() },
            ];
            let decisions = vec![LintDecision::new(LintDecisionAction::Fix, "lint/a", Position::new(3, 0)).with_id(1)];
            let mut ctx = context(ContextOptions::default().with_lint_decisions(decisions));
            let kept = ctx.add_fixable_diagnostic(
                FixableDiagnostic::with_suggestions(&target, suggestions),
                DiagnosticDescription::new("lint/a", "m"),
            );
            assert!(Arc::ptr_eq(&kept, &second));
        }
    }

    #[test]
    fn records_and_dependencies_reach_result() {
        let mut ctx = context(ContextOptions::default());
        ctx.add_record(7u32);
        ctx.add_cache_dependency("b.js");
        ctx.add_cache_dependency("b.js");
        let generation = ctx.ast().generation();
        let result = ctx.into_result();
        assert_eq!(result.records.of::<u32>().copied().collect::<Vec<_>>(), vec![7]);
        assert_eq!(result.cache_dependencies.len(), 1);
        assert_eq!(result.ast.generation(), generation);
    }

    #[test]
    fn reduce_root_runs_once() {
        let mut ctx = context(ContextOptions::default());
        ctx.reduce_root(VisitorSet::new()).unwrap();
        assert!(matches!(ctx.reduce_root(VisitorSet::new()), Err(ReduceError::AlreadyReduced)));
    }

    #[test]
    fn options_follow_project_config() {
        let config = ProjectConfig::from_json(r#"{"reduce": {"noScopeCreation": true}}"#).unwrap();
        let ctx = context(ContextOptions::from_project(&config));
        assert!(ctx.path_options().no_scope_creation);
    }
}
