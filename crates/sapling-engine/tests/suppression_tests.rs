//! Integration tests for suppression discovery and lint-decision gating

use sapling_ast::{build, Ast, Comment, NodeKind, NodeRef};
use sapling_core::diagnostics::categories;
use sapling_core::{DiagnosticDescription, Position, ProjectConfig, SourceLocation};
use sapling_engine::{
    Context, ContextOptions, FixableDiagnostic, LintDecision, LintDecisionAction, Path,
    PendingSuppression, ReduceResult, Signal, Visitor, VisitorSet, VisitorState,
};

fn lines(start: u32, end: u32) -> SourceLocation {
    SourceLocation::new("src/app.js", Position::new(start, 0), Position::new(end, 10))
}

/// An expression statement `name;` spanning `start..=end`, with optional leading comments.
fn stmt(name: &str, start: u32, end: u32, comments: Vec<Comment>) -> NodeRef {
    let id = build::reference_identifier(name.to_string()).with_location(lines(start, start));
    build::expression_statement(id)
        .with_location(lines(start, end))
        .with_leading_comments(comments)
}

fn comment(id: u32, line: u32, text: &str) -> Comment {
    Comment::line(id, text).with_location(lines(line, line))
}

/// Reports `lint/noDebug` on every identifier named `debug`.
struct NoDebug;

impl Visitor for NoDebug {
    type State = ();

    fn name(&self) -> &str {
        "noDebug"
    }

    fn enter(&self, path: &Path, context: &mut Context, _: &mut VisitorState<()>) -> ReduceResult<Signal> {
        if path.node().identifier_name() == Some("debug") {
            context.add_node_diagnostic(
                path.node(),
                DiagnosticDescription::new("lint/noDebug", "Unexpected debug reference"),
            );
        }
        Ok(Signal::Retain)
    }
}

fn run(root: NodeRef, options: ContextOptions) -> Context {
    let mut context = Context::new(Ast::new(root, "src/app.js"), options);
    context.reduce_root(VisitorSet::new().with(NoDebug)).unwrap();
    context
}

fn active_categories(context: &Context) -> Vec<String> {
    context
        .diagnostics()
        .active()
        .map(|d| d.category().to_string())
        .collect()
}

#[test]
fn test_comment_suppresses_only_its_node() {
    let root = build::program(vec![
        stmt(
            "debug",
            2,
            2,
            vec![comment(0, 1, " sapling-ignore lint/noDebug: needed for the demo")],
        ),
        stmt("debug", 3, 3, vec![]),
    ]);
    let context = run(root, ContextOptions::default());

    assert_eq!(context.suppressions().len(), 1);
    assert_eq!(context.suppressions()[0].start_line, 2);
    assert_eq!(context.diagnostics().len(), 2);
    let suppressed: Vec<_> = context.diagnostics().suppressed().collect();
    assert_eq!(suppressed.len(), 1);
    assert_eq!(suppressed[0].location.as_ref().unwrap().start.line, 2);
    assert_eq!(active_categories(&context), vec!["lint/noDebug"]);
}

#[test]
fn test_shared_comment_is_read_once() {
    let shared = comment(7, 1, " sapling-ignore lint/noDebug: shared");
    let id = build::reference_identifier("debug".to_string())
        .with_location(lines(2, 2))
        .with_leading_comments(vec![shared.clone()]);
    let statement = build::expression_statement(id)
        .with_location(lines(2, 2))
        .with_leading_comments(vec![shared]);
    let context = run(build::program(vec![statement]), ContextOptions::default());

    assert_eq!(context.suppressions().len(), 1);
    assert!(active_categories(&context).is_empty());
}

#[test]
fn test_malformed_comments_become_diagnostics() {
    let root = build::program(vec![
        stmt("a", 2, 2, vec![comment(0, 1, "sapling-ignore")]),
        stmt("b", 4, 4, vec![comment(1, 3, "sapling-ignore lint/x lint/x: twice")]),
        stmt("c", 6, 6, vec![comment(2, 5, "sapling-ignore lint/y")]),
        stmt("d", 8, 8, vec![comment(3, 7, "@sapling-ignore lint/z: reason")]),
    ]);
    let context = run(root, ContextOptions::default());

    assert_eq!(
        active_categories(&context),
        vec![
            categories::SUPPRESSIONS_MISSING_TARGET,
            categories::SUPPRESSIONS_DUPLICATE,
            categories::SUPPRESSIONS_MISSING_EXPLANATION,
            categories::SUPPRESSIONS_UNKNOWN_PREFIX,
        ]
    );
    assert_eq!(context.suppressions().len(), 2);
}

#[test]
fn test_nested_same_category_suppression_overlaps() {
    let inner = stmt("debug", 3, 3, vec![comment(1, 2, "sapling-ignore lint/noDebug: inner")]);
    let block = build::block_statement(vec![inner])
        .with_location(lines(2, 4))
        .with_leading_comments(vec![comment(0, 1, "sapling-ignore lint/noDebug: outer")]);
    let context = run(build::program(vec![block]), ContextOptions::default());

    assert_eq!(active_categories(&context), vec![categories::SUPPRESSIONS_OVERLAP]);
    let overlap = context.diagnostics().active().next().unwrap();
    assert_eq!(overlap.location.as_ref().unwrap().start.line, 2);
}

#[test]
fn test_custom_prefix_from_project_config() {
    let config = ProjectConfig::from_json(
        r#"{"suppressions": {"prefix": "acme-ignore", "requireExplanation": false}}"#,
    )
    .unwrap();
    let root = build::program(vec![
        stmt("debug", 2, 2, vec![comment(0, 1, "acme-ignore lint/noDebug")]),
        stmt("debug", 4, 4, vec![comment(1, 3, "sapling-ignore lint/noDebug: old")]),
    ]);
    let context = run(root, ContextOptions::from_project(&config));

    assert_eq!(context.suppressions().len(), 1);
    assert_eq!(active_categories(&context), vec!["lint/noDebug"]);
}

#[test]
fn test_initial_suppressions_apply() {
    let root = build::program(vec![stmt("debug", 5, 5, vec![])]);
    let options = ContextOptions::default().with_suppressions(vec![sapling_engine::Suppression::new(
        "lint/noDebug",
        "src/app.js",
        4,
        6,
    )]);
    let context = run(root, options);
    assert!(active_categories(&context).is_empty());
    assert_eq!(context.diagnostics().len(), 1);
}

// ============================================================================
// Lint decisions
// ============================================================================

/// Rewrites `debug` to `log`, as a fixable diagnostic.
struct FixDebug;

impl Visitor for FixDebug {
    type State = ();

    fn name(&self) -> &str {
        "fixDebug"
    }

    fn enter(&self, path: &Path, context: &mut Context, _: &mut VisitorState<()>) -> ReduceResult<Signal> {
        if path.node().identifier_name() != Some("debug") {
            return Ok(Signal::Retain);
        }
        let fixed = build::reference_identifier("log".to_string());
        let kept = context.add_fixable_diagnostic(
            FixableDiagnostic::new(path.node(), fixed),
            DiagnosticDescription::new("lint/noDebug", "Use log instead"),
        );
        Ok(Signal::replace(kept))
    }
}

fn identifier_names(root: &NodeRef) -> Vec<String> {
    let NodeKind::Program(program) = &root.kind else {
        return Vec::new();
    };
    program
        .body
        .iter()
        .filter_map(|s| match &s.kind {
            NodeKind::ExpressionStatement(e) => e.expression.identifier_name().map(str::to_string),
            _ => None,
        })
        .collect()
}

fn run_fix(root: &NodeRef, options: ContextOptions) -> (NodeRef, Context) {
    let mut context = Context::new(Ast::new(root.clone(), "src/app.js"), options);
    let result = context.reduce_root(VisitorSet::new().with(FixDebug)).unwrap();
    (result, context)
}

#[test]
fn test_fix_applies_without_decisions() {
    let root = build::program(vec![stmt("debug", 1, 1, vec![]), stmt("debug", 2, 2, vec![])]);
    let (result, context) = run_fix(&root, ContextOptions::default());
    assert_eq!(identifier_names(&result), vec!["log", "log"]);
    assert_eq!(context.diagnostics().active().count(), 2);
}

#[test]
fn test_decisions_gate_fixes_and_diagnostics() {
    let root = build::program(vec![
        stmt("debug", 1, 1, vec![]),
        stmt("debug", 2, 2, vec![]),
        stmt("debug", 3, 3, vec![]),
    ]);
    let decisions = vec![
        LintDecision::new(LintDecisionAction::Fix, "lint/noDebug", Position::new(1, 0)),
        LintDecision::new(LintDecisionAction::Suppress, "lint/noDebug", Position::new(2, 0)),
    ];
    let (result, context) = run_fix(&root, ContextOptions::default().with_lint_decisions(decisions));

    assert_eq!(identifier_names(&result), vec!["log", "debug", "debug"]);
    assert_eq!(context.diagnostics().active().count(), 1);
    assert_eq!(context.diagnostics().suppressed().count(), 2);

    let pending: Vec<&PendingSuppression> = context.records_of::<PendingSuppression>().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].location.start.line, 2);
}
