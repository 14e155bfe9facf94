//! Integration tests for visitor state stack discipline

use std::sync::atomic::{AtomicUsize, Ordering};

use sapling_ast::{build, Ast, NodeKind, NodeRef};
use sapling_engine::{
    reduce_node, Context, ContextOptions, Path, PathOptions, ReduceError, ReduceResult, Signal,
    Visitor, VisitorSet, VisitorState,
};

/// `if (foo) { for (;bar;) {} }`
fn if_for_program() -> NodeRef {
    let for_stmt = build::for_statement(
        None,
        Some(build::reference_identifier("bar".to_string())),
        None,
        build::block_statement(vec![]),
    );
    build::program(vec![build::if_statement(
        build::reference_identifier("foo".to_string()),
        build::block_statement(vec![for_stmt]),
        None,
    )])
}

/// Pushes the node kind on every enter and checks the stack mirrors the ancestry.
#[derive(Default)]
struct Pusher {
    pushes: AtomicUsize,
}

impl Visitor for Pusher {
    type State = &'static str;

    fn name(&self) -> &str {
        "pusher"
    }

    fn enter(
        &self,
        path: &Path,
        _: &mut Context,
        state: &mut VisitorState<&'static str>,
    ) -> ReduceResult<Signal> {
        if state.depth() != path.depth() {
            return Err(ReduceError::visitor(
                "pusher",
                format!("depth {} at ancestry depth {}", state.depth(), path.depth()),
            ));
        }
        if !path.is_root() && *state.get()? != path.parent_node().kind_name() {
            return Err(ReduceError::visitor("pusher", "top frame is not the parent's"));
        }
        state.reset(path.node().kind_name());
        self.pushes.fetch_add(1, Ordering::Relaxed);
        Ok(Signal::Retain)
    }

    fn exit(
        &self,
        path: &Path,
        _: &mut Context,
        state: &mut VisitorState<&'static str>,
    ) -> ReduceResult<Signal> {
        if !state.owns() || *state.get()? != path.node().kind_name() {
            return Err(ReduceError::visitor("pusher", "exit does not own its frame"));
        }
        Ok(Signal::Retain)
    }
}

/// Bubbles a removal of the enclosing loop from `bar`.
struct RemoveBarLoop;

impl Visitor for RemoveBarLoop {
    type State = ();

    fn name(&self) -> &str {
        "removeBarLoop"
    }

    fn enter(&self, path: &Path, _: &mut Context, _: &mut VisitorState<()>) -> ReduceResult<Signal> {
        if path.node().identifier_name() != Some("bar") {
            return Ok(Signal::Retain);
        }
        match path.find_ancestry(|p| matches!(p.node().kind, NodeKind::ForStatement(_))) {
            Some(loop_path) => Ok(Signal::parent(loop_path.node(), Signal::Remove)),
            None => Ok(Signal::Retain),
        }
    }
}

/// Fails on the identifier `bar`.
struct FailOnBar;

impl Visitor for FailOnBar {
    type State = ();

    fn name(&self) -> &str {
        "failOnBar"
    }

    fn enter(&self, path: &Path, _: &mut Context, _: &mut VisitorState<()>) -> ReduceResult<Signal> {
        if path.node().identifier_name() == Some("bar") {
            return Err(ReduceError::visitor("failOnBar", "bar"));
        }
        Ok(Signal::Retain)
    }
}

fn reduce_with(root: &NodeRef, visitors: &mut VisitorSet<'_>) -> ReduceResult<NodeRef> {
    let mut context = Context::new(Ast::new(root.clone(), "test.js"), ContextOptions::default());
    let path = Path::root(root.clone(), None, PathOptions::default());
    reduce_node(&path, visitors, &mut context)?.into_single()
}

#[test]
fn test_stack_mirrors_ancestry_and_is_balanced() {
    let pusher = Pusher::default();
    let mut visitors = VisitorSet::new().with(&pusher);
    reduce_with(&if_for_program(), &mut visitors).unwrap();

    assert_eq!(pusher.pushes.load(Ordering::Relaxed), 7);
    assert_eq!(visitors.pending_state_frames(), 0);
}

#[test]
fn test_balanced_when_parent_signal_bubbles_past_pushed_frames() {
    let pusher = Pusher::default();
    let mut visitors = VisitorSet::new().with(&pusher).with(RemoveBarLoop);
    let result = reduce_with(&if_for_program(), &mut visitors).unwrap();

    assert!(pusher.pushes.load(Ordering::Relaxed) > 7);
    assert_eq!(visitors.pending_state_frames(), 0);
    let NodeKind::Program(program) = &result.kind else {
        panic!("expected program");
    };
    let NodeKind::IfStatement(if_stmt) = &program.body[0].kind else {
        panic!("expected if statement");
    };
    let NodeKind::BlockStatement(block) = &if_stmt.consequent.kind else {
        panic!("expected block");
    };
    assert!(block.body.is_empty());
}

#[test]
fn test_balanced_when_later_visitor_fails() {
    let pusher = Pusher::default();
    let mut visitors = VisitorSet::new().with(&pusher).with(FailOnBar);
    let err = reduce_with(&if_for_program(), &mut visitors).unwrap_err();

    assert!(matches!(err, ReduceError::Visitor { .. }));
    // program, if, foo, block, for, bar
    assert_eq!(pusher.pushes.load(Ordering::Relaxed), 6);
    assert_eq!(visitors.pending_state_frames(), 0);
}

#[test]
fn test_visitor_set_is_reusable_after_failure() {
    let pusher = Pusher::default();
    let mut visitors = VisitorSet::new().with(&pusher).with(FailOnBar);
    assert!(reduce_with(&if_for_program(), &mut visitors).is_err());

    let other = build::program(vec![build::empty_statement()]);
    let result = reduce_with(&other, &mut visitors).unwrap();
    assert!(std::sync::Arc::ptr_eq(&result, &other));
    assert_eq!(visitors.pending_state_frames(), 0);
}

#[test]
fn test_find_reaches_enclosing_frames() {
    /// Pushes a frame per block and checks the outer program frame is still reachable.
    struct Blocks;
    impl Visitor for Blocks {
        type State = (&'static str, usize);
        fn name(&self) -> &str {
            "blocks"
        }
        fn enter(
            &self,
            path: &Path,
            context: &mut Context,
            state: &mut VisitorState<(&'static str, usize)>,
        ) -> ReduceResult<Signal> {
            match path.node().kind {
                NodeKind::Program(_) => state.reset(("program", 0)),
                NodeKind::BlockStatement(_) => {
                    let depth = state.get()?.1 + 1;
                    state.set_where(|(kind, _)| *kind == "program", |frame| frame.1 += 1)?;
                    state.reset(("block", depth));
                }
                NodeKind::ForStatement(_) => {
                    let (kind, depth) = *state.get()?;
                    let program = state.find(|(kind, _)| *kind == "program")?;
                    context.add_record(format!("{}:{}:{}", kind, depth, program.1));
                }
                _ => {}
            }
            Ok(Signal::Retain)
        }
    }

    let root = if_for_program();
    let mut context = Context::new(Ast::new(root.clone(), "test.js"), ContextOptions::default());
    context.reduce_root(VisitorSet::new().with(Blocks)).unwrap();
    let records: Vec<&String> = context.records_of::<String>().collect();
    assert_eq!(records, vec!["block:1:1"]);
}
