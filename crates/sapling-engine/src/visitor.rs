//! The visitor trait and the ordered visitor set a pass runs.
//!
//! A [`Visitor`] gets an `enter` hook before a node's children are walked
//! and an `exit` hook after. Both return a [`Signal`]. Visitors take `&self`:
//! anything that has to change during the pass lives either in the
//! visitor's [`VisitorState`] (scoped to the current branch) or on the
//! [`Context`] (pass-wide diagnostics and records).
//!
//! ```
//! use sapling_ast::{build, Ast, NodeKind};
//! use sapling_engine::{Context, ContextOptions, Path, ReduceResult, Signal, Visitor, VisitorSet, VisitorState};
//!
//! struct DropEmpty;
//!
//! impl Visitor for DropEmpty {
//!     type State = ();
//!
//!     fn name(&self) -> &str {
//!         "dropEmpty"
//!     }
//!
//!     fn enter(&self, path: &Path, _: &mut Context, _: &mut VisitorState<()>) -> ReduceResult<Signal> {
//!         match path.node().kind {
//!             NodeKind::EmptyStatement(_) => Ok(Signal::Remove),
//!             _ => Ok(Signal::Retain),
//!         }
//!     }
//! }
//!
//! let program = build::program(vec![build::empty_statement()]);
//! let mut context = Context::new(Ast::new(program, "a.js"), ContextOptions::default());
//! let root = context.reduce_root(VisitorSet::new().with(DropEmpty)).unwrap();
//! match &root.kind {
//!     NodeKind::Program(p) => assert!(p.body.is_empty()),
//!     _ => unreachable!(),
//! }
//! ```

use std::fmt;

use crate::context::Context;
use crate::error::ReduceResult;
use crate::path::{Path, PathToken};
use crate::signal::Signal;
use crate::visitor_state::VisitorState;

/// Which hook of a visitor is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Enter,
    Exit,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Enter => f.write_str("enter"),
            Hook::Exit => f.write_str("exit"),
        }
    }
}

pub trait Visitor {
    /// Branch-scoped state, see [`VisitorState`]. Use `()` when unused.
    type State;

    fn name(&self) -> &str;

    fn enter(
        &self,
        _path: &Path,
        _context: &mut Context,
        _state: &mut VisitorState<Self::State>,
    ) -> ReduceResult<Signal> {
        Ok(Signal::Retain)
    }

    fn exit(
        &self,
        _path: &Path,
        _context: &mut Context,
        _state: &mut VisitorState<Self::State>,
    ) -> ReduceResult<Signal> {
        Ok(Signal::Retain)
    }
}

impl<V: Visitor + ?Sized> Visitor for &V {
    type State = V::State;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn enter(
        &self,
        path: &Path,
        context: &mut Context,
        state: &mut VisitorState<Self::State>,
    ) -> ReduceResult<Signal> {
        (**self).enter(path, context, state)
    }

    fn exit(
        &self,
        path: &Path,
        context: &mut Context,
        state: &mut VisitorState<Self::State>,
    ) -> ReduceResult<Signal> {
        (**self).exit(path, context, state)
    }
}

// ============================================================================
// Type-erased visitors
// ============================================================================

/// Result of one hook call. `pushed` is reported even when the hook failed,
/// so the frame that made the call can still pop it.
pub(crate) struct HookOutcome {
    pub(crate) signal: ReduceResult<Signal>,
    pub(crate) pushed: bool,
}

pub(crate) trait ErasedVisitor {
    fn name(&self) -> &str;
    fn call(&mut self, hook: Hook, path: &Path, context: &mut Context) -> HookOutcome;
    fn pop(&mut self, token: PathToken);
    fn depth(&self) -> usize;
}

struct BoundVisitor<V: Visitor> {
    visitor: V,
    state: VisitorState<V::State>,
}

impl<V: Visitor> ErasedVisitor for BoundVisitor<V> {
    fn name(&self) -> &str {
        self.visitor.name()
    }

    fn call(&mut self, hook: Hook, path: &Path, context: &mut Context) -> HookOutcome {
        self.state.bind(path.token());
        let signal = match hook {
            Hook::Enter => self.visitor.enter(path, context, &mut self.state),
            Hook::Exit => self.visitor.exit(path, context, &mut self.state),
        };
        HookOutcome {
            signal,
            pushed: self.state.check_pushed(),
        }
    }

    fn pop(&mut self, token: PathToken) {
        self.state.pop(token);
    }

    fn depth(&self) -> usize {
        self.state.depth()
    }
}

/// Visitors in the order their hooks run.
#[derive(Default)]
pub struct VisitorSet<'v> {
    entries: Vec<Box<dyn ErasedVisitor + 'v>>,
}

impl<'v> VisitorSet<'v> {
    pub fn new() -> Self {
        VisitorSet {
            entries: Vec::new(),
        }
    }

    /// Append a visitor. Pass `&visitor` to keep ownership.
    pub fn with<V>(mut self, visitor: V) -> Self
    where
        V: Visitor + 'v,
        V::State: 'v,
    {
        self.push(visitor);
        self
    }

    pub fn push<V>(&mut self, visitor: V)
    where
        V: Visitor + 'v,
        V::State: 'v,
    {
        self.entries.push(Self::bind(visitor));
    }

    pub(crate) fn prepend<V>(&mut self, visitor: V)
    where
        V: Visitor + 'v,
        V::State: 'v,
    {
        self.entries.insert(0, Self::bind(visitor));
    }

    fn bind<V>(visitor: V) -> Box<dyn ErasedVisitor + 'v>
    where
        V: Visitor + 'v,
        V::State: 'v,
    {
        let state = VisitorState::new(visitor.name());
        Box::new(BoundVisitor { visitor, state })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    /// Total state frames currently pushed across all visitors.
    ///
    /// Zero whenever no traversal is in progress.
    pub fn pending_state_frames(&self) -> usize {
        self.entries.iter().map(|entry| entry.depth()).sum()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut (dyn ErasedVisitor + 'v)> {
        self.entries.get_mut(index).map(|entry| entry.as_mut())
    }
}

impl fmt::Debug for VisitorSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
