//! The reduction algorithm.
//!
//! One frame per node:
//!
//! 1. Run every visitor's `enter` hook in order. A replacement forks the
//!    path and later visitors see the new node. `Skip` ends the frame and
//!    reports no change, dropping replacements made by earlier enter hooks.
//!    `Remove`, `ReplaceList` and `Parent` end the frame and go straight to
//!    the parent.
//! 2. Walk the child slots in declaration order. Each child edit rebuilds
//!    this node with the new slot value and forks the path, so later
//!    siblings see the updated parent.
//! 3. Run every `exit` hook in order, with the same handling as `enter`.
//! 4. Return `Retain` if the node is the one the frame started with,
//!    otherwise `Replace` with the final node.
//!
//! State frames a visitor pushed while this node was current are popped when
//! the frame ends, whatever the outcome. In a frozen pass the hooks still
//! run but their signals are ignored, so the tree comes back unchanged.

use std::sync::Arc;

use sapling_ast::{NodeRef, Slot, SlotShape, SlotValue};
use tracing::trace;

use crate::context::Context;
use crate::error::{ReduceError, ReduceResult};
use crate::path::Path;
use crate::signal::{validate_signal, Signal};
use crate::splice::{ListSplice, MAX_REVISITS};
use crate::visitor::{Hook, VisitorSet};

/// What reducing a node produced.
#[derive(Debug, Clone)]
pub enum ReducedNode {
    Single(NodeRef),
    List(Vec<NodeRef>),
}

impl ReducedNode {
    /// The single resulting node. A list result is an error.
    pub fn into_single(self) -> ReduceResult<NodeRef> {
        match self {
            ReducedNode::Single(node) => Ok(node),
            ReducedNode::List(nodes) => Err(ReduceError::RootReplacedWithList { count: nodes.len() }),
        }
    }
}

/// Reduce `path` with `visitors`, returning the resulting node(s).
pub fn reduce_node(
    path: &Path,
    visitors: &mut VisitorSet<'_>,
    context: &mut Context,
) -> ReduceResult<ReducedNode> {
    Reducer::new(context, visitors).reduce_node(path)
}

/// Runs one traversal over a tree.
pub struct Reducer<'a, 'v> {
    context: &'a mut Context,
    visitors: &'a mut VisitorSet<'v>,
}

enum Flow {
    Continue,
    Return(Signal),
}

impl<'a, 'v> Reducer<'a, 'v> {
    pub fn new(context: &'a mut Context, visitors: &'a mut VisitorSet<'v>) -> Self {
        Reducer { context, visitors }
    }

    /// Reduce the tree at `path`.
    ///
    /// Removal and unresolved parent signals are errors here: nothing above
    /// `path` is left to handle them.
    pub fn reduce_node(&mut self, path: &Path) -> ReduceResult<ReducedNode> {
        match self.reduce_signal(path)? {
            Signal::Retain | Signal::Skip => Ok(ReducedNode::Single(path.node().clone())),
            Signal::Replace(node) => Ok(ReducedNode::Single(node)),
            Signal::ReplaceList(nodes) => Ok(ReducedNode::List(nodes)),
            Signal::Remove => Err(ReduceError::RootRemoved),
            Signal::Parent { target, .. } => Err(ReduceError::UnresolvedParent {
                target: describe_node(&target),
            }),
        }
    }

    /// Reduce the node at `path`, returning the signal for its parent.
    pub fn reduce_signal(&mut self, path: &Path) -> ReduceResult<Signal> {
        let mut pushed = Vec::new();
        let result = self.reduce_frame(path, &mut pushed);
        for &index in pushed.iter().rev() {
            if let Some(visitor) = self.visitors.get_mut(index) {
                visitor.pop(path.token());
            }
        }
        result
    }

    fn reduce_frame(&mut self, path: &Path, pushed: &mut Vec<usize>) -> ReduceResult<Signal> {
        let original = path.node().clone();
        let mut path = path.clone();

        if let Flow::Return(signal) = self.run_hooks(Hook::Enter, &mut path, pushed)? {
            return Ok(signal);
        }

        for field in path.node().kind.fields() {
            let bubbled = match field.shape {
                SlotShape::List => self.reduce_list(&mut path, field.key)?,
                SlotShape::Single | SlotShape::Optional => self.reduce_single(&mut path, field.key)?,
            };
            if let Some(signal) = bubbled {
                return Ok(intercept(signal, &path, &original));
            }
        }

        if let Flow::Return(signal) = self.run_hooks(Hook::Exit, &mut path, pushed)? {
            return Ok(signal);
        }

        Ok(settle(&path, &original))
    }

    fn run_hooks(
        &mut self,
        hook: Hook,
        path: &mut Path,
        pushed: &mut Vec<usize>,
    ) -> ReduceResult<Flow> {
        let frozen = self.context.is_frozen();
        for index in 0..self.visitors.len() {
            let Some(visitor) = self.visitors.get_mut(index) else {
                continue;
            };
            let outcome = visitor.call(hook, path, self.context);
            if outcome.pushed {
                pushed.push(index);
            }
            let signal = outcome.signal?;
            if frozen {
                continue;
            }
            match validate_signal(signal, path, visitor.name(), hook)? {
                Signal::Retain => {}
                Signal::Replace(node) => {
                    trace!(visitor = visitor.name(), %hook, from = path.node().kind_name(), to = node.kind_name(), "replace");
                    *path = path.fork(node);
                }
                Signal::Skip => return Ok(Flow::Return(Signal::Retain)),
                other => {
                    trace!(visitor = visitor.name(), %hook, signal = %other, "leaving frame");
                    return Ok(Flow::Return(other));
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn reduce_list(&mut self, path: &mut Path, key: &'static str) -> ReduceResult<Option<Signal>> {
        let items = match path.node().kind.slot(key) {
            Some(Slot::List(items)) => items.to_vec(),
            _ => return Ok(None),
        };
        let mut splice = ListSplice::new(items);
        while let Some((index, child)) = splice.current() {
            let signal = self.reduce_signal(&path.child_at(key, index, child))?;
            match splice.apply(signal) {
                Ok(false) => {}
                Ok(true) => {
                    if splice.revisits() > MAX_REVISITS {
                        return Err(ReduceError::NoFixedPoint {
                            node: path.node().kind_name().to_string(),
                            key: format!("{}[{}]", key, index),
                            revisits: splice.revisits(),
                        });
                    }
                    trace!(node = path.node().kind_name(), key, index, len = splice.items().len(), "splice");
                    let node = path.node().with_slot(key, SlotValue::List(splice.items().to_vec()))?;
                    *path = path.fork(node);
                }
                Err(parent) => return Ok(Some(parent)),
            }
        }
        Ok(None)
    }

    fn reduce_single(&mut self, path: &mut Path, key: &'static str) -> ReduceResult<Option<Signal>> {
        let mut revisits = 0;
        loop {
            let child = match path.node().kind.slot(key) {
                Some(Slot::Single(node)) | Some(Slot::Optional(Some(node))) => node.clone(),
                _ => return Ok(None),
            };
            let value = match self.reduce_signal(&path.child(key, child.clone()))? {
                Signal::Retain | Signal::Skip => return Ok(None),
                Signal::Replace(node) if Arc::ptr_eq(&node, &child) => return Ok(None),
                parent @ Signal::Parent { .. } => return Ok(Some(parent)),
                Signal::Remove => None,
                Signal::ReplaceList(nodes) if nodes.is_empty() => None,
                Signal::ReplaceList(nodes) => {
                    return Err(ReduceError::ListReplaceInNonListSlot {
                        visitor: "<parent signal>".to_string(),
                        node: format!("{}.{} ({} nodes)", path.node().kind_name(), key, nodes.len()),
                    })
                }
                Signal::Replace(node) => Some(node),
            };

            let Some(node) = value else {
                trace!(node = path.node().kind_name(), key, "remove");
                let updated = path.node().with_slot(key, SlotValue::Optional(None))?;
                *path = path.fork(updated);
                return Ok(None);
            };

            revisits += 1;
            if revisits > MAX_REVISITS {
                return Err(ReduceError::NoFixedPoint {
                    node: path.node().kind_name().to_string(),
                    key: key.to_string(),
                    revisits,
                });
            }
            let updated = path.node().with_slot(key, SlotValue::Single(node))?;
            *path = path.fork(updated);
        }
    }
}

/// Unwrap a parent signal addressed to this frame's node.
fn intercept(signal: Signal, path: &Path, original: &NodeRef) -> Signal {
    match signal {
        Signal::Parent { target, signal }
            if Arc::ptr_eq(&target, path.node()) || Arc::ptr_eq(&target, original) =>
        {
            trace!(node = path.node().kind_name(), signal = %signal, "parent signal delivered");
            match *signal {
                Signal::Retain => settle(path, original),
                Signal::Replace(node) if Arc::ptr_eq(&node, path.node()) => settle(path, original),
                Signal::Replace(node) if Arc::ptr_eq(&node, original) => Signal::Retain,
                inner => inner,
            }
        }
        other => other,
    }
}

fn settle(path: &Path, original: &NodeRef) -> Signal {
    if Arc::ptr_eq(path.node(), original) {
        Signal::Retain
    } else {
        Signal::Replace(path.node().clone())
    }
}

fn describe_node(node: &NodeRef) -> String {
    match &node.loc {
        Some(loc) => format!("{} at {}:{}", node.kind_name(), loc.path, loc.start),
        None => node.kind_name().to_string(),
    }
}
