//! The signals a visitor hook returns to steer the traversal.

use std::fmt;
use std::sync::Arc;

use sapling_ast::NodeRef;

use crate::error::{ReduceError, ReduceResult};
use crate::path::Path;
use crate::visitor::Hook;

/// What a visitor hook wants done with the node it was handed.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Keep the node, continue the traversal.
    Retain,
    /// Delete the node from its parent slot.
    Remove,
    /// Substitute one node.
    Replace(NodeRef),
    /// Substitute several nodes. Only legal for nodes in a list slot.
    ReplaceList(Vec<NodeRef>),
    /// Deliver `signal` to the ancestor frame whose node is `target`.
    Parent { target: NodeRef, signal: Box<Signal> },
    /// Stop processing this node: no further visitors, no children, no exits.
    /// Only legal from an `enter` hook.
    Skip,
}

impl Signal {
    pub fn replace(node: NodeRef) -> Self {
        Signal::Replace(node)
    }

    pub fn replace_list(nodes: Vec<NodeRef>) -> Self {
        Signal::ReplaceList(nodes)
    }

    /// Address `signal` to the ancestor `target`.
    pub fn parent(target: &NodeRef, signal: Signal) -> Self {
        Signal::Parent {
            target: Arc::clone(target),
            signal: Box::new(signal),
        }
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Signal::Retain)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Signal::Retain => "retain",
            Signal::Remove => "remove",
            Signal::Replace(_) => "replace",
            Signal::ReplaceList(_) => "replace-list",
            Signal::Parent { .. } => "parent",
            Signal::Skip => "skip",
        }
    }
}

impl From<NodeRef> for Signal {
    fn from(node: NodeRef) -> Self {
        Signal::Replace(node)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Replace(node) => write!(f, "replace({})", node.kind_name()),
            Signal::ReplaceList(nodes) => write!(f, "replace-list({})", nodes.len()),
            Signal::Parent { target, signal } => {
                write!(f, "parent({} <- {})", target.kind_name(), signal)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Check a signal returned by `visitor`'s `hook` at `path`.
///
/// Replacing a node with itself is normalized to [`Signal::Retain`].
pub(crate) fn validate_signal(
    signal: Signal,
    path: &Path,
    visitor: &str,
    hook: Hook,
) -> ReduceResult<Signal> {
    match signal {
        Signal::Replace(node) if Arc::ptr_eq(&node, path.node()) => Ok(Signal::Retain),
        Signal::ReplaceList(_) if path.list_index().is_none() => {
            Err(ReduceError::ListReplaceInNonListSlot {
                visitor: visitor.to_string(),
                node: describe_path(path),
            })
        }
        Signal::Skip if hook == Hook::Exit => Err(ReduceError::InvalidSignal {
            visitor: visitor.to_string(),
            reason: "skip is only meaningful from an enter hook".to_string(),
        }),
        Signal::Parent { target, signal } => match *signal {
            Signal::Skip | Signal::Parent { .. } => Err(ReduceError::InvalidSignal {
                visitor: visitor.to_string(),
                reason: format!("parent signal cannot carry {}", signal.name()),
            }),
            inner => Ok(Signal::Parent {
                target,
                signal: Box::new(inner),
            }),
        },
        other => Ok(other),
    }
}

/// `Kind.key[index]` for error messages.
pub(crate) fn describe_path(path: &Path) -> String {
    let parent = path.parent_node().kind_name();
    match (path.field_key(), path.list_index()) {
        (Some(key), Some(index)) => format!("{}.{}[{}]", parent, key, index),
        (Some(key), None) => format!("{}.{}", parent, key),
        _ => path.node().kind_name().to_string(),
    }
}
