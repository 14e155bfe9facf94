//! Fatal error types for reduction passes.
//!
//! A [`ReduceError`] means a visitor or caller broke the engine's contract.
//! It aborts the whole pass. Recoverable findings are never errors: they are
//! recorded as diagnostics on the [`Context`](crate::Context) and the pass
//! continues.
//!
//! ## Design
//!
//! - **Separate channel**: diagnostics and fatal errors never share a type
//! - **Bridging**: slot and visitor-state errors convert into `ReduceError`
//! - **Visitor attribution**: errors raised by a visitor name that visitor

use sapling_ast::SlotError;
use thiserror::Error;

// ============================================================================
// Visitor State Errors
// ============================================================================

/// Errors from reading or writing a visitor's state stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// No state has been pushed for this visitor on the current branch.
    #[error("visitor state stack is empty")]
    Empty,

    /// A `find` predicate matched none of the frames.
    #[error("no visitor state frame matches the predicate")]
    NoMatch,
}

// ============================================================================
// Reduce Errors
// ============================================================================

/// Contract violations that abort a reduction pass.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// `reduce_root` was called a second time on the same context.
    #[error("reduce_root was already called on this context")]
    AlreadyReduced,

    /// A frozen pass returned a root that is not the input root.
    #[error("frozen pass produced a different root")]
    FrozenMutation,

    /// A parent signal reached the top of the traversal without meeting its target.
    #[error("parent signal target {target} is not an ancestor of the signalling node")]
    UnresolvedParent { target: String },

    /// A visitor returned a list replacement for a node that does not sit in a list slot.
    #[error("visitor '{visitor}' returned a list replacement for {node}, which is not in a list slot")]
    ListReplaceInNonListSlot { visitor: String, node: String },

    /// A visitor returned a signal that is not legal where it was returned.
    #[error("visitor '{visitor}' returned an invalid signal: {reason}")]
    InvalidSignal { visitor: String, reason: String },

    /// A child slot kept being replaced and never settled.
    #[error("{node}.{key} was replaced {revisits} times without settling")]
    NoFixedPoint {
        node: String,
        key: String,
        revisits: usize,
    },

    /// The root node was removed.
    #[error("root node was removed")]
    RootRemoved,

    /// The root node was replaced with a list of nodes.
    #[error("root node was replaced with {count} nodes")]
    RootReplacedWithList { count: usize },

    /// A structural edit did not fit the node's slot table.
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),

    /// A visitor read or wrote state that does not exist.
    #[error("visitor '{visitor}' state error: {source}")]
    State {
        visitor: String,
        #[source]
        source: StateError,
    },

    /// A visitor reported its own failure.
    #[error("visitor '{visitor}' failed: {message}")]
    Visitor { visitor: String, message: String },
}

impl ReduceError {
    /// Convenience constructor for visitor-reported failures.
    pub fn visitor(visitor: impl Into<String>, message: impl Into<String>) -> Self {
        ReduceError::Visitor {
            visitor: visitor.into(),
            message: message.into(),
        }
    }
}

/// Result type for reduction operations.
pub type ReduceResult<T> = Result<T, ReduceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_names_visitor() {
        let err = ReduceError::State {
            visitor: "scopes".to_string(),
            source: StateError::Empty,
        };
        assert_eq!(
            err.to_string(),
            "visitor 'scopes' state error: visitor state stack is empty"
        );
    }

    #[test]
    fn slot_error_bridges() {
        let err: ReduceError = SlotError::RequiredSlotEmptied {
            key: "test".to_string(),
        }
        .into();
        assert!(matches!(err, ReduceError::Slot(_)));
    }
}
