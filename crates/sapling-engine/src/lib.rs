//! Visitor-driven tree rewriting for sapling syntax trees.
//!
//! A pass walks an immutable tree depth-first and lets an ordered set of
//! visitors keep, remove, replace or expand nodes on the way in and out.
//! Only the spine from an edited node up to the root is rebuilt: every
//! untouched subtree of the result is the same `Arc` as in the input, and a
//! pass that changes nothing returns the input root itself.
//!
//! # Architecture
//!
//! - [`Signal`]: what a visitor hook asks for
//! - [`Path`]: a node plus its position, ancestry and lexical scope
//! - [`VisitorState`]: per-visitor state scoped to the current branch
//! - [`Reducer`]: the traversal itself
//! - [`Context`]: per-pass diagnostics, suppressions, lint decisions and records
//! - [`Cache`]: per-AST memoization keyed by project and options
//!
//! # Error Handling
//!
//! Findings about the code are diagnostics and never stop a pass. A visitor
//! that breaks the engine's rules, for example by returning a list
//! replacement for a node outside a list slot, aborts it with a
//! [`ReduceError`].

pub mod cache;
pub mod context;
pub mod error;
pub mod lint_decisions;
pub mod path;
pub mod records;
pub mod reduce;
pub mod signal;
mod splice;
pub mod suppressions;
pub mod visitor;
pub mod visitor_state;

pub use cache::{Cache, CacheQuery};
pub use context::{
    Context, ContextOptions, DiagnosticOutcome, FixableDiagnostic, PassResult, Suggestion,
};
pub use error::{ReduceError, ReduceResult, StateError};
pub use lint_decisions::{LintDecision, LintDecisionAction, LintDecisions, PendingSuppression};
pub use path::{Ancestry, Path, PathOptions, PathToken};
pub use records::Records;
pub use reduce::{reduce_node, ReducedNode, Reducer};
pub use signal::Signal;
pub use suppressions::{Suppression, SuppressionParser};
pub use visitor::{Hook, Visitor, VisitorSet};
pub use visitor_state::VisitorState;
