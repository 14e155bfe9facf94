//! Sapling: a structurally shared tree-rewrite engine for ECMAScript syntax trees.
//!
//! Passes are sets of visitors that keep, remove, replace or expand nodes as
//! a depth-first traversal enters and leaves them. The engine rebuilds only
//! the spine above an edit, gates diagnostics through comment suppressions
//! and lint decisions, and memoizes derived results per AST.

// Shared value types and configuration - re-exported from sapling-core
pub use sapling_core::config;
pub use sapling_core::diagnostics;
pub use sapling_core::types;

// Syntax tree model - re-exported from sapling-ast
pub use sapling_ast as ast;

// Traversal engine - re-exported from sapling-engine
pub use sapling_engine::cache;
pub use sapling_engine::context;
pub use sapling_engine::error;
pub use sapling_engine::lint_decisions;
pub use sapling_engine::path;
pub use sapling_engine::records;
pub use sapling_engine::reduce;
pub use sapling_engine::signal;
pub use sapling_engine::suppressions;
pub use sapling_engine::visitor;
pub use sapling_engine::visitor_state;

pub use sapling_core::{Project, ProjectConfig};
pub use sapling_engine::{
    Context, ContextOptions, PassResult, Path, ReduceError, ReduceResult, Signal, Visitor,
    VisitorSet, VisitorState,
};
