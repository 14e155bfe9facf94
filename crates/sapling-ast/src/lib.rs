//! ECMAScript-family syntax trees for sapling.
//!
//! Trees are immutable and structurally shared: every node is held behind a
//! [`NodeRef`] (`Arc<Node>`), and rewriting a tree only rebuilds the spine
//! from a changed node up to the root. Reference identity (`Arc::ptr_eq`) is
//! what tells "unchanged" apart from "structurally equal but rebuilt".
//!
//! # Overview
//!
//! - [`NodeKind`] is a closed enum. Each kind declares its child slots in a
//!   fixed order, each slot being single, optional or a list ([`SlotShape`]).
//! - [`build`] has one constructor function per kind.
//! - [`Ast`] wraps a root with its file path and a [`AstGeneration`] that
//!   identifies the root for caching.
//! - [`Scope`] is the lexical scope resolver consumed by traversal paths.
//!
//! # Quick Start
//!
//! ```
//! use sapling_ast::{build, Ast, Slot};
//!
//! let test = build::reference_identifier("foo".to_string());
//! let body = build::block_statement(vec![]);
//! let stmt = build::if_statement(test, body, None);
//! let ast = Ast::new(build::program(vec![stmt]), "index.js");
//!
//! match ast.root().kind.slot("body") {
//!     Some(Slot::List(items)) => assert_eq!(items.len(), 1),
//!     _ => unreachable!(),
//! }
//! ```

mod ast;
mod comments;
mod node;
pub mod scope;

pub use ast::{Ast, AstGeneration};
pub use comments::{Comment, CommentId};
pub use node::*;
pub use scope::{Binding, BindingKind, Scope, ScopeKind};
