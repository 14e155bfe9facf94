//! Root wrapper carrying file metadata and a generation id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sapling_core::{Integrity, SourceType};

use crate::node::NodeRef;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an AST root.
///
/// Every [`Ast`] built around a root gets a fresh generation. Caches key on
/// it instead of on the root's address, and drop a generation explicitly
/// when its compilation unit is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AstGeneration(u64);

impl AstGeneration {
    fn next() -> Self {
        AstGeneration(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AstGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen_{}", self.0)
    }
}

/// A parsed file: its root node plus the metadata passes stamp onto results.
#[derive(Debug, Clone)]
pub struct Ast {
    root: NodeRef,
    path: String,
    source_type: SourceType,
    integrity: Option<Integrity>,
    generation: AstGeneration,
}

impl Ast {
    pub fn new(root: NodeRef, path: impl Into<String>) -> Self {
        Ast {
            root,
            path: path.into(),
            source_type: SourceType::default(),
            integrity: None,
            generation: AstGeneration::next(),
        }
    }

    /// Build an AST whose integrity stamp is computed from `source`.
    pub fn with_source(root: NodeRef, path: impl Into<String>, source: &str) -> Self {
        Ast {
            integrity: Some(Integrity::of_source(source)),
            ..Ast::new(root, path)
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// The same file with a different root.
    ///
    /// Returns a clone (same generation) when `root` is the current root,
    /// otherwise a new generation.
    pub fn with_root(&self, root: NodeRef) -> Self {
        if Arc::ptr_eq(&root, &self.root) {
            return self.clone();
        }
        Ast {
            root,
            path: self.path.clone(),
            source_type: self.source_type,
            integrity: self.integrity.clone(),
            generation: AstGeneration::next(),
        }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn integrity(&self) -> Option<&Integrity> {
        self.integrity.as_ref()
    }

    pub fn generation(&self) -> AstGeneration {
        self.generation
    }
}
