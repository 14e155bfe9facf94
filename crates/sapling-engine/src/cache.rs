//! Per-AST memoization of derived results.
//!
//! Entries are grouped by [`AstGeneration`], so a result computed for one
//! root can never be served for another, even a structurally identical one.
//! Within a generation, entries are keyed by the project's cache identity
//! plus the serialized options that influenced the computation. Call
//! [`Cache::forget`] when a compilation unit is discarded.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use sapling_ast::{Ast, AstGeneration};
use sapling_core::Project;
use serde::Serialize;
use tracing::trace;

/// The lookup key for one cached computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheQuery {
    generation: AstGeneration,
    key: String,
}

impl CacheQuery {
    /// Key a computation over `ast` for `project` with `options`.
    pub fn new<O: Serialize + ?Sized>(
        ast: &Ast,
        project: &Project,
        options: &O,
    ) -> Result<Self, serde_json::Error> {
        Ok(CacheQuery {
            generation: ast.generation(),
            key: format!("{}:{}", project.cache_id(), serde_json::to_string(options)?),
        })
    }

    /// Key a computation that takes no options.
    pub fn without_options(ast: &Ast, project: &Project) -> Self {
        CacheQuery {
            generation: ast.generation(),
            key: project.cache_id().to_string(),
        }
    }

    pub fn generation(&self) -> AstGeneration {
        self.generation
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A concurrent cache of `T` values keyed by [`CacheQuery`].
#[derive(Debug)]
pub struct Cache<T> {
    entries: DashMap<AstGeneration, HashMap<String, Arc<T>>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Cache {
            entries: DashMap::new(),
        }
    }
}

impl<T> Cache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &CacheQuery) -> Option<Arc<T>> {
        let hit = self
            .entries
            .get(&query.generation)
            .and_then(|entries| entries.get(&query.key).cloned());
        trace!(generation = %query.generation, key = %query.key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store `value`, replacing any previous entry, and return it shared.
    pub fn set(&self, query: &CacheQuery, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries
            .entry(query.generation)
            .or_default()
            .insert(query.key.clone(), Arc::clone(&value));
        value
    }

    /// Return the cached value, computing and storing it on a miss.
    pub fn get_or_insert_with(&self, query: &CacheQuery, compute: impl FnOnce() -> T) -> Arc<T> {
        match self.get(query) {
            Some(value) => value,
            None => self.set(query, compute()),
        }
    }

    /// Drop every entry for `generation`. Returns how many were dropped.
    pub fn forget(&self, generation: AstGeneration) -> usize {
        self.entries
            .remove(&generation)
            .map(|(_, entries)| entries.len())
            .unwrap_or(0)
    }

    /// Total number of entries across generations.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
