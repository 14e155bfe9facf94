//! Traversal paths.
//!
//! A [`Path`] is a node plus where the traversal found it: its parent path,
//! the slot key and list index it came from, and the lexical scope in
//! effect. Paths are cheap to clone (`Arc`) and form a linked list toward
//! the root, so ancestry is walked nearest-first without copying.
//!
//! The first path of a traversal is parented to a synthetic mock path, which
//! makes [`Path::parent_node`] total.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use sapling_ast::{Node, NodeKind, NodeRef, Scope, Slot};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of a traversal frame.
///
/// Visitor state frames are tagged with the token of the path that pushed
/// them. A fork keeps its original's token: replacing a node does not start
/// a new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathToken(u64);

impl PathToken {
    fn next() -> Self {
        PathToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Options fixed for a whole traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Never evaluate scopes; every path sees the scope it was rooted with.
    pub no_scope_creation: bool,
}

#[derive(Clone)]
pub struct Path {
    inner: Arc<PathInner>,
}

struct PathInner {
    node: NodeRef,
    parent: Option<Path>,
    scope: OnceLock<Option<Arc<Scope>>>,
    field_key: Option<&'static str>,
    list_index: Option<usize>,
    token: PathToken,
    is_mock: bool,
    options: PathOptions,
}

impl Path {
    /// The first path of a traversal over `node`.
    ///
    /// `scope` is the scope enclosing `node`. When it is `None` and `node` is
    /// a program, the program scope is created on first access.
    pub fn root(node: NodeRef, scope: Option<Arc<Scope>>, options: PathOptions) -> Path {
        let mock = Path {
            inner: Arc::new(PathInner {
                node: Node::mock_parent(),
                parent: None,
                scope: OnceLock::from(scope),
                field_key: None,
                list_index: None,
                token: PathToken::next(),
                is_mock: true,
                options,
            }),
        };
        mock.make_child(node, None, None)
    }

    fn make_child(&self, node: NodeRef, key: Option<&'static str>, index: Option<usize>) -> Path {
        Path {
            inner: Arc::new(PathInner {
                node,
                parent: Some(self.clone()),
                scope: OnceLock::new(),
                field_key: key,
                list_index: index,
                token: PathToken::next(),
                is_mock: false,
                options: self.inner.options,
            }),
        }
    }

    /// Path for `node` found in the single or optional slot `key`.
    pub fn child(&self, key: &'static str, node: NodeRef) -> Path {
        self.make_child(node, Some(key), None)
    }

    /// Path for `node` found at `index` of the list slot `key`.
    pub fn child_at(&self, key: &'static str, index: usize, node: NodeRef) -> Path {
        self.make_child(node, Some(key), Some(index))
    }

    /// Path of the node currently held in the single or optional slot `key`.
    pub fn child_path(&self, key: &str) -> Option<Path> {
        let key = self.static_key(key)?;
        match self.node().kind.slot(key)? {
            Slot::Single(node) | Slot::Optional(Some(node)) => Some(self.child(key, node.clone())),
            _ => None,
        }
    }

    /// Paths of the nodes currently held in the list slot `key`.
    pub fn child_paths(&self, key: &str) -> Vec<Path> {
        let Some(key) = self.static_key(key) else {
            return Vec::new();
        };
        match self.node().kind.slot(key) {
            Some(Slot::List(items)) => items
                .iter()
                .enumerate()
                .map(|(index, node)| self.child_at(key, index, node.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn static_key(&self, key: &str) -> Option<&'static str> {
        self.node()
            .kind
            .fields()
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.key)
    }

    /// The same position holding a different node.
    ///
    /// Keeps ancestry, slot key, list index and token. A scope this path
    /// already resolved is carried over; an unresolved one stays unresolved.
    pub fn fork(&self, node: NodeRef) -> Path {
        let scope = match self.inner.scope.get() {
            Some(resolved) => OnceLock::from(resolved.clone()),
            None => OnceLock::new(),
        };
        Path {
            inner: Arc::new(PathInner {
                node,
                parent: self.inner.parent.clone(),
                scope,
                field_key: self.inner.field_key,
                list_index: self.inner.list_index,
                token: self.inner.token,
                is_mock: self.inner.is_mock,
                options: self.inner.options,
            }),
        }
    }

    pub fn node(&self) -> &NodeRef {
        &self.inner.node
    }

    pub fn parent_path(&self) -> Option<&Path> {
        self.inner.parent.as_ref()
    }

    /// The parent's node. For the mock path this is its own node.
    pub fn parent_node(&self) -> &NodeRef {
        match &self.inner.parent {
            Some(parent) => parent.node(),
            None => self.node(),
        }
    }

    /// Whether this is the first path of a traversal.
    pub fn is_root(&self) -> bool {
        self.parent_path().is_some_and(Path::is_mock)
    }

    pub fn is_mock(&self) -> bool {
        self.inner.is_mock
    }

    pub fn field_key(&self) -> Option<&'static str> {
        self.inner.field_key
    }

    pub fn list_index(&self) -> Option<usize> {
        self.inner.list_index
    }

    pub fn token(&self) -> PathToken {
        self.inner.token
    }

    /// Ancestor paths, nearest first, excluding the mock path.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry {
            next: self.parent_path(),
        }
    }

    /// Nearest ancestor whose path satisfies `predicate`.
    pub fn find_ancestry(&self, predicate: impl Fn(&Path) -> bool) -> Option<&Path> {
        self.ancestry().find(|path| predicate(path))
    }

    /// Number of real ancestors.
    pub fn depth(&self) -> usize {
        self.ancestry().count()
    }

    /// The lexical scope in effect at this node, evaluated on first access.
    pub fn scope(&self) -> Option<&Arc<Scope>> {
        self.inner
            .scope
            .get_or_init(|| self.resolve_scope())
            .as_ref()
    }

    fn resolve_scope(&self) -> Option<Arc<Scope>> {
        let parent_scope = self.parent_path().and_then(|parent| parent.scope().cloned());
        if self.inner.options.no_scope_creation || !self.node().kind.creates_scope() {
            return parent_scope;
        }
        match parent_scope {
            Some(scope) => Some(scope.enter_evaluate(self.node(), self.parent_node())),
            None if matches!(self.node().kind, NodeKind::Program(_)) => {
                Some(Scope::root(self.node()))
            }
            None => None,
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("node", &self.node().kind_name())
            .field("key", &self.inner.field_key)
            .field("index", &self.inner.list_index)
            .field("token", &self.inner.token)
            .field("depth", &self.depth())
            .finish()
    }
}

/// Iterator over a path's ancestors, nearest first.
pub struct Ancestry<'a> {
    next: Option<&'a Path>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a Path;

    fn next(&mut self) -> Option<&'a Path> {
        let current = self.next.filter(|path| !path.is_mock())?;
        self.next = current.parent_path();
        Some(current)
    }
}
