//! Lexical scopes.
//!
//! Traversal paths resolve scopes lazily: a path's scope is its parent's
//! scope unless its node introduces a new one, in which case the parent
//! scope's [`Scope::enter_evaluate`] is asked for the child scope.
//!
//! # Scoping Rules
//!
//! - **Program**: top-level declarations of the file
//! - **Function**: parameters plus the declarations of the function body.
//!   The body block does not open a second scope.
//! - **Block**: `let`, `const`, `var` and function declarations directly in
//!   the block (no `var` hoisting out of nested blocks)
//! - **Loop**: declarations in a `for` initializer

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::node::{NodeKind, NodeRef, VariableKind};

/// The kind of construct that opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
    Loop,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Program => "program",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::Loop => "loop",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Param,
}

impl From<VariableKind> for BindingKind {
    fn from(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Var => BindingKind::Var,
            VariableKind::Let => BindingKind::Let,
            VariableKind::Const => BindingKind::Const,
        }
    }
}

/// A name declared in a scope.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    /// The declaring identifier node.
    pub node: NodeRef,
}

/// A lexical scope. Shared as `Arc<Scope>`; parents are reachable, children are not.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    node: Option<NodeRef>,
    parent: Option<Arc<Scope>>,
    bindings: HashMap<String, Binding>,
}

impl Scope {
    /// The scope of a whole program.
    pub fn root(program: &NodeRef) -> Arc<Scope> {
        let mut scope = Scope {
            kind: ScopeKind::Program,
            node: Some(program.clone()),
            parent: None,
            bindings: HashMap::new(),
        };
        if let NodeKind::Program(p) = &program.kind {
            scope.declare_statements(&p.body);
        }
        Arc::new(scope)
    }

    /// Evaluate the scope introduced by `node`, whose parent is `parent`.
    ///
    /// Returns `self` unchanged when `node` does not open a scope, including a
    /// function body block, which shares its function's scope.
    pub fn enter_evaluate(self: &Arc<Self>, node: &NodeRef, parent: &NodeRef) -> Arc<Scope> {
        let mut child = match &node.kind {
            NodeKind::FunctionDeclaration(_) | NodeKind::ArrowFunctionExpression(_) => {
                self.child(ScopeKind::Function, node)
            }
            NodeKind::BlockStatement(_) => {
                let is_function_body = matches!(
                    parent.kind,
                    NodeKind::FunctionDeclaration(_) | NodeKind::ArrowFunctionExpression(_)
                );
                if is_function_body {
                    return Arc::clone(self);
                }
                self.child(ScopeKind::Block, node)
            }
            NodeKind::ForStatement(_) => self.child(ScopeKind::Loop, node),
            NodeKind::Program(_) => return Scope::root(node),
            _ => return Arc::clone(self),
        };

        match &node.kind {
            NodeKind::FunctionDeclaration(func) => {
                child.declare_params(&func.params);
                if let NodeKind::BlockStatement(body) = &func.body.kind {
                    child.declare_statements(&body.body);
                }
            }
            NodeKind::ArrowFunctionExpression(arrow) => {
                child.declare_params(&arrow.params);
                if let NodeKind::BlockStatement(body) = &arrow.body.kind {
                    child.declare_statements(&body.body);
                }
            }
            NodeKind::BlockStatement(block) => child.declare_statements(&block.body),
            NodeKind::ForStatement(for_stmt) => {
                if let Some(init) = &for_stmt.init {
                    child.declare_statement(init);
                }
            }
            _ => {}
        }
        Arc::new(child)
    }

    fn child(self: &Arc<Self>, kind: ScopeKind, node: &NodeRef) -> Scope {
        Scope {
            kind,
            node: Some(node.clone()),
            parent: Some(Arc::clone(self)),
            bindings: HashMap::new(),
        }
    }

    fn declare_statements(&mut self, statements: &[NodeRef]) {
        for statement in statements {
            self.declare_statement(statement);
        }
    }

    fn declare_statement(&mut self, statement: &NodeRef) {
        match &statement.kind {
            NodeKind::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    if let NodeKind::VariableDeclarator(d) = &declarator.kind {
                        self.declare(&d.id, decl.kind.into());
                    }
                }
            }
            NodeKind::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    self.declare(id, BindingKind::Function);
                }
            }
            _ => {}
        }
    }

    fn declare_params(&mut self, params: &[NodeRef]) {
        for param in params {
            self.declare(param, BindingKind::Param);
        }
    }

    fn declare(&mut self, id: &NodeRef, kind: BindingKind) {
        if let Some(name) = id.identifier_name() {
            self.bindings.entry(name.to_string()).or_insert(Binding {
                name: name.to_string(),
                kind,
                node: id.clone(),
            });
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// The node that opened this scope.
    pub fn node(&self) -> Option<&NodeRef> {
        self.node.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    /// Binding declared directly in this scope.
    pub fn get_own_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Binding visible from this scope, searching enclosing scopes outwards.
    pub fn get_binding(&self, name: &str) -> Option<&Binding> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(binding) = current.bindings.get(name) {
                return Some(binding);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.get_binding(name).is_some()
    }

    /// Number of enclosing scopes.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.parent.as_deref();
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent.as_deref();
        }
        depth
    }
}
