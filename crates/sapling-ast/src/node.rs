//! The node catalogue and its child-slot table.
//!
//! # Child Slots
//!
//! Every kind declares its children in a fixed order. The order is the
//! traversal order used by the reducer, so it is part of the contract:
//!
//! | Shape | Rust type | Holds |
//! |-------|-----------|-------|
//! | [`SlotShape::Single`] | `NodeRef` | exactly one node |
//! | [`SlotShape::Optional`] | `Option<NodeRef>` | zero or one node |
//! | [`SlotShape::List`] | `Vec<NodeRef>` | an ordered list of nodes |
//!
//! The whole catalogue is generated by `define_nodes!`, so adding a kind is a
//! single table entry and every exhaustive match over [`NodeKind`] is checked
//! by the compiler.

use std::fmt;
use std::sync::Arc;

use sapling_core::SourceLocation;
use thiserror::Error;

use crate::comments::Comment;

/// Shared handle to an immutable node. Identity is `Arc::ptr_eq`.
pub type NodeRef = Arc<Node>;

// ============================================================================
// Slots
// ============================================================================

/// How many nodes a child slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotShape {
    Single,
    Optional,
    List,
}

impl SlotShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotShape::Single => "single",
            SlotShape::Optional => "optional",
            SlotShape::List => "list",
        }
    }
}

impl fmt::Display for SlotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a kind's child-slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub shape: SlotShape,
}

/// Borrowed view of a slot's contents.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Single(&'a NodeRef),
    Optional(Option<&'a NodeRef>),
    List(&'a [NodeRef]),
}

impl Slot<'_> {
    pub fn shape(&self) -> SlotShape {
        match self {
            Slot::Single(_) => SlotShape::Single,
            Slot::Optional(_) => SlotShape::Optional,
            Slot::List(_) => SlotShape::List,
        }
    }
}

/// Owned replacement contents for a slot.
#[derive(Debug, Clone)]
pub enum SlotValue {
    Single(NodeRef),
    Optional(Option<NodeRef>),
    List(Vec<NodeRef>),
}

impl SlotValue {
    pub fn shape(&self) -> SlotShape {
        match self {
            SlotValue::Single(_) => SlotShape::Single,
            SlotValue::Optional(_) => SlotShape::Optional,
            SlotValue::List(_) => SlotShape::List,
        }
    }
}

/// Errors from reading or rewriting a slot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The kind has no child slot with this key.
    #[error("{kind} has no child slot '{key}'")]
    UnknownField { kind: &'static str, key: String },

    /// The value does not fit the slot's shape.
    #[error("slot '{key}' is a {expected} slot, got a {found} value")]
    ShapeMismatch {
        key: String,
        expected: SlotShape,
        found: SlotShape,
    },

    /// A required single slot would be left empty.
    #[error("slot '{key}' is required and cannot be emptied")]
    RequiredSlotEmptied { key: String },
}

/// Conversion between a struct field type and the slot views.
pub trait SlotField: Sized {
    const SHAPE: SlotShape;
    fn as_slot(&self) -> Slot<'_>;
    fn from_value(key: &str, value: SlotValue) -> Result<Self, SlotError>;
}

impl SlotField for NodeRef {
    const SHAPE: SlotShape = SlotShape::Single;

    fn as_slot(&self) -> Slot<'_> {
        Slot::Single(self)
    }

    fn from_value(key: &str, value: SlotValue) -> Result<Self, SlotError> {
        match value {
            SlotValue::Single(node) | SlotValue::Optional(Some(node)) => Ok(node),
            SlotValue::Optional(None) => Err(SlotError::RequiredSlotEmptied {
                key: key.to_string(),
            }),
            SlotValue::List(_) => Err(SlotError::ShapeMismatch {
                key: key.to_string(),
                expected: Self::SHAPE,
                found: SlotShape::List,
            }),
        }
    }
}

impl SlotField for Option<NodeRef> {
    const SHAPE: SlotShape = SlotShape::Optional;

    fn as_slot(&self) -> Slot<'_> {
        Slot::Optional(self.as_ref())
    }

    fn from_value(key: &str, value: SlotValue) -> Result<Self, SlotError> {
        match value {
            SlotValue::Single(node) => Ok(Some(node)),
            SlotValue::Optional(node) => Ok(node),
            SlotValue::List(_) => Err(SlotError::ShapeMismatch {
                key: key.to_string(),
                expected: Self::SHAPE,
                found: SlotShape::List,
            }),
        }
    }
}

impl SlotField for Vec<NodeRef> {
    const SHAPE: SlotShape = SlotShape::List;

    fn as_slot(&self) -> Slot<'_> {
        Slot::List(self)
    }

    fn from_value(key: &str, value: SlotValue) -> Result<Self, SlotError> {
        match value {
            SlotValue::List(nodes) => Ok(nodes),
            other => Err(SlotError::ShapeMismatch {
                key: key.to_string(),
                expected: Self::SHAPE,
                found: other.shape(),
            }),
        }
    }
}

// ============================================================================
// Data field types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

// ============================================================================
// Catalogue
// ============================================================================

/// Declares the node catalogue.
///
/// Each entry is `Kind { child: Type, ... } [ data: Type, ... ];` where the
/// bracketed data section is optional. Child types must implement
/// [`SlotField`]. Generates the per-kind structs, [`NodeKind`], its slot
/// table accessors, and one constructor per kind in [`build`].
macro_rules! define_nodes {
    (
        $(
            $(#[$meta:meta])*
            $kind:ident {
                $( $child:ident : $cty:ty ),* $(,)?
            }
            $( [ $( $dfield:ident : $dty:ty ),* $(,)? ] )?
            ;
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $kind {
                $( pub $child: $cty, )*
                $( $( pub $dfield: $dty, )* )?
            }

            impl From<$kind> for NodeKind {
                fn from(value: $kind) -> Self {
                    NodeKind::$kind(value)
                }
            }
        )*

        /// Every node kind of the grammar.
        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeKind {
            $( $kind($kind), )*
        }

        impl NodeKind {
            /// The kind's name, e.g. `IfStatement`.
            pub fn name(&self) -> &'static str {
                match self {
                    $( NodeKind::$kind(_) => stringify!($kind), )*
                }
            }

            /// The kind's child slots in traversal order.
            pub fn fields(&self) -> &'static [Field] {
                match self {
                    $(
                        NodeKind::$kind(_) => {
                            const FIELDS: &[Field] = &[
                                $( Field {
                                    key: stringify!($child),
                                    shape: <$cty as SlotField>::SHAPE,
                                }, )*
                            ];
                            FIELDS
                        }
                    )*
                }
            }

            /// Borrow the contents of the slot named `key`.
            #[allow(unused_variables, clippy::match_single_binding)]
            pub fn slot(&self, key: &str) -> Option<Slot<'_>> {
                match self {
                    $(
                        NodeKind::$kind(inner) => match key {
                            $( stringify!($child) => Some(SlotField::as_slot(&inner.$child)), )*
                            _ => None,
                        },
                    )*
                }
            }

            /// A copy of this kind with the slot named `key` replaced.
            #[allow(unused_variables, unused_mut, unreachable_code, clippy::match_single_binding)]
            pub fn with_slot(&self, key: &str, value: SlotValue) -> Result<NodeKind, SlotError> {
                match self {
                    $(
                        NodeKind::$kind(inner) => {
                            let mut next = inner.clone();
                            match key {
                                $(
                                    stringify!($child) => {
                                        next.$child = <$cty as SlotField>::from_value(key, value)?;
                                    }
                                )*
                                _ => {
                                    return Err(SlotError::UnknownField {
                                        kind: stringify!($kind),
                                        key: key.to_string(),
                                    })
                                }
                            }
                            Ok(NodeKind::$kind(next))
                        }
                    )*
                }
            }
        }

        /// One constructor per node kind. Nodes are built without location
        /// or comments; attach those with [`Node::with_location`] and friends.
        pub mod build {
            use super::*;

            paste::paste! {
                $(
                    #[allow(clippy::too_many_arguments)]
                    pub fn [<$kind:snake>](
                        $( $child: $cty, )*
                        $( $( $dfield: $dty, )* )?
                    ) -> NodeRef {
                        Node::new($kind {
                            $( $child, )*
                            $( $( $dfield, )* )?
                        })
                    }
                )*
            }
        }
    };
}

define_nodes! {
    /// Synthetic parent of a traversal's first path. Never part of a real tree.
    MockParent {};

    Program { body: Vec<NodeRef> };

    BlockStatement { body: Vec<NodeRef> };

    ExpressionStatement { expression: NodeRef };

    IfStatement {
        test: NodeRef,
        consequent: NodeRef,
        alternate: Option<NodeRef>,
    };

    ForStatement {
        init: Option<NodeRef>,
        test: Option<NodeRef>,
        update: Option<NodeRef>,
        body: NodeRef,
    };

    WhileStatement { test: NodeRef, body: NodeRef };

    ReturnStatement { argument: Option<NodeRef> };

    EmptyStatement {};

    VariableDeclaration { declarations: Vec<NodeRef> } [ kind: VariableKind ];

    VariableDeclarator { id: NodeRef, init: Option<NodeRef> };

    FunctionDeclaration {
        id: Option<NodeRef>,
        params: Vec<NodeRef>,
        body: NodeRef,
    };

    ArrowFunctionExpression { params: Vec<NodeRef>, body: NodeRef };

    CallExpression { callee: NodeRef, arguments: Vec<NodeRef> };

    BinaryExpression { left: NodeRef, right: NodeRef } [ operator: String ];

    AssignmentExpression { left: NodeRef, right: NodeRef } [ operator: String ];

    MemberExpression { object: NodeRef, property: NodeRef } [ computed: bool ];

    ArrayExpression { elements: Vec<NodeRef> };

    /// An identifier read as a value.
    ReferenceIdentifier {} [ name: String ];

    /// An identifier that introduces a binding.
    BindingIdentifier {} [ name: String ];

    /// A property name.
    Identifier {} [ name: String ];

    StringLiteral {} [ value: String ];

    NumericLiteral {} [ value: f64 ];

    BooleanLiteral {} [ value: bool ];

    NullLiteral {};
}

impl NodeKind {
    /// Whether entering a node of this kind may introduce a lexical scope.
    pub fn creates_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::Program(_)
                | NodeKind::BlockStatement(_)
                | NodeKind::ForStatement(_)
                | NodeKind::FunctionDeclaration(_)
                | NodeKind::ArrowFunctionExpression(_)
        )
    }

    /// The shape of the slot named `key`, if the kind has one.
    pub fn field_shape(&self, key: &str) -> Option<SlotShape> {
        self.fields()
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.shape)
    }
}

// ============================================================================
// Node
// ============================================================================

/// A syntax tree node: a kind plus positional metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Option<SourceLocation>,
    pub leading_comments: Vec<Comment>,
    pub trailing_comments: Vec<Comment>,
}

impl Node {
    /// Wrap a kind into a fresh node with no location or comments.
    pub fn new(kind: impl Into<NodeKind>) -> NodeRef {
        Arc::new(Node {
            kind: kind.into(),
            loc: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
        })
    }

    /// A synthetic mock parent node.
    pub fn mock_parent() -> NodeRef {
        Node::new(MockParent {})
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.kind, NodeKind::MockParent(_))
    }

    /// A new node with a different kind, keeping location and comments.
    pub fn with_kind(&self, kind: impl Into<NodeKind>) -> NodeRef {
        Arc::new(Node {
            kind: kind.into(),
            loc: self.loc.clone(),
            leading_comments: self.leading_comments.clone(),
            trailing_comments: self.trailing_comments.clone(),
        })
    }

    /// Shallow copy with one child slot replaced.
    pub fn with_slot(&self, key: &str, value: SlotValue) -> Result<NodeRef, SlotError> {
        let kind = self.kind.with_slot(key, value)?;
        Ok(self.with_kind(kind))
    }

    pub fn with_location(&self, loc: SourceLocation) -> NodeRef {
        Arc::new(Node {
            loc: Some(loc),
            ..self.clone()
        })
    }

    pub fn with_leading_comments(&self, comments: Vec<Comment>) -> NodeRef {
        Arc::new(Node {
            leading_comments: comments,
            ..self.clone()
        })
    }

    pub fn with_trailing_comments(&self, comments: Vec<Comment>) -> NodeRef {
        Arc::new(Node {
            trailing_comments: comments,
            ..self.clone()
        })
    }

    /// Name carried by identifier kinds.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::ReferenceIdentifier(id) => Some(&id.name),
            NodeKind::BindingIdentifier(id) => Some(&id.name),
            NodeKind::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sapling_core::Position;

    fn reference(name: &str) -> NodeRef {
        build::reference_identifier(name.to_string())
    }

    mod table_tests {
        use super::*;

        #[test]
        fn fields_are_in_declaration_order() {
            let node = build::for_statement(None, None, None, build::empty_statement());
            let keys: Vec<_> = node.kind.fields().iter().map(|f| f.key).collect();
            assert_eq!(keys, vec!["init", "test", "update", "body"]);
            assert_eq!(node.kind.field_shape("init"), Some(SlotShape::Optional));
            assert_eq!(node.kind.field_shape("body"), Some(SlotShape::Single));
        }

        #[test]
        fn leaves_have_no_fields() {
            assert!(reference("x").kind.fields().is_empty());
            assert!(Node::mock_parent().kind.fields().is_empty());
            assert!(Node::mock_parent().is_mock());
        }

        #[test]
        fn names_match_kinds() {
            assert_eq!(build::null_literal().kind_name(), "NullLiteral");
            assert_eq!(
                build::variable_declaration(vec![], VariableKind::Let).kind_name(),
                "VariableDeclaration"
            );
        }
    }

    mod slot_tests {
        use super::*;

        #[test]
        fn slot_reads_each_shape() {
            let test = reference("x");
            let node = build::if_statement(test.clone(), build::block_statement(vec![]), None);
            match node.kind.slot("test") {
                Some(Slot::Single(found)) => assert!(Arc::ptr_eq(found, &test)),
                other => panic!("unexpected slot {:?}", other),
            }
            assert!(matches!(node.kind.slot("alternate"), Some(Slot::Optional(None))));
            assert!(node.kind.slot("nope").is_none());
        }

        #[test]
        fn with_slot_shares_untouched_children() {
            let test = reference("x");
            let body = build::block_statement(vec![]);
            let node = build::if_statement(test.clone(), body.clone(), None);
            let replaced = node
                .with_slot("test", SlotValue::Single(reference("y")))
                .unwrap();
            match (&replaced.kind, &node.kind) {
                (NodeKind::IfStatement(new), NodeKind::IfStatement(old)) => {
                    assert!(Arc::ptr_eq(&new.consequent, &old.consequent));
                    assert!(!Arc::ptr_eq(&new.test, &old.test));
                    assert_eq!(new.test.identifier_name(), Some("y"));
                }
                _ => unreachable!(),
            }
        }

        #[test]
        fn with_slot_keeps_location() {
            let loc = SourceLocation::new("a.js", Position::new(1, 0), Position::new(1, 9));
            let node = build::expression_statement(reference("a")).with_location(loc.clone());
            let replaced = node
                .with_slot("expression", SlotValue::Single(reference("b")))
                .unwrap();
            assert_eq!(replaced.loc, Some(loc));
        }

        #[test]
        fn list_value_rejected_for_single_slot() {
            let node = build::expression_statement(reference("a"));
            let err = node
                .with_slot("expression", SlotValue::List(vec![]))
                .unwrap_err();
            assert_eq!(
                err,
                SlotError::ShapeMismatch {
                    key: "expression".to_string(),
                    expected: SlotShape::Single,
                    found: SlotShape::List,
                }
            );
        }

        #[test]
        fn required_slot_cannot_be_emptied() {
            let node = build::expression_statement(reference("a"));
            let err = node
                .with_slot("expression", SlotValue::Optional(None))
                .unwrap_err();
            assert!(matches!(err, SlotError::RequiredSlotEmptied { .. }));
        }

        #[test]
        fn optional_slot_accepts_removal() {
            let node = build::return_statement(Some(reference("a")));
            let replaced = node
                .with_slot("argument", SlotValue::Optional(None))
                .unwrap();
            assert!(matches!(replaced.kind.slot("argument"), Some(Slot::Optional(None))));
        }

        #[test]
        fn unknown_key_is_reported() {
            let err = build::empty_statement()
                .with_slot("body", SlotValue::List(vec![]))
                .unwrap_err();
            assert!(matches!(err, SlotError::UnknownField { kind: "EmptyStatement", .. }));
        }
    }
}
