//! Minimal syntax-tree interface consumed by the sv-sema semantic core.
//!
//! The real lexer/parser is an external collaborator, explicitly out of
//! scope for this core. This crate is *not* that parser — it is the
//! smallest typed stand-in for "a read-only tree of syntax nodes" that
//! lets the core, and its own test suite, exist without one: an
//! index-addressed arena of nodes, read-only from the binder's point of
//! view, that the binder walks by kind.
//!
//! Node payloads are a typed enum ([`SyntaxNodeData`]) rather than a
//! generic "kind + untyped fields" record, because without a real parser
//! behind it there is no benefit to stringly/dynamically-typed node data —
//! the typed accessors below (`get_module`, `get_param_decl`, …) return the
//! already-narrowed payload for each kind instead of an untyped field bag.

mod node;
pub mod builder;

pub use node::{
    BinaryOp, DataTypeKind, DefinitionSyntax, InstanceNameSyntax, NodeIndex, NodeList,
    ParamAssignSyntax, SyntaxKind, SyntaxNode, SyntaxNodeData, SyntaxTree,
};
