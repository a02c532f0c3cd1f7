//! The `SemanticChecker` contract consumed by the sv-sema core, plus a
//! `StubChecker` test double.
//!
//! The real expression/statement checker — the thing that actually
//! understands SystemVerilog typing rules — is an external collaborator and
//! deliberately out of scope here. This crate only fixes the *shape*
//! of that collaborator: given a scope and a syntax node, bind it to a
//! semantic value; given a bound expression, reduce it to a constant. The
//! core needs *some* implementation of that shape to exercise lazy cells
//! end-to-end in its own tests, hence `StubChecker`.
//!
//! `SemanticChecker` is generic over the scope type rather than depending on
//! `sv-sema`'s concrete `Scope`, which would make this crate depend on the
//! crate that depends on it. Instead the core's `Scope` implements
//! [`ScopeLookup`] here, and the core is generic over `SemanticChecker<S>`.

mod checker;
mod value;

pub use checker::{ScopeLookup, SemanticChecker, StubChecker};
pub use value::{ConstantValue, Expression, Statement, StatementList, TypeKind, TypeSymbol};
