//! Semantic-analysis core for a SystemVerilog front end.
//!
//! This crate owns the symbol graph and everything needed to walk it:
//!
//! - [`arena::Factory`] - the arena: every symbol, the interner, the
//!   diagnostic sink, and the flat Definition/package registries.
//! - [`symbol`] - the closed `SymbolKind` set and each kind's payload data.
//! - [`scope`] - lazy scope construction (`ensure_init`/`fill_members`) and
//!   `MemberBuilder`.
//! - [`lookup`] - the five-mode lookup engine and `ScopeRef`, the
//!   `sv-sema-checker::ScopeLookup` impl handed to the external checker.
//! - [`lazy`] - lazy binding cells for constants, types, and statement
//!   bodies.
//! - [`imports`] - explicit, wildcard, and implicit import resolution.
//! - [`definition`]/[`instance`] - module/interface/program definitions and
//!   their hierarchical instantiation, including parameter elaboration.
//! - [`generate`] - if-generate and loop-generate elaboration.
//! - [`root`] - the design root, compilation units, packages, and dynamic
//!   scopes.
//!
//! Binding and constant evaluation themselves are not this crate's concern:
//! callers supply a `sv_sema_checker::SemanticChecker` implementation, and
//! this crate calls into it at the points where symbol construction needs
//! an expression bound or a type resolved.

mod arena;
mod definition;
mod error;
mod generate;
mod imports;
mod instance;
mod lazy;
mod lookup;
mod root;
mod scope;
mod symbol;

pub use arena::Factory;
pub use error::CoreError;
pub use generate::ElaborationOptions;
pub use lookup::{LookupMode, ScopeRef};
pub use root::{create_dynamic_scope, create_root};
pub use scope::{MemberBuilder, ScopeData, ScopeState};
pub use symbol::{ParameterData, SymbolId, SymbolKind, SymbolPayload, SymbolRecord};
