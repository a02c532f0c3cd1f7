//! Internal, non-user-facing errors: arena misuse, checked-downcast
//! mismatch. SystemVerilog-level problems are never represented here — those
//! go to the diagnostic sink via [`crate::symbol::Factory::report`].

use thiserror::Error;

use crate::symbol::SymbolId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("symbol {0:?} does not exist in this factory")]
    InvalidSymbol(SymbolId),

    #[error("symbol {0:?} is not a scope")]
    NotAScope(SymbolId),

    #[error("checked downcast of symbol {id:?} failed: expected {expected}, found {found}")]
    KindMismatch {
        id: SymbolId,
        expected: &'static str,
        found: &'static str,
    },
}
