//! The diagnostic codes surfaced by the semantic core.
//!
//! Exact code identifiers are allocated by the diagnostics collaborator in a
//! full build; this crate allocates a private, stable `u32` per code so the
//! core and its tests have something concrete to assert against. The range
//! starts at 4000 purely as a local convention, to avoid visual confusion
//! with any downstream code range — it carries no other significance.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum DiagnosticCode {
    UndeclaredIdentifier = 4000,
    DuplicateDefinition = 4001,
    MissingPackage = 4002,
    MissingImportedMember = 4003,
    CyclicDependency = 4004,
    ParamOverrideOfLocal = 4005,
    MissingRequiredParameter = 4006,
    GenerateLoopNonTerminating = 4007,
    GenerateLoopTooManyIterations = 4008,
    KindMismatch = 4009,
}

impl DiagnosticCode {
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Look up the message template for a diagnostic code.
///
/// Returns a template string with `{0}`, `{1}`, … placeholders; use
/// [`super::format_message`] to fill them in.
#[must_use]
pub const fn diagnostic_message(code: DiagnosticCode) -> &'static str {
    use DiagnosticCode::*;
    match code {
        UndeclaredIdentifier => "Undeclared identifier '{0}'.",
        DuplicateDefinition => "Duplicate definition of '{0}'.",
        MissingPackage => "Package '{0}' does not exist.",
        MissingImportedMember => "Package '{0}' has no member named '{1}'.",
        CyclicDependency => "'{0}' depends on itself through a cycle.",
        ParamOverrideOfLocal => "Cannot override local parameter '{0}'.",
        MissingRequiredParameter => "Parameter '{0}' has no default and was not assigned.",
        GenerateLoopNonTerminating => "Generate loop condition does not depend on '{0}'.",
        GenerateLoopTooManyIterations => "Generate loop exceeded the maximum of {0} iterations.",
        KindMismatch => "Expected a symbol of kind '{0}' but found '{1}'.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_message() {
        let codes = [
            DiagnosticCode::UndeclaredIdentifier,
            DiagnosticCode::DuplicateDefinition,
            DiagnosticCode::MissingPackage,
            DiagnosticCode::MissingImportedMember,
            DiagnosticCode::CyclicDependency,
            DiagnosticCode::ParamOverrideOfLocal,
            DiagnosticCode::MissingRequiredParameter,
            DiagnosticCode::GenerateLoopNonTerminating,
            DiagnosticCode::GenerateLoopTooManyIterations,
            DiagnosticCode::KindMismatch,
        ];
        for code in codes {
            assert!(!diagnostic_message(code).is_empty());
        }
    }

    #[test]
    fn codes_start_at_4000() {
        assert_eq!(DiagnosticCode::UndeclaredIdentifier.code(), 4000);
    }
}
