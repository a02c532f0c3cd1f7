//! Diagnostic types, the core's allocated code table, and an in-process
//! collector.
//!
//! This module plays the role of the "diagnostic sink" consumed interface
//! the core never owns the real sink (that's the downstream
//! diagnostics collaborator, out of scope), but it needs a concrete type to
//! hand diagnostics to while under test and while no real sink is wired up.

pub mod codes;
pub use codes::{diagnostic_message, DiagnosticCode};

use crate::position::Location;
use serde::Serialize;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// A single reported diagnostic.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub category: DiagnosticCategory,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(code: DiagnosticCode, location: Location, args: &[&str]) -> Self {
        Self {
            code,
            category: DiagnosticCategory::Error,
            message: format_message(diagnostic_message(code), args),
            location,
        }
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, … with args.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Append-only collector of diagnostics for a single compilation.
///
/// Single-threaded; this is a plain `Vec`, not a channel or a
/// concurrent collection. Embedders that need the real sink wrap or drain
/// this collector rather than the core depending on their sink type
/// directly.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, code: DiagnosticCode, location: Location, args: &[&str]) {
        self.reports.push(Diagnostic::new(code, location, args));
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.reports
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }
}
