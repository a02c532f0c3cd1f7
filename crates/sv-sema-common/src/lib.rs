//! Common types and utilities for the sv-sema semantic core.
//!
//! This crate provides foundational types shared by every crate in the
//! workspace:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`, `Spanned`, `SpanBuilder`, `ByteSpan`)
//! - Line/column positions for diagnostics (`Position`, `Range`, `Location`)
//! - Centralised limits and thresholds (`limits`)
//! - Diagnostic types and the core's allocated code table (`diagnostics`)

// String interning for symbol-name deduplication.
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets).
pub mod span;
pub use span::{ByteSpan, Span, SpanBuilder, Spanned};

// Position/Range types for line/column source locations.
pub mod position;
pub use position::{Location, LineMap, Position, Range};

// Centralized limits and thresholds.
pub mod limits;

// Diagnostic types, codes, and the in-process collector.
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticCode, Diagnostics};
