//! Source location utilities.
//!
//! The core tracks locations as byte [`Span`](crate::Span)s against a file
//! name. This module adds the line/column view diagnostics consumers want,
//! without the core itself ever computing a line number.

use crate::span::Span;

/// A location in a source file: a file name plus a byte span within it.
///
/// An empty `file` with a dummy `span` denotes a synthetic symbol with no
/// source location (per the data model: `location` is empty for synthetic
/// symbols).
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub file: String,
    pub span: Span,
}

impl Location {
    #[must_use]
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }

    /// A location for a synthetic (compiler-generated) symbol.
    #[must_use]
    pub fn synthetic() -> Self {
        Self {
            file: String::new(),
            span: Span::dummy(),
        }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.file.is_empty() && self.span.is_dummy()
    }
}

/// A position in a source file (0-indexed line and UTF-16 column), for
/// presenting a [`Span`] to a human or an LSP-shaped consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A line/column range, the human-readable counterpart of a [`Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Line map for efficient offset -> line/column conversion.
///
/// Stores the starting byte offset of each line so that reporting a
/// diagnostic's human-readable position doesn't require rescanning the file.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a `Position`. Character is a UTF-16 count.
    #[must_use]
    pub fn offset_to_position(&self, offset: u32, source: &str) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = usize::try_from(self.line_starts.get(line).copied().unwrap_or(0))
            .unwrap_or(usize::MAX)
            .min(source.len());
        let clamped_end = usize::try_from(offset).unwrap_or(source.len()).min(source.len());
        let start = line_start.min(clamped_end);
        let slice = source.get(start..clamped_end).unwrap_or("");
        let character = slice
            .chars()
            .map(|ch| u32::try_from(ch.len_utf16()).unwrap_or(u32::MAX))
            .sum();
        Position {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            character,
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
