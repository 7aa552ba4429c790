//! Source location tracking for tokens, nodes, and diagnostics.

use std::fmt;
use std::sync::Arc;

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// A human-oriented position inside a template or an expression.
///
/// The source text is shared, so cloning a location is cheap. `line` and
/// `position` are both 1-based; `position` counts characters from the start
/// of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    source: Arc<str>,
    /// Line number (1-based).
    pub line: usize,
    /// Column of the first character (1-based).
    pub position: usize,
}

impl Location {
    /// Resolves a byte offset inside `source` into a line/column location.
    #[must_use]
    pub fn at(source: &Arc<str>, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let position = source[line_start..offset].chars().count() + 1;
        Self {
            source: Arc::clone(source),
            line,
            position,
        }
    }

    /// Returns the full source text this location points into.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>:{}:{}", self.source, self.line, self.position)
    }
}
