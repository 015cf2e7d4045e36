//! Source positions shared by the expression/pattern parsers and the I/O
//! cursor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A position in some source text: a byte offset plus 1-based line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Byte offset from the start of the source (0-based).
    pub offset: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based).
    pub column: usize,
}

impl Position {
    /// The position at the very start of a source.
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advances this position past `ch`, updating line/column bookkeeping.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A half-open range `[start, end)` over some source text, with resolved
/// line/column for the start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: usize,
    /// Ending byte offset (exclusive).
    pub end: usize,
    /// Line number of the start position (1-based).
    pub line: usize,
    /// Column number of the start position (1-based).
    pub column: usize,
}

impl Span {
    /// Creates a new span with the given positions.
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Builds a span from a start [`Position`] and an end byte offset.
    pub fn from_position(start: Position, end_offset: usize) -> Self {
        Self {
            start: start.offset,
            end: end_offset,
            line: start.line,
            column: start.column,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
