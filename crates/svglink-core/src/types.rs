//! Core position types: buffer positions, token spans, and selections.
//!
//! Lines and columns are zero-based and counted in chars (Unicode scalar
//! values), matching the offsets used by [`TextBuffer`](crate::TextBuffer).

use std::fmt;
use std::ops::Range;

/// A (line, column) position in a source buffer.
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of the buffer.
    pub fn origin() -> Self {
        Self::default()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The single-line span covered by a token.
///
/// Tokens never cross a line break; the tokenizer splits multi-line text,
/// comments and attribute values into one token per line.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub struct TokenSpan {
    pub line: usize,
    /// First column of the token.
    pub start: usize,
    /// Column just past the token (exclusive).
    pub end: usize,
}

impl TokenSpan {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    pub fn start_position(&self) -> Position {
        Position::new(self.line, self.start)
    }

    pub fn end_position(&self) -> Position {
        Position::new(self.line, self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if this span ends strictly after `pos`.
    pub fn ends_after(&self, pos: Position) -> bool {
        self.line > pos.line || (self.line == pos.line && self.end > pos.column)
    }
}

impl fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.line, self.start, self.end)
    }
}

/// Text selection with anchor and head positions, as char offsets.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the selection length.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Check if empty (same as is_collapsed).
    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.len(), 5);
        assert_eq!(sel.to_range(), 5..10);
    }

    #[test]
    fn test_selection_collapsed() {
        let sel = Selection::collapsed(7);
        assert!(sel.is_collapsed());
        assert!(sel.is_empty());
        assert_eq!(sel.len(), 0);
    }

    #[test]
    fn test_span_ends_after() {
        let span = TokenSpan::new(2, 4, 8);
        assert!(span.ends_after(Position::new(1, 20)));
        assert!(span.ends_after(Position::new(2, 7)));
        assert!(!span.ends_after(Position::new(2, 8)));
        assert!(!span.ends_after(Position::new(3, 0)));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(TokenSpan::new(3, 1, 5).to_string(), "3:1-5");
        assert_eq!(Position::new(0, 9).to_string(), "0:9");
    }
}
