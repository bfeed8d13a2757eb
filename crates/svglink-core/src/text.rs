//! Text buffer abstraction for the source side of a preview.
//!
//! The `TextBuffer` trait is what a session edits and what resolved token
//! spans are converted back into. `SourceRope` is the ropey-backed default.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

use crate::types::{Position, Selection, TokenSpan};

/// A text buffer that supports editing and line/column conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in bytes (UTF-8).
    fn len_bytes(&self) -> usize;

    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Convert char offset to byte offset.
    fn char_to_byte(&self, char_offset: usize) -> usize;

    /// Number of lines. An empty buffer has one (empty) line.
    fn len_lines(&self) -> usize;

    /// Char offset of the first char of `line`. None if out of bounds.
    fn line_to_char(&self, line: usize) -> Option<usize>;

    /// Length of `line` in chars, excluding its line break.
    fn line_len_chars(&self, line: usize) -> Option<usize>;

    /// Line containing a char offset. None if past the end.
    fn char_to_line(&self, char_offset: usize) -> Option<usize>;

    /// Convert a (line, column) position to a char offset.
    ///
    /// A column equal to the line length (end of line) is valid.
    fn position_to_char(&self, pos: Position) -> Option<usize> {
        let start = self.line_to_char(pos.line)?;
        let len = self.line_len_chars(pos.line)?;
        (pos.column <= len).then_some(start + pos.column)
    }

    /// Convert a char offset to a (line, column) position.
    fn char_to_position(&self, char_offset: usize) -> Option<Position> {
        let line = self.char_to_line(char_offset)?;
        let start = self.line_to_char(line)?;
        Some(Position::new(line, char_offset - start))
    }

    /// Selection covering a token span, anchored at its start.
    fn span_to_selection(&self, span: TokenSpan) -> Option<Selection> {
        let anchor = self.position_to_char(span.start_position())?;
        let head = self.position_to_char(span.end_position())?;
        Some(Selection::new(anchor, head))
    }
}

/// Ropey-backed text buffer.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Debug, Default)]
pub struct SourceRope {
    rope: ropey::Rope,
}

impl SourceRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl TextBuffer for SourceRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset)
    }

    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_to_char(&self, line: usize) -> Option<usize> {
        if line >= self.rope.len_lines() {
            return None;
        }
        Some(self.rope.line_to_char(line))
    }

    fn line_len_chars(&self, line: usize) -> Option<usize> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        // Strip "\n" or "\r\n".
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        Some(len)
    }

    fn char_to_line(&self, char_offset: usize) -> Option<usize> {
        if char_offset > self.rope.len_chars() {
            return None;
        }
        Some(self.rope.char_to_line(char_offset))
    }
}

impl From<&str> for SourceRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for SourceRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
