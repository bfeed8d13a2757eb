//! Token-stream access for the path walker.
//!
//! A `TokenSource` hands out a cursor positioned at a buffer position; the
//! cursor only moves forward. This mirrors line-oriented editor lexers, which
//! cannot cheaply restore an arbitrary earlier state.

use crate::dialect::MarkupDialect;
use crate::text::TextBuffer;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::types::Position;

/// Forward-only position in a token stream.
pub trait TokenCursor {
    /// Token currently under the cursor.
    fn token(&self) -> &Token;

    /// Move to the next token. Returns false (without moving) at end of input.
    fn advance(&mut self) -> bool;
}

/// Anything that can produce a token cursor.
pub trait TokenSource {
    type Cursor<'a>: TokenCursor
    where
        Self: 'a;

    /// Cursor on the first token that ends after `pos`.
    ///
    /// None if no such token exists (empty or exhausted input).
    fn cursor_at(&self, pos: Position) -> Option<Self::Cursor<'_>>;
}

/// Lazily tokenizing cursor.
#[derive(Debug, Clone)]
pub struct StreamCursor {
    tokens: Tokenizer,
    current: Token,
}

impl StreamCursor {
    /// Start a cursor at `pos`, tokenizing only as far as needed.
    pub fn start(mut tokens: Tokenizer, pos: Position) -> Option<Self> {
        let current = tokens.by_ref().find(|t| t.span.ends_after(pos))?;
        Some(Self { tokens, current })
    }
}

impl TokenCursor for StreamCursor {
    fn token(&self) -> &Token {
        &self.current
    }

    fn advance(&mut self) -> bool {
        match self.tokens.next() {
            Some(token) => {
                self.current = token;
                true
            }
            None => false,
        }
    }
}

/// Cursor over an already tokenized slice.
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> SliceCursor<'a> {
    pub fn start(tokens: &'a [Token], pos: Position) -> Option<Self> {
        let index = tokens.iter().position(|t| t.span.ends_after(pos))?;
        Some(Self { tokens, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl TokenCursor for SliceCursor<'_> {
    fn token(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) -> bool {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }
}

/// Plain text, tokenized with SVG rules.
impl TokenSource for str {
    type Cursor<'a> = StreamCursor;

    fn cursor_at(&self, pos: Position) -> Option<StreamCursor> {
        StreamCursor::start(Tokenizer::new(self), pos)
    }
}

impl TokenSource for [Token] {
    type Cursor<'a> = SliceCursor<'a>;

    fn cursor_at(&self, pos: Position) -> Option<SliceCursor<'_>> {
        SliceCursor::start(self, pos)
    }
}

/// A text buffer viewed as tokens of a given dialect.
#[derive(Debug, Clone, Copy)]
pub struct BufferTokens<'b, B: ?Sized> {
    buffer: &'b B,
    dialect: MarkupDialect,
}

impl<'b, B: TextBuffer + ?Sized> BufferTokens<'b, B> {
    pub fn new(buffer: &'b B, dialect: MarkupDialect) -> Self {
        Self { buffer, dialect }
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }
}

impl<B: TextBuffer + ?Sized> TokenSource for BufferTokens<'_, B> {
    type Cursor<'a>
        = StreamCursor
    where
        Self: 'a;

    fn cursor_at(&self, pos: Position) -> Option<StreamCursor> {
        let tokens = Tokenizer::new(&self.buffer.to_string()).with_dialect(self.dialect);
        StreamCursor::start(tokens, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MarkupDialect;
    use crate::text::SourceRope;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_stream_cursor_advances_to_end() {
        let mut cursor = "<a/>".cursor_at(Position::origin()).unwrap();
        assert_eq!(cursor.token().text, "<");
        assert!(cursor.advance());
        assert_eq!(cursor.token().text, "a");
        assert!(cursor.advance());
        assert_eq!(cursor.token().text, "/>");
        assert!(!cursor.advance());
        // No move past the end.
        assert_eq!(cursor.token().text, "/>");
    }

    #[test]
    fn test_cursor_at_position() {
        let source = "<svg>\n  <g/>\n</svg>";
        let cursor = source.cursor_at(Position::new(1, 3)).unwrap();
        assert_eq!(cursor.token().text, "g");

        let tokens = tokenize(source, MarkupDialect::Svg);
        let cursor = tokens.cursor_at(Position::new(1, 3)).unwrap();
        assert_eq!(cursor.token().text, "g");
        assert_eq!(cursor.index(), 5);
    }

    #[test]
    fn test_empty_source_has_no_cursor() {
        assert!("".cursor_at(Position::origin()).is_none());
        let tokens: Vec<Token> = Vec::new();
        assert!(tokens.cursor_at(Position::origin()).is_none());
        assert!("<a/>".cursor_at(Position::new(5, 0)).is_none());
    }

    #[test]
    fn test_buffer_tokens() {
        let rope = SourceRope::from_str("<div><br><p/></div>");
        let source = BufferTokens::new(&rope, MarkupDialect::Html);
        let mut cursor = source.cursor_at(Position::origin()).unwrap();
        while cursor.token().text != "p" {
            assert!(cursor.advance());
        }
        assert_eq!(cursor.token().depth, 1);
    }
}
