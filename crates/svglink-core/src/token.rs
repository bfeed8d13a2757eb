//! Lexical tokens as seen by the path walker.

use std::fmt;

use smol_str::SmolStr;

use crate::types::TokenSpan;

/// Classification of a token.
///
/// The walker only looks at `TagName` and `TagBracket`; everything else is
/// skipped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<`, `</`, `>` or `/>`
    TagBracket,
    /// Name of an opening or closing tag
    TagName,
    AttributeName,
    /// `=` between an attribute name and its value
    Equals,
    /// Quoted attribute value, quotes included
    AttributeValue,
    Text,
    Whitespace,
    Comment,
    CData,
    /// XML declaration, processing instruction or doctype
    Meta,
    /// Stray or unmatched markup
    Error,
}

/// One token of the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token (one line at most).
    pub text: SmolStr,
    /// Set only on the name token of an opening tag.
    pub open_tag_name: Option<SmolStr>,
    /// Number of open ancestor tags after this token was consumed.
    ///
    /// An opening tag's `>` already counts the tag itself, so its depth equals
    /// the depth of the tag's children. A closing tag's `>` has already popped.
    pub depth: usize,
    pub span: TokenSpan,
}

impl Token {
    /// True if this is the name token of an opening tag.
    pub fn is_open_tag(&self) -> bool {
        self.kind == TokenKind::TagName && self.open_tag_name.is_some()
    }

    pub fn is_tag_bracket(&self) -> bool {
        self.kind == TokenKind::TagBracket
    }

    /// True for the `/>` that ends a self-closing tag.
    pub fn is_self_closing(&self) -> bool {
        self.kind == TokenKind::TagBracket && self.text == "/>"
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?} depth={}",
            self.span,
            self.kind,
            self.text.as_str(),
            self.depth
        )?;
        if self.open_tag_name.is_some() {
            f.write_str(" open")?;
        }
        Ok(())
    }
}
