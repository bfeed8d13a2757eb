//! Terminal rendering of resolution results.

use miette::{Diagnostic, NamedSource, SourceSpan};
use svglink_core::{Desync, Position, SourceRope, TagPath, TextBuffer, Token, TokenSpan};

/// A desync shown against the source file it happened in.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{chain} does not resolve: {desync}")]
#[diagnostic(code(svglink::unresolved))]
pub struct DesyncReport {
    chain: TagPath,
    desync: Desync,
    #[source_code]
    src: NamedSource<String>,
    #[label("walk stopped here")]
    at: Option<SourceSpan>,
    #[help]
    advice: Option<String>,
}

impl DesyncReport {
    pub fn new(name: &str, rope: &SourceRope, chain: TagPath, desync: Desync) -> Self {
        let at = desync.span().and_then(|span| source_span(rope, span));
        let advice = desync.help().map(|help| help.to_string());
        Self {
            chain,
            desync,
            src: NamedSource::new(name, rope.to_string()),
            at,
            advice,
        }
    }

    pub fn desync(&self) -> &Desync {
        &self.desync
    }
}

/// Byte range of a token span.
pub fn source_span(rope: &SourceRope, span: TokenSpan) -> Option<SourceSpan> {
    let start = rope.position_to_char(span.start_position())?;
    let end = rope.position_to_char(span.end_position())?;
    let start_byte = rope.char_to_byte(start);
    let end_byte = rope.char_to_byte(end);
    Some(SourceSpan::new(start_byte.into(), end_byte - start_byte))
}

/// `line:first-last`, 1-based and inclusive.
pub fn human_span(span: TokenSpan) -> String {
    format!("{}:{}-{}", span.line + 1, span.start + 1, span.end)
}

/// One line per resolved tag: `3:6-11 <circle>`.
pub fn located(token: &Token) -> String {
    format!("{} <{}>", human_span(token.span), token.text)
}

/// `line:column`, 1-based.
pub fn human_position(pos: Position) -> String {
    format!("{}:{}", pos.line + 1, pos.column + 1)
}
