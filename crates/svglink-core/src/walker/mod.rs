//! Token path walker: resolve an ancestor chain against a token stream.
//!
//! The walk is a single forward pass. It finds the root's opening tag, then
//! for each chain step moves to the `>` that ends the current opening tag
//! (whose depth is the depth of the tag's children) and counts opening tags
//! at exactly that depth until it reaches the requested child. A depth below
//! the target level means the parent closed first.
//!
//! For example, in
//!
//! ```text
//! <A>
//!     <B><C/></B>
//!     <B><C/><C/></B>
//! </A>
//! ```
//!
//! the middle `C` is `B[1]/C[0]`.

use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::chain::TagPath;
use crate::cursor::{TokenCursor, TokenSource};
use crate::dialect::MarkupDialect;
use crate::error::Desync;
use crate::token::Token;
use crate::types::{Position, TokenSpan};


/// Outcome of one lookup: the name token of the matched opening tag.
pub type Resolution = Result<Token, Desync>;

/// Resolve `chain` with SVG name rules.
pub fn find_tag<S: TokenSource + ?Sized>(source: &S, chain: &TagPath) -> Resolution {
    find_tag_in(source, chain, MarkupDialect::Svg)
}

/// Resolve `chain` against `source`, comparing names with `dialect` rules.
pub fn find_tag_in<S: TokenSource + ?Sized>(
    source: &S,
    chain: &TagPath,
    dialect: MarkupDialect,
) -> Resolution {
    let cursor = source
        .cursor_at(Position::origin())
        .ok_or(Desync::RootNotFound)?;
    let mut walker = PathWalker { cursor };

    if !walker.seek_root() {
        return Err(Desync::RootNotFound);
    }
    debug!(
        target: "svglink::walker",
        root = %walker.token().text,
        %chain,
        "found root tag"
    );

    for step in chain {
        let parent = walker.tag_name();

        let target_level = match walker.goto_end_of_open_tag() {
            OpenTagEnd::Children(level) => level,
            OpenTagEnd::SelfClosing(at) => {
                return Err(Desync::LeafHasNoChildren {
                    parent,
                    child_index: step.child_index,
                    expected: step.tag_name.clone(),
                    at: Some(at),
                });
            }
            OpenTagEnd::EndOfInput => {
                return Err(Desync::LeafHasNoChildren {
                    parent,
                    child_index: step.child_index,
                    expected: step.tag_name.clone(),
                    at: None,
                });
            }
        };

        let mut seen = 0;
        while seen <= step.child_index {
            if let Err(at) = walker.goto_next_sibling_open_tag(target_level) {
                return Err(Desync::ChildIndexOutOfRange {
                    parent,
                    child_index: step.child_index,
                    expected: step.tag_name.clone(),
                    found: seen,
                    at,
                });
            }
            seen += 1;
        }

        let actual = walker.tag_name();
        if !dialect.names_match(&step.tag_name, &actual) {
            return Err(Desync::TagNameMismatch {
                parent,
                child_index: step.child_index,
                expected: step.tag_name.clone(),
                actual,
                at: walker.token().span,
            });
        }
        debug!(
            target: "svglink::walker",
            child_index = step.child_index,
            tag = %actual,
            span = %walker.token().span,
            "matched chain step"
        );
    }

    Ok(walker.token().clone())
}

/// How the scan past an opening tag's attributes ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenTagEnd {
    /// `>`; carries the depth of the tag's children.
    Children(usize),
    /// `/>` at this span.
    SelfClosing(TokenSpan),
    EndOfInput,
}

struct PathWalker<C> {
    cursor: C,
}

impl<C: TokenCursor> PathWalker<C> {
    fn token(&self) -> &Token {
        self.cursor.token()
    }

    fn tag_name(&self) -> SmolStr {
        let token = self.token();
        token
            .open_tag_name
            .clone()
            .unwrap_or_else(|| token.text.clone())
    }

    fn advance(&mut self) -> bool {
        let moved = self.cursor.advance();
        if moved {
            trace!(target: "svglink::walker", token = %self.token(), "advance");
        }
        moved
    }

    /// Skip prologue, whitespace and comments up to the first opening tag name.
    fn seek_root(&mut self) -> bool {
        while !self.token().is_open_tag() {
            if !self.advance() {
                return false;
            }
        }
        true
    }

    /// From an opening tag's name, move to the bracket that ends the tag.
    fn goto_end_of_open_tag(&mut self) -> OpenTagEnd {
        loop {
            if !self.advance() {
                return OpenTagEnd::EndOfInput;
            }
            let token = self.token();
            if token.is_self_closing() {
                return OpenTagEnd::SelfClosing(token.span);
            }
            if token.is_tag_bracket() {
                return OpenTagEnd::Children(token.depth);
            }
        }
    }

    /// Move to the next opening tag name at `target_level`.
    ///
    /// Fails with the span of the first token below `target_level` (the
    /// parent closed), or None at end of input.
    fn goto_next_sibling_open_tag(&mut self, target_level: usize) -> Result<(), Option<TokenSpan>> {
        loop {
            if !self.advance() {
                return Err(None);
            }
            let token = self.token();
            if token.depth < target_level {
                return Err(Some(token.span));
            }
            if token.is_open_tag() && token.depth == target_level {
                return Ok(());
            }
        }
    }
}
