//! svglink-core: map an element picked in a rendered preview back to its
//! opening tag in the markup source.
//!
//! This crate provides:
//! - `build_chain` - ancestor chain of a clicked element, over any DOM that
//!   implements `ElementNode`
//! - `find_tag` - single forward walk of a token stream along a chain
//! - `Tokenizer` - XML-mode lexer annotating every token with its nesting depth
//! - `PreviewDom` - headless preview rendered from source, with `<use>` instances
//! - `PreviewSession` - buffer + preview + click handling, generic over `TextBuffer`

pub mod chain;
pub mod cursor;
pub mod dialect;
pub mod error;
pub mod preview;
pub mod session;
pub mod text;
pub mod token;
pub mod tokenizer;
pub mod types;
pub mod walker;

pub use chain::{ChainStep, ElementNode, TagPath, build_chain};
pub use cursor::{BufferTokens, SliceCursor, StreamCursor, TokenCursor, TokenSource};
pub use dialect::{MarkupDialect, UnknownDialect};
pub use error::{ClickError, Desync, EditError, PathParseError, PreviewError};
pub use preview::{NodeId, PreviewDom, PreviewNode};
pub use session::PreviewSession;
pub use smol_str::SmolStr;
pub use text::{SourceRope, TextBuffer};
pub use token::{Token, TokenKind};
pub use tokenizer::{Tokenizer, tokenize};
pub use types::{Position, Selection, TokenSpan};
pub use walker::{Resolution, find_tag, find_tag_in};
