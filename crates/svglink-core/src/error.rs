//! Error types for path resolution and preview rendering.

use miette::{Diagnostic, SourceSpan};
use smol_str::SmolStr;

use crate::types::TokenSpan;

/// Source and preview disagree about the document structure.
///
/// These are expected outcomes of a stale preview or a half-typed edit, not
/// bugs. Each variant is reported at the exact point the walk diverged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Desync {
    /// No opening tag before the end of the source.
    #[error("source has no root element")]
    #[diagnostic(
        code(svglink::root_not_found),
        help("the buffer is empty or contains only a prologue and comments")
    )]
    RootNotFound,

    /// The chain asks for a child of a tag that has none in the source.
    #[error("<{parent}> has no children in source, but the preview has child #{child_index} (a <{expected}>)")]
    #[diagnostic(
        code(svglink::leaf_has_no_children),
        help("the tag is self-closing or unterminated in the source; the preview is probably stale")
    )]
    LeafHasNoChildren {
        parent: SmolStr,
        child_index: usize,
        expected: SmolStr,
        /// The `/>` that closed the parent, if one was reached.
        at: Option<TokenSpan>,
    },

    /// Fewer child tags in the source than the chain's index requires.
    #[error("can't find child #{child_index} (a <{expected}>) of <{parent}>: source has only {found}")]
    #[diagnostic(
        code(svglink::child_index_out_of_range),
        help("source and preview are out of sync")
    )]
    ChildIndexOutOfRange {
        parent: SmolStr,
        child_index: usize,
        expected: SmolStr,
        found: usize,
        /// First token past the parent's children, or None at end of input.
        at: Option<TokenSpan>,
    },

    /// The child exists but has another name than the preview reports.
    #[error("child #{child_index} of <{parent}>: expected <{expected}> but found <{actual}>")]
    #[diagnostic(
        code(svglink::tag_name_mismatch),
        help("source and preview are out of sync")
    )]
    TagNameMismatch {
        parent: SmolStr,
        child_index: usize,
        expected: SmolStr,
        actual: SmolStr,
        at: TokenSpan,
    },
}

impl Desync {
    /// Where in the source the walk diverged, when known.
    pub fn span(&self) -> Option<TokenSpan> {
        match self {
            Desync::RootNotFound => None,
            Desync::LeafHasNoChildren { at, .. } => *at,
            Desync::ChildIndexOutOfRange { at, .. } => *at,
            Desync::TagNameMismatch { at, .. } => Some(*at),
        }
    }
}

/// Malformed textual tag path such as `g[1]/circle[x]`.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("invalid tag path: {message}")]
#[diagnostic(
    code(svglink::tag_path),
    help("write steps as name[index], separated by `/`, e.g. g[1]/circle[0]")
)]
pub struct PathParseError {
    pub message: String,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
}

impl PathParseError {
    pub(crate) fn new(message: impl Into<String>, src: &str, offset: usize, len: usize) -> Self {
        Self {
            message: message.into(),
            src: src.to_string(),
            span: SourceSpan::new(offset.into(), len),
        }
    }
}

/// The preview could not be rendered from the source.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum PreviewError {
    #[error("source is not well-formed: {0}")]
    #[diagnostic(code(svglink::preview::xml))]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    #[diagnostic(code(svglink::preview::attribute))]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("source contains no element")]
    #[diagnostic(code(svglink::preview::no_root))]
    NoRoot,

    #[error("second top-level element <{name}>; a document has exactly one root")]
    #[diagnostic(code(svglink::preview::extra_root))]
    ExtraRoot { name: SmolStr },

    #[error("</{found}> closes <{expected}>")]
    #[diagnostic(code(svglink::preview::mismatched_end))]
    MismatchedEnd { expected: SmolStr, found: SmolStr },

    #[error("</{found}> has no matching opening tag")]
    #[diagnostic(code(svglink::preview::unexpected_end))]
    UnexpectedEnd { found: SmolStr },

    #[error("<{name}> is never closed")]
    #[diagnostic(code(svglink::preview::unclosed))]
    Unclosed { name: SmolStr },
}

/// An edit addressed characters the buffer does not have.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[error("edit range {start}..{end} is not within the buffer of {len} chars")]
#[diagnostic(code(svglink::session::invalid_edit))]
pub struct EditError {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

/// A click in the preview could not be mapped to the source.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ClickError {
    #[error("no preview has been rendered for this session")]
    #[diagnostic(
        code(svglink::session::no_preview),
        help("the source has not parsed cleanly yet; fix it and refresh the preview")
    )]
    NoPreview,

    #[error("node {0:?} is not part of the current preview")]
    #[diagnostic(code(svglink::session::unknown_node))]
    UnknownNode(crate::preview::NodeId),

    #[error("resolved span {0} lies outside the source buffer")]
    #[diagnostic(code(svglink::session::span_outside_buffer))]
    SpanOutsideBuffer(TokenSpan),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Desync(#[from] Desync),
}
