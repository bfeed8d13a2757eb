//! Editor session: a source buffer paired with its rendered preview.
//!
//! Edits go to the buffer immediately; the preview is only rebuilt on
//! `refresh_preview`. Between the two, clicks resolve a chain taken from the
//! old preview against the new source, which is exactly when the walker's
//! desync errors show up.

use std::ops::Range;

use tracing::{debug, warn};

use crate::chain::build_chain;
use crate::cursor::BufferTokens;
use crate::dialect::MarkupDialect;
use crate::error::{ClickError, EditError, PreviewError};
use crate::preview::{NodeId, PreviewDom};
use crate::text::{SourceRope, TextBuffer};
use crate::types::Selection;
use crate::walker::find_tag_in;

/// A source buffer attached to a live preview.
#[derive(Debug)]
pub struct PreviewSession<B: TextBuffer = SourceRope> {
    buffer: B,
    dialect: MarkupDialect,
    preview: Option<PreviewDom>,
    selection: Option<Selection>,
    /// Bumped on every edit.
    revision: u64,
    /// Revision the current preview was rendered from.
    rendered: Option<u64>,
}

impl<B: TextBuffer> PreviewSession<B> {
    /// Attach to `buffer`.
    ///
    /// Previewable dialects are rendered right away. A source that does not
    /// parse leaves the session without a preview until the next successful
    /// `refresh_preview`.
    pub fn attach(buffer: B, dialect: MarkupDialect) -> Self {
        let mut session = Self {
            buffer,
            dialect,
            preview: None,
            selection: None,
            revision: 0,
            rendered: None,
        };
        if !dialect.is_previewable() {
            debug!(target: "svglink::session", %dialect, "dialect has no live preview");
            return session;
        }
        if let Err(error) = session.refresh_preview() {
            warn!(target: "svglink::session", %error, "initial preview failed");
        }
        session
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn preview(&self) -> Option<&PreviewDom> {
        self.preview.as_ref()
    }

    /// Selection set by the last successful click.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True if the buffer changed since the preview was rendered.
    pub fn is_stale(&self) -> bool {
        self.rendered != Some(self.revision)
    }

    /// Replace `char_range` with `text`. The preview is left as is.
    ///
    /// A reversed range or one past the end of the buffer is rejected and
    /// leaves the session untouched.
    pub fn apply_edit(&mut self, char_range: Range<usize>, text: &str) -> Result<(), EditError> {
        let len = self.buffer.len_chars();
        if char_range.start > char_range.end || char_range.end > len {
            return Err(EditError {
                start: char_range.start,
                end: char_range.end,
                len,
            });
        }
        self.buffer.replace(char_range.clone(), text);
        self.revision += 1;
        self.selection = None;
        debug!(
            target: "svglink::session",
            revision = self.revision,
            ?char_range,
            inserted = text.len(),
            "edit"
        );
        Ok(())
    }

    /// Replace the whole buffer.
    pub fn replace_source(&mut self, text: &str) {
        let len = self.buffer.len_chars();
        if let Err(error) = self.apply_edit(0..len, text) {
            warn!(target: "svglink::session", %error, "whole-buffer edit rejected");
        }
    }

    /// Re-render the preview from the current buffer.
    ///
    /// On failure the previous preview, if any, stays in place.
    pub fn refresh_preview(&mut self) -> Result<&PreviewDom, PreviewError> {
        let dom = PreviewDom::parse_with(&self.buffer.to_string(), self.dialect)?;
        self.rendered = Some(self.revision);
        debug!(target: "svglink::session", revision = self.revision, "preview refreshed");
        Ok(&*self.preview.insert(dom))
    }

    /// Map a click on `node` in the preview to its opening tag in the source
    /// and select the tag name.
    ///
    /// On failure the current selection is kept.
    pub fn handle_click(&mut self, node: NodeId) -> Result<Selection, ClickError> {
        let preview = self.preview.as_ref().ok_or(ClickError::NoPreview)?;
        let clicked = preview.node(node).ok_or(ClickError::UnknownNode(node))?;
        let chain = build_chain(&clicked, &preview.root());

        let tokens = BufferTokens::new(&self.buffer, self.dialect);
        let token = match find_tag_in(&tokens, &chain, self.dialect) {
            Ok(token) => token,
            Err(desync) => {
                warn!(
                    target: "svglink::session",
                    %chain,
                    stale = self.is_stale(),
                    error = %desync,
                    "preview and source disagree"
                );
                return Err(desync.into());
            }
        };

        let selection = self
            .buffer
            .span_to_selection(token.span)
            .ok_or(ClickError::SpanOutsideBuffer(token.span))?;
        debug!(
            target: "svglink::session",
            %chain,
            span = %token.span,
            "click resolved"
        );
        self.selection = Some(selection);
        Ok(selection)
    }

    /// End the session and hand the buffer back.
    pub fn detach(self) -> B {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Desync;
    use crate::types::Position;

    const SOURCE: &str = "<svg>\n  <g>\n    <circle id=\"a\"/>\n    <circle id=\"b\"/>\n  </g>\n  <use id=\"u\" href=\"#a\"/>\n</svg>\n";

    fn session(source: &str) -> PreviewSession {
        PreviewSession::attach(SourceRope::from_str(source), MarkupDialect::Svg)
    }

    fn node_by_id(session: &PreviewSession, id: &str) -> NodeId {
        session.preview().unwrap().find_by_id(id).unwrap().id()
    }

    fn selected_text(session: &PreviewSession) -> String {
        let selection = session.selection().unwrap();
        session.buffer().slice(selection.to_range()).unwrap().to_string()
    }

    #[test]
    fn test_click_selects_tag_name() {
        let mut session = session(SOURCE);
        let b = node_by_id(&session, "b");
        let selection = session.handle_click(b).unwrap();
        assert_eq!(session.selection(), Some(selection));
        assert_eq!(selected_text(&session), "circle");
        assert_eq!(
            session.buffer().char_to_position(selection.start()),
            Some(Position::new(3, 5))
        );
    }

    #[test]
    fn test_click_on_instance_selects_use() {
        let mut session = session(SOURCE);
        let u = node_by_id(&session, "u");
        let clone = session.preview().unwrap().node(u).unwrap().instance().unwrap().id();
        let selection = session.handle_click(clone).unwrap();
        assert_eq!(selected_text(&session), "use");
        assert_eq!(
            session.buffer().char_to_position(selection.start()),
            Some(Position::new(5, 3))
        );
    }

    #[test]
    fn test_stale_preview_reports_desync() {
        let mut session = session(SOURCE);
        let a = node_by_id(&session, "a");
        let b = node_by_id(&session, "b");
        session.handle_click(b).unwrap();

        // Insert a rect before the first circle without re-rendering.
        let line_start = session.buffer().line_to_char(2).unwrap();
        session
            .apply_edit(line_start..line_start, "    <rect/>\n")
            .unwrap();
        assert!(session.is_stale());
        assert_eq!(session.selection(), None);

        let err = session.handle_click(a).unwrap_err();
        assert!(matches!(
            err,
            ClickError::Desync(Desync::TagNameMismatch { ref actual, .. }) if actual == "rect"
        ));
        assert_eq!(session.selection(), None);

        session.refresh_preview().unwrap();
        assert!(!session.is_stale());
        let a = node_by_id(&session, "a");
        session.handle_click(a).unwrap();
        assert_eq!(selected_text(&session), "circle");
        assert_eq!(
            session
                .buffer()
                .char_to_position(session.selection().unwrap().start()),
            Some(Position::new(3, 5))
        );
    }

    #[test]
    fn test_attribute_edit_keeps_structure() {
        let mut session = session(SOURCE);
        let b = node_by_id(&session, "b");
        // Grow the first line; the structure is unchanged so the stale
        // preview still resolves.
        session.apply_edit(4..4, " width=\"10\"").unwrap();
        let selection = session.handle_click(b).unwrap();
        assert_eq!(selected_text(&session), "circle");
        assert_eq!(
            session.buffer().char_to_position(selection.start()),
            Some(Position::new(3, 5))
        );
    }

    #[test]
    fn test_broken_source_has_no_preview() {
        let mut session = session("<svg><g></svg>");
        assert!(session.preview().is_none());
        assert!(matches!(
            session.handle_click(NodeId::from_index(0)),
            Err(ClickError::NoPreview)
        ));

        session.replace_source("<svg><g/></svg>");
        session.refresh_preview().unwrap();
        let root = session.preview().unwrap().root().id();
        session.handle_click(root).unwrap();
        assert_eq!(selected_text(&session), "svg");
    }

    #[test]
    fn test_failed_refresh_keeps_old_preview() {
        let mut session = session(SOURCE);
        session.replace_source("<svg>");
        assert!(session.refresh_preview().is_err());
        assert!(session.preview().is_some());
        assert!(session.is_stale());
    }

    #[test]
    fn test_unknown_node() {
        let mut session = session("<svg/>");
        let missing = session.preview().unwrap().elements().count() + 10;
        let err = session.handle_click(NodeId::from_index(missing)).unwrap_err();
        assert!(matches!(err, ClickError::UnknownNode(_)));
    }

    #[test]
    fn test_non_previewable_dialect() {
        let session = PreviewSession::attach(SourceRope::from_str("<a/>"), MarkupDialect::Xml);
        assert!(session.preview().is_none());
    }

    #[test]
    fn test_out_of_bounds_edit_is_rejected() {
        let mut session = session("<svg/>");
        let b = session.buffer().len_chars();
        assert_eq!(
            session.apply_edit(2..b + 1, "x"),
            Err(EditError { start: 2, end: b + 1, len: b })
        );
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 4..2;
        assert!(session.apply_edit(reversed, "x").is_err());
        assert_eq!(session.revision(), 0);
        assert!(!session.is_stale());
        assert_eq!(session.buffer().to_string(), "<svg/>");
    }

    #[test]
    fn test_detach_returns_edited_buffer() {
        let mut session = session("<svg/>");
        session.replace_source("<svg><g/></svg>");
        let buffer = session.detach();
        assert_eq!(buffer.to_string(), "<svg><g/></svg>");
    }
}
