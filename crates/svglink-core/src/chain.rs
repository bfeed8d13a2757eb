//! Ancestor chains: the path from the document root down to a picked element.
//!
//! A chain is built from the preview side (any DOM that implements
//! [`ElementNode`]) and consumed by the walker on the source side. Both sides
//! count only element siblings; text and comments never shift an index.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::error::PathParseError;

/// One step of an ancestor chain: "child #`child_index` of the previous step,
/// which should be a `<tag_name>`".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainStep {
    pub child_index: usize,
    pub tag_name: SmolStr,
}

impl ChainStep {
    pub fn new(child_index: usize, tag_name: impl Into<SmolStr>) -> Self {
        Self {
            child_index,
            tag_name: tag_name.into(),
        }
    }
}

impl fmt::Display for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag_name, self.child_index)
    }
}

/// Root-exclusive chain of steps, outermost first.
///
/// The document root itself is never a step; an empty path means the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TagPath {
    steps: Vec<ChainStep>,
}

impl TagPath {
    pub fn new(steps: Vec<ChainStep>) -> Self {
        Self { steps }
    }

    /// Path to the root element.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChainStep> {
        self.steps.iter()
    }
}

impl From<Vec<ChainStep>> for TagPath {
    fn from(steps: Vec<ChainStep>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a TagPath {
    type Item = &'a ChainStep;
    type IntoIter = std::slice::Iter<'a, ChainStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for TagPath {
    type Err = PathParseError;

    /// Parse `name[index]/name[index]...`. A leading `/` is allowed; `/` or
    /// an empty string is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end();
        let body_start = trimmed.len() - trimmed.trim_start().len();
        let mut offset = body_start;
        let mut body = &trimmed[body_start..];
        if let Some(rest) = body.strip_prefix('/') {
            body = rest;
            offset += 1;
        }
        if body.is_empty() {
            return Ok(Self::root());
        }

        let mut steps = Vec::new();
        for segment in body.split('/') {
            steps.push(parse_step(s, segment, offset)?);
            offset += segment.len() + 1;
        }
        Ok(Self { steps })
    }
}

fn parse_step(src: &str, segment: &str, offset: usize) -> Result<ChainStep, PathParseError> {
    if segment.is_empty() {
        return Err(PathParseError::new("empty step", src, offset, 0));
    }
    let Some(open) = segment.find('[') else {
        return Err(PathParseError::new(
            "missing child index",
            src,
            offset,
            segment.len(),
        ));
    };
    let name = &segment[..open];
    if name.is_empty() {
        return Err(PathParseError::new("missing tag name", src, offset, 1));
    }
    if name.chars().any(|c| c.is_whitespace() || c == ']') {
        return Err(PathParseError::new("invalid tag name", src, offset, name.len()));
    }
    let Some(index_text) = segment[open + 1..].strip_suffix(']') else {
        return Err(PathParseError::new(
            "unterminated child index",
            src,
            offset + open,
            segment.len() - open,
        ));
    };
    let child_index = index_text.parse::<usize>().map_err(|_| {
        PathParseError::new(
            "child index must be a non-negative integer",
            src,
            offset + open + 1,
            index_text.len(),
        )
    })?;
    Ok(ChainStep::new(child_index, name))
}

/// Read access to an element of a rendered preview.
///
/// Implemented by the headless [`PreviewDom`](crate::PreviewDom) and by the
/// browser layer.
pub trait ElementNode: Clone + PartialEq {
    /// Parent element, or None at the top of the tree.
    fn parent_element(&self) -> Option<Self>;

    /// Ordinal among the parent's element children (text/comments not counted).
    fn element_index(&self) -> usize;

    /// Tag name, case preserved.
    fn tag_name(&self) -> SmolStr;

    /// The element that instantiated this one, for rendered clones of a
    /// template (SVG `<use>`). The source only contains the reference.
    fn instantiating_reference(&self) -> Option<Self> {
        None
    }
}

/// Build the root-exclusive ancestor chain of `clicked`, outermost first.
///
/// Instantiated clones are replaced by their reference element before the
/// walk up. If `root` is never reached the chain covers every ancestor.
pub fn build_chain<N: ElementNode>(clicked: &N, root: &N) -> TagPath {
    let mut node = clicked
        .instantiating_reference()
        .unwrap_or_else(|| clicked.clone());

    let mut steps = Vec::new();
    while node != *root {
        steps.push(ChainStep::new(node.element_index(), node.tag_name()));
        match node.parent_element() {
            Some(parent) => node = parent,
            None => break,
        }
    }
    steps.reverse();
    TagPath::new(steps)
}
