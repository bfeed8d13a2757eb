//! Headless preview: the element tree a renderer would build from the source.
//!
//! `PreviewDom` parses the buffer with quick-xml into an arena of elements.
//! Only elements become nodes; text, comments, CDATA and processing
//! instructions are dropped, the same way they are invisible to
//! `parentElement`/`previousElementSibling` in a browser.
//!
//! SVG `<use href="#id">` elements get a rendered instance: a clone of the
//! referenced subtree. Clones live outside the use element's child list (a
//! browser keeps them in a shadow tree) and every clone node points back at
//! the `<use>` in the real document that produced it.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::chain::{ElementNode, TagPath, build_chain};
use crate::dialect::MarkupDialect;
use crate::error::PreviewError;

/// Nested `<use>` expansion stops past this many levels.
const MAX_USE_DEPTH: usize = 16;

/// Total number of clone nodes a document may render for its `<use>`
/// elements. Instances that would exceed it are left unexpanded.
const MAX_INSTANCE_NODES: usize = 100_000;

/// Index of an element in a [`PreviewDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: SmolStr,
    parent: Option<NodeId>,
    /// Position among the parent's element children.
    index: usize,
    children: Vec<NodeId>,
    element_id: Option<SmolStr>,
    href: Option<SmolStr>,
    /// Rendered instance of a `<use>`.
    instance: Option<NodeId>,
    /// For clones: the `<use>` in the real document that produced them.
    instance_of: Option<NodeId>,
}

/// Parsed element tree of a source buffer.
#[derive(Debug, Clone)]
pub struct PreviewDom {
    nodes: Vec<NodeData>,
    /// Number of real (non-clone) elements. They occupy `0..real` in
    /// document order.
    real: usize,
    ids: HashMap<SmolStr, NodeId>,
    dialect: MarkupDialect,
}

impl PreviewDom {
    /// Parse an SVG document.
    pub fn parse(source: &str) -> Result<Self, PreviewError> {
        Self::parse_with(source, MarkupDialect::Svg)
    }

    /// Parse with `dialect` rules.
    ///
    /// XML and SVG must be well-formed. HTML tolerates void elements without
    /// `/>`, unquoted attribute values and closing tags that skip levels.
    pub fn parse_with(source: &str, dialect: MarkupDialect) -> Result<Self, PreviewError> {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;

        let mut builder = TreeBuilder::new(dialect);
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = builder.open(&e)?;
                    let void = dialect.is_void_element(&builder.nodes[id.0].tag);
                    if !void {
                        builder.stack.push(id);
                    }
                }
                Event::Empty(e) => {
                    builder.open(&e)?;
                }
                Event::End(e) => builder.close(&decode(e.name().as_ref()))?,
                Event::Eof => break,
                _ => {}
            }
        }
        let dom = builder.finish()?;
        debug!(
            target: "svglink::preview",
            elements = dom.real,
            instances = dom.nodes.len() - dom.real,
            "parsed preview"
        );
        Ok(dom)
    }

    pub fn dialect(&self) -> MarkupDialect {
        self.dialect
    }

    pub fn root(&self) -> PreviewNode<'_> {
        PreviewNode {
            dom: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<PreviewNode<'_>> {
        (id.0 < self.nodes.len()).then_some(PreviewNode { dom: self, id })
    }

    /// Number of elements in the document, not counting rendered instances.
    pub fn len(&self) -> usize {
        self.real
    }

    pub fn is_empty(&self) -> bool {
        self.real == 0
    }

    /// Elements of the document in source order, without instances.
    pub fn elements(&self) -> impl Iterator<Item = PreviewNode<'_>> + '_ {
        (0..self.real).map(move |i| PreviewNode {
            dom: self,
            id: NodeId(i),
        })
    }

    /// First element with the given `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<PreviewNode<'_>> {
        self.ids.get(id).and_then(|&node| self.node(node))
    }

    /// Follow `path` down from the root by element index.
    ///
    /// Returns None if an index is out of range or a name disagrees.
    pub fn element_at_path(&self, path: &TagPath) -> Option<PreviewNode<'_>> {
        let mut node = NodeId(0);
        for step in path {
            let child = *self.nodes[node.0].children.get(step.child_index)?;
            if !self
                .dialect
                .names_match(&step.tag_name, &self.nodes[child.0].tag)
            {
                return None;
            }
            node = child;
        }
        self.node(node)
    }

    /// Ancestor chain of `node` relative to the root.
    pub fn path_of(&self, node: NodeId) -> Option<TagPath> {
        let node = self.node(node)?;
        Some(build_chain(&node, &self.root()))
    }
}

/// An element of a [`PreviewDom`].
#[derive(Debug, Clone, Copy)]
pub struct PreviewNode<'a> {
    dom: &'a PreviewDom,
    id: NodeId,
}

impl<'a> PreviewNode<'a> {
    fn data(&self) -> &'a NodeData {
        &self.dom.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data().tag
    }

    /// Value of the `id` attribute.
    pub fn element_id(&self) -> Option<&'a str> {
        self.data().element_id.as_deref()
    }

    pub fn children(&self) -> impl Iterator<Item = PreviewNode<'a>> + 'a {
        let dom = self.dom;
        self.data()
            .children
            .iter()
            .map(move |&id| PreviewNode { dom, id })
    }

    /// Root of the rendered instance, for a `<use>` with a resolvable target.
    pub fn instance(&self) -> Option<PreviewNode<'a>> {
        let id = self.data().instance?;
        Some(PreviewNode { dom: self.dom, id })
    }

    /// True for nodes inside a rendered `<use>` instance.
    pub fn is_instance(&self) -> bool {
        self.data().instance_of.is_some()
    }
}

impl PartialEq for PreviewNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dom, other.dom) && self.id == other.id
    }
}

impl Eq for PreviewNode<'_> {}

impl ElementNode for PreviewNode<'_> {
    fn parent_element(&self) -> Option<Self> {
        let id = self.data().parent?;
        Some(PreviewNode { dom: self.dom, id })
    }

    fn element_index(&self) -> usize {
        self.data().index
    }

    fn tag_name(&self) -> SmolStr {
        self.data().tag.clone()
    }

    fn instantiating_reference(&self) -> Option<Self> {
        let id = self.data().instance_of?;
        Some(PreviewNode { dom: self.dom, id })
    }
}

struct TreeBuilder {
    dialect: MarkupDialect,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new(dialect: MarkupDialect) -> Self {
        Self {
            dialect,
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<NodeId, PreviewError> {
        let tag = SmolStr::new(decode(start.name().as_ref()));
        let parent = self.stack.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            return Err(PreviewError::ExtraRoot { name: tag });
        }

        let attributes = match self.dialect {
            MarkupDialect::Html => start.html_attributes(),
            MarkupDialect::Svg | MarkupDialect::Xml => start.attributes(),
        };
        let mut element_id = None;
        let mut href = None;
        let mut xlink_href = None;
        for attr in attributes {
            let attr = attr?;
            match attr.key.as_ref() {
                b"id" => element_id = Some(SmolStr::new(decode(&attr.value))),
                b"href" => href = Some(SmolStr::new(decode(&attr.value))),
                b"xlink:href" => xlink_href = Some(SmolStr::new(decode(&attr.value))),
                _ => {}
            }
        }

        let id = NodeId(self.nodes.len());
        let index = match parent {
            Some(parent) => {
                let siblings = &mut self.nodes[parent.0].children;
                siblings.push(id);
                siblings.len() - 1
            }
            None => 0,
        };
        trace!(target: "svglink::preview", %tag, index, "element");
        self.nodes.push(NodeData {
            tag,
            parent,
            index,
            children: Vec::new(),
            element_id,
            href: href.or(xlink_href),
            instance: None,
            instance_of: None,
        });
        Ok(id)
    }

    fn close(&mut self, name: &str) -> Result<(), PreviewError> {
        let dialect = self.dialect;
        let nodes = &self.nodes;
        let matching = self
            .stack
            .iter()
            .rposition(|open| dialect.names_match(&nodes[open.0].tag, name));

        match (dialect, matching) {
            // HTML recovers from skipped closing tags and ignores strays.
            (MarkupDialect::Html, Some(idx)) => self.stack.truncate(idx),
            (MarkupDialect::Html, None) => {}
            (_, Some(idx)) if idx + 1 == self.stack.len() => {
                self.stack.pop();
            }
            (_, _) => {
                return Err(match self.stack.last() {
                    Some(open) => PreviewError::MismatchedEnd {
                        expected: self.nodes[open.0].tag.clone(),
                        found: name.into(),
                    },
                    None => PreviewError::UnexpectedEnd { found: name.into() },
                });
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<PreviewDom, PreviewError> {
        if self.dialect != MarkupDialect::Html {
            if let Some(open) = self.stack.last() {
                return Err(PreviewError::Unclosed {
                    name: self.nodes[open.0].tag.clone(),
                });
            }
        }
        if self.nodes.is_empty() {
            return Err(PreviewError::NoRoot);
        }

        let real = self.nodes.len();
        let mut ids = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(element_id) = &node.element_id {
                ids.entry(element_id.clone()).or_insert(NodeId(i));
            }
        }

        let mut instancer = Instancer {
            nodes: &mut self.nodes,
            ids: &ids,
            active: Vec::new(),
            budget: MAX_INSTANCE_NODES,
            sizes: HashMap::new(),
        };
        for i in 0..real {
            instancer.instantiate(NodeId(i), NodeId(i));
        }

        Ok(PreviewDom {
            nodes: self.nodes,
            real,
            ids,
            dialect: self.dialect,
        })
    }
}

/// Expands `<use>` elements into cloned subtrees.
struct Instancer<'a> {
    nodes: &'a mut Vec<NodeData>,
    ids: &'a HashMap<SmolStr, NodeId>,
    /// Templates being expanded, outermost first.
    active: Vec<NodeId>,
    /// Clone nodes still allowed.
    budget: usize,
    sizes: HashMap<NodeId, usize>,
}

impl Instancer<'_> {
    /// Give `use_node` an instance if it is a `<use>` with a resolvable
    /// target. Clone nodes record `reference` as their origin.
    fn instantiate(&mut self, use_node: NodeId, reference: NodeId) {
        let data = &self.nodes[use_node.0];
        if !is_use(&data.tag) {
            return;
        }
        let Some(target) = data
            .href
            .as_deref()
            .and_then(|h| h.strip_prefix('#'))
            .map(SmolStr::new)
        else {
            return;
        };
        let Some(&template) = self.ids.get(target.as_str()) else {
            debug!(target: "svglink::preview", %target, "use references a missing id");
            return;
        };
        if self.active.contains(&template) || self.active.len() >= MAX_USE_DEPTH {
            debug!(target: "svglink::preview", %target, "use reference cycle; not expanded");
            return;
        }
        let size = self.subtree_size(template);
        if size > self.budget {
            debug!(
                target: "svglink::preview",
                %target,
                size,
                remaining = self.budget,
                "instance budget spent; not expanded"
            );
            return;
        }
        self.budget -= size;

        self.active.push(template);
        let first = self.nodes.len();
        let root = self.clone_subtree(template, None, 0, reference);
        let last = self.nodes.len();
        self.nodes[use_node.0].instance = Some(root);
        for i in first..last {
            self.instantiate(NodeId(i), reference);
        }
        self.active.pop();
    }

    /// Element count of `node` and its descendants.
    fn subtree_size(&mut self, node: NodeId) -> usize {
        if let Some(&size) = self.sizes.get(&node) {
            return size;
        }
        let mut size = 0;
        let mut pending = vec![node];
        while let Some(next) = pending.pop() {
            size += 1;
            pending.extend(self.nodes[next.0].children.iter().copied());
        }
        self.sizes.insert(node, size);
        size
    }

    fn clone_subtree(
        &mut self,
        source: NodeId,
        parent: Option<NodeId>,
        index: usize,
        reference: NodeId,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let original = &self.nodes[source.0];
        let children = original.children.clone();
        let copy = NodeData {
            tag: original.tag.clone(),
            parent,
            index,
            children: Vec::with_capacity(children.len()),
            element_id: original.element_id.clone(),
            href: original.href.clone(),
            instance: None,
            instance_of: Some(reference),
        };
        self.nodes.push(copy);
        for (i, child) in children.into_iter().enumerate() {
            let cloned = self.clone_subtree(child, Some(id), i, reference);
            self.nodes[id.0].children.push(cloned);
        }
        id
    }
}

fn is_use(tag: &str) -> bool {
    tag == "use" || tag.ends_with(":use")
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
