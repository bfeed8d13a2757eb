//! `ElementNode` implementation for browser elements.

use smol_str::SmolStr;
use svglink_core::ElementNode;
use wasm_bindgen::JsCast;
use web_sys::{Element, Node, ShadowRoot};

/// A preview element in the browser DOM.
///
/// Equality is JS identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement(Element);

impl DomElement {
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &Element {
        &self.0
    }
}

impl From<Element> for DomElement {
    fn from(element: Element) -> Self {
        Self(element)
    }
}

impl ElementNode for DomElement {
    fn parent_element(&self) -> Option<Self> {
        self.0.parent_element().map(Self)
    }

    fn element_index(&self) -> usize {
        let mut index = 0;
        let mut sibling = self.0.previous_element_sibling();
        while let Some(element) = sibling {
            index += 1;
            sibling = element.previous_element_sibling();
        }
        index
    }

    fn tag_name(&self) -> SmolStr {
        SmolStr::new(self.0.tag_name())
    }

    /// The outermost `<use>` whose rendered instance contains this element.
    ///
    /// Checks the legacy `correspondingUseElement` property first, then walks
    /// out through `<use>` shadow roots.
    fn instantiating_reference(&self) -> Option<Self> {
        if let Some(element) = corresponding_use_element(&self.0) {
            return Some(Self(element));
        }

        let mut reference = None;
        let mut node: Node = self.0.clone().into();
        while let Ok(shadow) = node.get_root_node().dyn_into::<ShadowRoot>() {
            let host = shadow.host();
            if !is_use(&host) {
                break;
            }
            node = host.clone().into();
            reference = Some(Self(host));
        }
        reference
    }
}

fn corresponding_use_element(element: &Element) -> Option<Element> {
    let value = js_sys::Reflect::get(element, &"correspondingUseElement".into()).ok()?;
    value.dyn_into::<Element>().ok()
}

fn is_use(element: &Element) -> bool {
    element.local_name() == "use"
}
