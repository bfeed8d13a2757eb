//! Click events on the preview container.

use gloo_events::EventListener;
use svglink_core::{TagPath, build_chain};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

use crate::dom::DomElement;

/// Chain from `root` down to `clicked`.
pub fn chain_from_element(clicked: &Element, root: &Element) -> TagPath {
    build_chain(
        &DomElement::new(clicked.clone()),
        &DomElement::new(root.clone()),
    )
}

/// Chain for a click handled on the preview container.
///
/// The container's first element child (the rendered `<svg>`) is the
/// document root. Clicks on the container itself yield None.
pub fn chain_from_click(event: &Event) -> Option<TagPath> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let container = event.current_target()?.dyn_into::<Element>().ok()?;
    if target == container {
        return None;
    }
    let root = container.first_element_child()?;
    Some(chain_from_element(&target, &root))
}

/// Click listener on a preview container; removed on drop.
pub struct PreviewClicks {
    _listener: EventListener,
}

impl PreviewClicks {
    /// Call `on_chain` with the chain of every element clicked inside
    /// `container`.
    pub fn attach(container: &Element, mut on_chain: impl FnMut(TagPath) + 'static) -> Self {
        let listener = EventListener::new(container, "click", move |event| {
            match chain_from_click(event) {
                Some(chain) => {
                    tracing::debug!(target: "svglink::browser", %chain, "preview click");
                    on_chain(chain);
                }
                None => tracing::trace!(target: "svglink::browser", "click outside preview root"),
            }
        });
        Self {
            _listener: listener,
        }
    }
}
