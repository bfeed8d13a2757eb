//! Browser DOM layer for svglink.
//!
//! Maps clicks on a live preview (an inline `<svg>` rendered by the browser)
//! to ancestor chains that `svglink-core` resolves against the source. It
//! assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `ElementNode` over `web_sys::Element`
//! - `click`: chain extraction from click events and a listener guard
//!
//! # Re-exports
//!
//! This crate re-exports `svglink-core` for convenience, so consumers only
//! need to depend on `svglink-browser`.

// Re-export core crate
pub use svglink_core;
pub use svglink_core::*;

pub mod click;
pub mod dom;

pub use click::{PreviewClicks, chain_from_click, chain_from_element};
pub use dom::DomElement;
