//! WASM browser tests for svglink-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use svglink_browser::{
    DomElement, ElementNode, MarkupDialect, TagPath, TokenSpan, chain_from_element, find_tag,
    find_tag_in, tokenize,
};
use web_sys::Element;

const SOURCE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g><rect/></g>
  <!-- second group -->
  <g>
    <circle/>
    <circle id="target"/>
  </g>
</svg>"#;

/// Render `markup` into a detached container, as a preview pane would.
fn render(markup: &str) -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let container = document.create_element("div").unwrap();
    container.set_inner_html(markup);
    container
}

fn select(container: &Element, selector: &str) -> Element {
    container.query_selector(selector).unwrap().unwrap()
}

#[wasm_bindgen_test]
fn test_chain_from_rendered_svg() {
    let container = render(SOURCE);
    let root = container.first_element_child().unwrap();
    let target = select(&container, "#target");

    let chain = chain_from_element(&target, &root);
    assert_eq!(chain.to_string(), "g[1]/circle[1]");

    let token = find_tag(SOURCE, &chain).unwrap();
    assert_eq!(token.text, "circle");
    assert_eq!(token.span, TokenSpan::new(5, 5, 11));
}

#[wasm_bindgen_test]
fn test_root_click_is_empty_chain() {
    let container = render(SOURCE);
    let root = container.first_element_child().unwrap();
    assert_eq!(chain_from_element(&root, &root), TagPath::root());
}

#[wasm_bindgen_test]
fn test_element_index_ignores_text_and_comments() {
    let container = render(SOURCE);
    let groups = container.query_selector_all("g").unwrap();
    assert_eq!(groups.length(), 2);
    let second = select(&container, "g:nth-of-type(2)");
    assert_eq!(DomElement::new(second).element_index(), 1);
}

#[wasm_bindgen_test]
fn test_plain_element_has_no_reference() {
    let container = render(SOURCE);
    let target = DomElement::new(select(&container, "#target"));
    assert!(target.instantiating_reference().is_none());
}

#[wasm_bindgen_test]
fn test_html_tag_names_match_case_insensitively() {
    let source = "<main><p>a</p><p>b</p></main>";
    let container = render(source);
    let root = container.first_element_child().unwrap();
    let second = select(&container, "p:nth-of-type(2)");

    // HTML elements report upper-case tag names.
    let chain = chain_from_element(&second, &root);
    assert_eq!(chain.to_string(), "P[1]");

    let tokens = tokenize(source, MarkupDialect::Html);
    let token = find_tag_in(&tokens[..], &chain, MarkupDialect::Html).unwrap();
    assert_eq!(token.span, TokenSpan::new(0, 15, 16));
}
