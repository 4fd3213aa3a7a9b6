//! HTML Serialization
//!
//! Walks a tree depth-first and emits markup. Every element carries its
//! resolved address in a `data-weft-id` attribute, and event bindings are
//! serialized as `data-weft-<kind>` attributes valued with the handler
//! identifier. The client-side patch applier locates edit targets through
//! these attributes, never through document structure.

use crate::ui::{Element, Node, Path};

/// Tags rendered self-closing, with no children or closing tag.
const VOID_TAGS: &[&str] = &["input", "img", "br", "hr", "meta", "link", "area", "base"];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Render a full tree to markup, rooted at path `0`.
pub fn html(tree: &Node) -> String {
    html_at(tree, &Path::root())
}

/// Render a subtree to markup with `path` as its address base.
///
/// The differ uses this for insert/replace payloads so that nested
/// `data-weft-id` attributes carry the addresses the subtree actually
/// occupies in the document.
pub fn html_at(node: &Node, path: &Path) -> String {
    let mut out = String::with_capacity(4096);
    render_node(&mut out, node, path);
    out
}

/// Render one element to markup with `path` as its address base.
pub(crate) fn element_at(element: &Element, path: &Path) -> String {
    let mut out = String::with_capacity(4096);
    render_element(&mut out, element, path);
    out
}

fn render_node(out: &mut String, node: &Node, path: &Path) {
    match node {
        Node::Element(element) => render_element(out, element, path),
        Node::Text(value) => push_escaped(out, value),
        Node::Raw(markup) => out.push_str(markup),
    }
}

fn render_element(out: &mut String, element: &Element, path: &Path) {
    out.push('<');
    out.push_str(&element.tag);

    out.push_str(" data-weft-id=\"");
    match &element.id {
        Some(id) => push_escaped(out, id),
        None => push_escaped(out, &path.to_string()),
    }
    out.push('"');

    if !element.class.is_empty() {
        out.push_str(" class=\"");
        push_escaped(out, &element.class);
        out.push('"');
    }
    if !element.style.is_empty() {
        out.push_str(" style=\"");
        push_escaped(out, &element.style);
        out.push('"');
    }
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        push_escaped(out, value);
        out.push('"');
    }
    for (kind, handler_id) in &element.events {
        out.push_str(" data-weft-");
        out.push_str(kind);
        out.push_str("=\"");
        push_escaped(out, handler_id);
        out.push('"');
    }

    if is_void(&element.tag) {
        out.push_str(" />");
        return;
    }

    out.push('>');
    for (i, child) in element.children.iter().enumerate() {
        render_node(out, child, &path.child(i));
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

/// Append `value` to `out`, escaping the five HTML-significant characters.
pub(crate) fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_elements_with_paths() {
        let tree = Node::from(
            Element::new("div")
                .child(Element::new("span").child(Node::text("hi")))
                .child(Element::new("p")),
        );

        assert_eq!(
            html(&tree),
            "<div data-weft-id=\"0\">\
             <span data-weft-id=\"0.0\">hi</span>\
             <p data-weft-id=\"0.1\"></p>\
             </div>"
        );
    }

    #[test]
    fn explicit_id_overrides_path_address() {
        let tree = Node::from(Element::new("div").child(Element::new("li").with_id("row-7")));
        let markup = html(&tree);
        assert!(markup.contains("<li data-weft-id=\"row-7\">"));
    }

    #[test]
    fn subtree_render_uses_given_base_path() {
        let subtree = Node::from(Element::new("span").child(Element::new("b")));
        let markup = html_at(&subtree, &Path::root().child(3));
        assert!(markup.starts_with("<span data-weft-id=\"0.3\">"));
        assert!(markup.contains("<b data-weft-id=\"0.3.0\">"));
    }

    #[test]
    fn text_is_escaped_raw_is_not() {
        let tree = Node::from(
            Element::new("div")
                .child(Node::text("<b>&'\"</b>"))
                .child(Node::raw("<b>bold</b>")),
        );
        let markup = html(&tree);
        assert!(markup.contains("&lt;b&gt;&amp;&#39;&#34;&lt;/b&gt;"));
        assert!(markup.contains("<b>bold</b>"));
    }

    #[test]
    fn class_style_attrs_and_events_are_emitted() {
        let tree = Node::from(
            Element::new("button")
                .class("btn")
                .style("color: red")
                .attr("disabled", "true")
                .on("click", "e1_click"),
        );
        assert_eq!(
            html(&tree),
            "<button data-weft-id=\"0\" class=\"btn\" style=\"color: red\" \
             disabled=\"true\" data-weft-click=\"e1_click\"></button>"
        );
    }

    #[test]
    fn void_tags_self_close() {
        let tree = Node::from(Element::new("input").attr("type", "text"));
        assert_eq!(html(&tree), "<input data-weft-id=\"0\" type=\"text\" />");
    }
}
