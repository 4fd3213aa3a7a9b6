//! Differ
//!
//! Given two tree snapshots for the same session (the previous render and
//! the new one), computes the ordered list of patches that brings the
//! client's document in sync.
//!
//! # Algorithm
//!
//! The diff recurses per node pair at a given address:
//!
//! 1. Both absent: nothing.
//! 2. Only new present: one `insert` carrying the rendered subtree.
//! 3. Only old present: one `remove`, addressed by the old node's explicit
//!    identifier if it has one, else its path.
//! 4. Different variants (element vs text vs raw): one `replace`.
//! 5. Same variant: texts compare values, raws compare markup, elements
//!    compare tag, then attributes, then recurse into children.
//!
//! Child reconciliation is keyed first, positional second: new children whose
//! explicit identifier matches an old child diff against that child no matter
//! where it moved, consuming the identifier. Children without a keyed match
//! fall back to the old child at the same position, provided its identifier
//! (if any) is still unconsumed; otherwise they are treated as inserted. Old
//! identified children never consumed are removed at the end. Callers that
//! want stable reordering must assign identifiers to list items; unkeyed
//! lists reconcile positionally.
//!
//! Because every event re-renders the whole tree, `diff(T, T)` is required
//! to be empty for any tree equal to itself.

mod patch;

pub use patch::{Patch, PatchKind};

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::render;
use crate::ui::{Element, Node, Path};

/// Attribute-name prefix under which event bindings travel.
const EVENT_ATTR_PREFIX: &str = "data-weft-";

/// Compare two tree snapshots and return the patches that transform the
/// document rendered from `old` into one matching `new`.
pub fn diff(old: &Node, new: &Node) -> Vec<Patch> {
    diff_node(Some(old), Some(new), &Path::root())
}

fn diff_node(old: Option<&Node>, new: Option<&Node>, path: &Path) -> Vec<Patch> {
    match (old, new) {
        (None, None) => Vec::new(),
        (None, Some(new)) => {
            vec![Patch::insert(path.to_string(), render::html_at(new, path))]
        }
        (Some(old), None) => {
            let address = old
                .element_id()
                .map(str::to_owned)
                .unwrap_or_else(|| path.to_string());
            vec![Patch::remove(address)]
        }
        (Some(old), Some(new)) => diff_present(old, new, path),
    }
}

fn diff_present(old: &Node, new: &Node, path: &Path) -> Vec<Patch> {
    match (old, new) {
        (Node::Text(old_value), Node::Text(new_value)) => {
            if old_value == new_value {
                Vec::new()
            } else {
                vec![Patch::update_text(path.to_string(), new_value.clone())]
            }
        }
        (Node::Raw(old_markup), Node::Raw(new_markup)) => {
            if old_markup == new_markup {
                Vec::new()
            } else {
                vec![Patch::replace(path.to_string(), new_markup.clone())]
            }
        }
        (Node::Element(old_element), Node::Element(new_element)) => {
            diff_element(old_element, new_element, path)
        }
        // Variant kinds differ: replace wholesale.
        _ => vec![Patch::replace(path.to_string(), render::html_at(new, path))],
    }
}

fn diff_element(old: &Element, new: &Element, path: &Path) -> Vec<Patch> {
    let address = new
        .id
        .clone()
        .unwrap_or_else(|| path.to_string());

    if old.tag != new.tag {
        return vec![Patch::replace(address, render::element_at(new, path))];
    }

    let mut patches = Vec::new();
    let changes = diff_attrs(old, new);
    if !changes.is_empty() {
        patches.push(Patch::update_attrs(address, changes));
    }
    patches.extend(diff_children(&old.children, &new.children, path));
    patches
}

/// Collect attribute-level changes between two same-tag elements.
///
/// Covers the class string, the style string, each attribute key, and each
/// event binding (namespaced under `data-weft-`). A key present in old but
/// absent in new maps to the empty string, which the client treats as
/// "remove this attribute".
fn diff_attrs(old: &Element, new: &Element) -> IndexMap<String, String> {
    let mut changes = IndexMap::new();

    if old.class != new.class {
        changes.insert("class".to_string(), new.class.clone());
    }
    if old.style != new.style {
        changes.insert("style".to_string(), new.style.clone());
    }

    for (name, value) in &new.attrs {
        if old.attrs.get(name) != Some(value) {
            changes.insert(name.clone(), value.clone());
        }
    }
    for name in old.attrs.keys() {
        if !new.attrs.contains_key(name) {
            changes.insert(name.clone(), String::new());
        }
    }

    for (kind, handler_id) in &new.events {
        if old.events.get(kind) != Some(handler_id) {
            changes.insert(format!("{EVENT_ATTR_PREFIX}{kind}"), handler_id.clone());
        }
    }
    for kind in old.events.keys() {
        if !new.events.contains_key(kind) {
            changes.insert(format!("{EVENT_ATTR_PREFIX}{kind}"), String::new());
        }
    }

    changes
}

fn diff_children<'a>(old: &'a [Node], new: &'a [Node], parent: &Path) -> Vec<Patch> {
    let mut patches = Vec::new();

    let mut old_by_id: HashMap<&str, &Node> = HashMap::new();
    for child in old {
        if let Some(id) = child.element_id() {
            old_by_id.insert(id, child);
        }
    }

    let mut consumed: HashSet<&'a str> = HashSet::new();
    for (i, new_child) in new.iter().enumerate() {
        let child_path = parent.child(i);
        let mut old_child: Option<&Node> = None;

        // Keyed fast path: match by explicit identifier, order-independent.
        if let Some(id) = new_child.element_id() {
            if let Some(matched) = old_by_id.get(id).copied() {
                old_child = Some(matched);
                consumed.insert(id);
            }
        }

        // Positional fallback, unless the old child at this position was
        // already (or will be) claimed by a keyed match.
        if old_child.is_none() {
            if let Some(candidate) = old.get(i) {
                match candidate.element_id() {
                    Some(id) if consumed.contains(id) => {}
                    Some(id) => {
                        old_child = Some(candidate);
                        consumed.insert(id);
                    }
                    None => old_child = Some(candidate),
                }
            }
        }

        patches.extend(diff_node(old_child, Some(new_child), &child_path));
    }

    // Identified old children never consumed are gone from the new tree.
    for child in old {
        if let Some(id) = child.element_id() {
            if !consumed.contains(id) {
                patches.push(Patch::remove(id));
            }
        }
    }

    patches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Element;

    fn div(children: Vec<Node>) -> Node {
        Node::from(Element::new("div").children(children))
    }

    fn keyed_item(id: &str, label: &str) -> Node {
        Node::from(Element::new("li").with_id(id).child(Node::text(label)))
    }

    #[test]
    fn identical_trees_yield_no_patches() {
        let tree = div(vec![
            Node::from(Element::new("span").class("x").attr("title", "t")),
            Node::text("hello"),
            Node::raw("<hr>"),
        ]);
        assert!(diff(&tree, &tree.clone()).is_empty());
    }

    #[test]
    fn text_change_targets_parent_relative_path() {
        let old = div(vec![Node::text("Hello")]);
        let new = div(vec![Node::text("World")]);

        let patches = diff(&old, &new);
        assert_eq!(patches, vec![Patch::update_text("0.0", "World")]);
    }

    #[test]
    fn raw_change_is_a_replace() {
        let old = div(vec![Node::raw("<b>a</b>")]);
        let new = div(vec![Node::raw("<b>b</b>")]);

        let patches = diff(&old, &new);
        assert_eq!(patches, vec![Patch::replace("0.0", "<b>b</b>")]);
    }

    #[test]
    fn variant_change_is_a_replace() {
        let old = div(vec![Node::text("plain")]);
        let new = div(vec![Node::from(Element::new("span"))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].kind, PatchKind::Replace);
        assert_eq!(patches[0].id, "0.0");
        assert_eq!(patches[0].html.as_deref(), Some("<span data-weft-id=\"0.0\"></span>"));
    }

    #[test]
    fn tag_change_is_a_replace() {
        let old = div(vec![Node::from(Element::new("span"))]);
        let new = div(vec![Node::from(Element::new("p"))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].kind, PatchKind::Replace);
    }

    #[test]
    fn attribute_changes_use_delete_sentinel() {
        let old = div(vec![Node::from(
            Element::new("a").class("link").attr("href", "/old").attr("title", "keep?"),
        )]);
        let new = div(vec![Node::from(Element::new("a").class("link active").attr("href", "/new"))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].kind, PatchKind::Attrs);
        let attrs = patches[0].attrs.as_ref().expect("attrs payload");
        assert_eq!(attrs.get("class").map(String::as_str), Some("link active"));
        assert_eq!(attrs.get("href").map(String::as_str), Some("/new"));
        assert_eq!(attrs.get("title").map(String::as_str), Some(""));
    }

    #[test]
    fn event_binding_changes_are_namespaced() {
        let old = div(vec![Node::from(Element::new("button").on("click", "e1_click"))]);
        let new = div(vec![Node::from(Element::new("button").on("input", "e1_input"))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        let attrs = patches[0].attrs.as_ref().expect("attrs payload");
        assert_eq!(attrs.get("data-weft-input").map(String::as_str), Some("e1_input"));
        assert_eq!(attrs.get("data-weft-click").map(String::as_str), Some(""));
    }

    #[test]
    fn keyed_reorder_produces_no_structural_edits() {
        let old = div(vec![keyed_item("a", "A"), keyed_item("b", "B"), keyed_item("c", "C")]);
        let new = div(vec![keyed_item("c", "C"), keyed_item("a", "A"), keyed_item("b", "B")]);

        let patches = diff(&old, &new);
        assert!(patches.is_empty(), "reorder of unchanged keyed items: {patches:?}");
    }

    #[test]
    fn keyed_content_change_follows_the_key() {
        let old = div(vec![keyed_item("a", "A"), keyed_item("b", "B")]);
        let new = div(vec![keyed_item("b", "B2"), keyed_item("a", "A")]);

        let patches = diff(&old, &new);
        // Only b's text changed; the edit targets b's position in the new tree.
        assert_eq!(patches, vec![Patch::update_text("0.0.0", "B2")]);
    }

    #[test]
    fn appended_child_is_inserted() {
        let old = div(vec![Node::text("x")]);
        let new = div(vec![Node::text("x"), Node::from(Element::new("p"))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].kind, PatchKind::Insert);
        assert_eq!(patches[0].id, "0.1");
        assert_eq!(patches[0].html.as_deref(), Some("<p data-weft-id=\"0.1\"></p>"));
    }

    #[test]
    fn dropped_keyed_child_is_removed_by_identifier() {
        let old = div(vec![keyed_item("a", "A"), keyed_item("b", "B")]);
        let new = div(vec![keyed_item("a", "A")]);

        let patches = diff(&old, &new);
        assert_eq!(patches, vec![Patch::remove("b")]);
    }

    #[test]
    fn trailing_unkeyed_child_is_not_removed() {
        // Removal tracking, like reordering, requires explicit identifiers:
        // the sweep after child reconciliation only covers identified
        // children, so an unkeyed trailing child produces no edit.
        let old = div(vec![Node::from(Element::new("p")), Node::from(Element::new("span"))]);
        let new = div(vec![Node::from(Element::new("p"))]);

        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn inserted_subtree_renders_with_real_addresses() {
        let old = div(vec![]);
        let new = div(vec![Node::from(Element::new("ul").child(Element::new("li")))]);

        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        let html = patches[0].html.as_deref().expect("markup payload");
        assert!(html.contains("data-weft-id=\"0.0\""));
        assert!(html.contains("data-weft-id=\"0.0.0\""));
    }
}
