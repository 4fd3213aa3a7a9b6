//! Patch Types
//!
//! A patch is one atomic instruction telling the client how to mutate its
//! rendered document to match a new tree snapshot. Patches serialize to the
//! wire exactly as the client applier consumes them:
//!
//! ```json
//! {"type":"attrs","id":"0.2","attrs":{"class":"done","title":""}}
//! ```
//!
//! In an `attrs` payload the empty string is the delete sentinel: the client
//! removes the attribute instead of setting it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The kind of document modification a patch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    /// Replace the entire element with new markup.
    Replace,
    /// Update attributes in place.
    Attrs,
    /// Update text content.
    Text,
    /// Insert a new element.
    Insert,
    /// Remove the element.
    Remove,
}

/// A single document modification, addressed by path or explicit identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// What to do.
    #[serde(rename = "type")]
    pub kind: PatchKind,
    /// Target address: a path (`0.2.1`) or an explicit identifier.
    pub id: String,
    /// New markup, for `replace` and `insert`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Changed attributes, for `attrs`. Empty-string values mean delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<IndexMap<String, String>>,
    /// New text content, for `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Patch {
    /// A `replace` patch carrying fresh markup for the target.
    pub fn replace(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            kind: PatchKind::Replace,
            id: id.into(),
            html: Some(html.into()),
            attrs: None,
            text: None,
        }
    }

    /// An `insert` patch carrying markup for a node absent from the old tree.
    pub fn insert(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            kind: PatchKind::Insert,
            id: id.into(),
            html: Some(html.into()),
            attrs: None,
            text: None,
        }
    }

    /// A `remove` patch for a node absent from the new tree.
    pub fn remove(id: impl Into<String>) -> Self {
        Self {
            kind: PatchKind::Remove,
            id: id.into(),
            html: None,
            attrs: None,
            text: None,
        }
    }

    /// An `attrs` patch carrying changed attribute values.
    pub fn update_attrs(id: impl Into<String>, attrs: IndexMap<String, String>) -> Self {
        Self {
            kind: PatchKind::Attrs,
            id: id.into(),
            html: None,
            attrs: Some(attrs),
            text: None,
        }
    }

    /// A `text` patch carrying new text content.
    pub fn update_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: PatchKind::Text,
            id: id.into(),
            html: None,
            attrs: None,
            text: Some(text.into()),
        }
    }
}
