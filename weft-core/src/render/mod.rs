//! Renderer
//!
//! Serializes a tree snapshot to markup, tagging every element with its
//! address so later edits can target it. Rendering is a pure function of the
//! tree: no shared state, safe to call concurrently.

mod html;

pub use html::{html, html_at};
pub(crate) use html::{element_at, push_escaped};
