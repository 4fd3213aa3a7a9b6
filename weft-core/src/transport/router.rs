//! Routing
//!
//! Resolves a request path to a page function and a route-parameter mapping.
//! Patterns are slash-separated segments; a `:name` segment captures the
//! corresponding path segment into the parameter map. First registered match
//! wins. Layouts are registered by path prefix and wrap the page content on
//! the HTTP page-load path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::ui::Node;

use super::session::PageFn;

/// Wraps page content with surrounding markup on the page-load path.
pub type LayoutFn = Arc<dyn Fn(&mut Context, Node) -> Node + Send + Sync>;

enum Segment {
    Literal(String),
    Param(String),
}

struct Route {
    segments: Vec<Segment>,
    page: PageFn,
}

/// Pattern-based URL router.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    layouts: Vec<(String, LayoutFn)>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page under a pattern such as `/users/:id`.
    pub fn add(&mut self, pattern: &str, page: PageFn) {
        let segments = split_path(pattern)
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();
        self.routes.push(Route { segments, page });
    }

    /// Register a layout applied to every path under `prefix`.
    pub fn add_layout(&mut self, prefix: &str, layout: LayoutFn) {
        self.layouts.push((prefix.to_string(), layout));
    }

    /// Resolve `path` to a page and its captured parameters.
    pub fn match_path(&self, path: &str) -> Option<(PageFn, HashMap<String, String>)> {
        let segments = split_path(path);
        for route in &self.routes {
            if let Some(params) = match_route(route, &segments) {
                return Some((Arc::clone(&route.page), params));
            }
        }
        None
    }

    /// All layouts whose prefix covers `path`, in registration order.
    pub fn layouts_for(&self, path: &str) -> Vec<LayoutFn> {
        self.layouts
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, layout)| Arc::clone(layout))
            .collect()
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn match_route(route: &Route, segments: &[&str]) -> Option<HashMap<String, String>> {
    if route.segments.len() != segments.len() {
        return None;
    }
    let mut params = HashMap::new();
    for (pattern, actual) in route.segments.iter().zip(segments) {
        match pattern {
            Segment::Param(name) => {
                params.insert(name.clone(), (*actual).to_string());
            }
            Segment::Literal(literal) if literal == actual => {}
            Segment::Literal(_) => return None,
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Element;

    fn page(tag: &'static str) -> PageFn {
        Arc::new(move |_: &mut Context| Node::from(Element::new(tag)))
    }

    #[test]
    fn root_pattern_matches_root_path() {
        let mut router = Router::new();
        router.add("/", page("main"));

        assert!(router.match_path("/").is_some());
        assert!(router.match_path("").is_some());
        assert!(router.match_path("/other").is_none());
    }

    #[test]
    fn literal_segments_must_match() {
        let mut router = Router::new();
        router.add("/about", page("div"));

        assert!(router.match_path("/about").is_some());
        assert!(router.match_path("/about/").is_some());
        assert!(router.match_path("/abouts").is_none());
        assert!(router.match_path("/about/team").is_none());
    }

    #[test]
    fn param_segments_capture_values() {
        let mut router = Router::new();
        router.add("/users/:id/posts/:post", page("div"));

        let (_, params) = router.match_path("/users/42/posts/7").expect("match");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.get("post").map(String::as_str), Some("7"));
    }

    #[test]
    fn first_registered_route_wins() {
        let mut router = Router::new();
        router.add("/users/me", page("section"));
        router.add("/users/:id", page("div"));

        let (matched, params) = router.match_path("/users/me").expect("match");
        let mut context = Context::new();
        let tree = matched(&mut context);
        assert!(matches!(tree, Node::Element(ref e) if e.tag == "section"));
        assert!(params.is_empty());
    }

    #[test]
    fn layouts_match_by_prefix() {
        let mut router = Router::new();
        router.add_layout("/", Arc::new(|_, child| Node::from(Element::new("main").child(child))));
        router.add_layout(
            "/admin",
            Arc::new(|_, child| Node::from(Element::new("aside").child(child))),
        );

        assert_eq!(router.layouts_for("/").len(), 1);
        assert_eq!(router.layouts_for("/admin/users").len(), 2);
    }
}
