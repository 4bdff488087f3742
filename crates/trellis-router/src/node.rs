//! Radix tree node implementation.
//!
//! Every node stands for one path segment. Children are split by kind so
//! that matching can try them in priority order: static, then
//! placeholders (in registration order), then catch-all wildcards.

use http::Method;

use crate::method_table::MethodTable;
use crate::params::Params;
use crate::pattern::Segment;

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    segment: Segment,
    methods: Option<MethodTable<T>>,
    /// Sorted by segment text for binary search
    static_children: Vec<Node<T>>,
    param_children: Vec<Node<T>>,
    wildcard_children: Vec<Node<T>>,
}

/// An endpoint reached while matching, with the captures collected on the way.
pub(crate) type Candidate<'a, T> = (&'a MethodTable<T>, Params);

impl<T> Node<T> {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
            wildcard_children: Vec::new(),
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new(Segment::Static(String::new()))
    }

    /// The segment this node represents.
    #[must_use]
    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// The endpoint's method table, if a route ends here.
    #[must_use]
    pub fn methods(&self) -> Option<&MethodTable<T>> {
        self.methods.as_ref()
    }

    /// Inserts a payload for `method` at the node addressed by `segments`.
    ///
    /// Returns the payload back if the endpoint already serves `method`.
    pub fn insert(&mut self, segments: &[Segment], method: Method, payload: T) -> Result<(), T> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodTable::new)
                .insert(method, payload);
        };

        let child = match segment {
            Segment::Static(text) => {
                match self
                    .static_children
                    .binary_search_by(|c| static_text(c).cmp(text.as_str()))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children.insert(i, Node::new(segment.clone()));
                        &mut self.static_children[i]
                    }
                }
            }
            Segment::Param { .. } => child_for(&mut self.param_children, segment),
            Segment::Wildcard(_) => child_for(&mut self.wildcard_children, segment),
        };
        child.insert(remaining, method, payload)
    }

    /// Collects every endpoint matching `path`, highest priority first.
    pub(crate) fn candidates(&self, path: &str) -> Vec<Candidate<'_, T>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let mut out = Vec::new();
        self.collect(&segments, &mut params, &mut out);
        out
    }

    fn collect<'a>(&'a self, segments: &[&str], params: &mut Params, out: &mut Vec<Candidate<'a, T>>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            if let Some(methods) = &self.methods {
                out.push((methods, params.clone()));
            }
            return;
        };

        if let Some(child) = self.find_static_child(segment) {
            child.collect(remaining, params, out);
        }

        for child in &self.param_children {
            if let Segment::Param { name, constraint } = &child.segment {
                if constraint.as_ref().map_or(true, |c| c.is_match(segment)) {
                    let mark = params.len();
                    params.push(name.clone(), segment);
                    child.collect(remaining, params, out);
                    params.truncate(mark);
                }
            }
        }

        for child in &self.wildcard_children {
            if let (Segment::Wildcard(name), Some(methods)) = (&child.segment, &child.methods) {
                let mut captured = params.clone();
                captured.push(name.clone(), segments.join("/"));
                out.push((methods, captured));
            }
        }
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| static_text(c).cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn static_text<T>(node: &Node<T>) -> &str {
    match &node.segment {
        Segment::Static(text) => text,
        _ => "",
    }
}

fn child_for<'a, T>(children: &'a mut Vec<Node<T>>, segment: &Segment) -> &'a mut Node<T> {
    let index = match children.iter().position(|c| c.segment == *segment) {
        Some(i) => i,
        None => {
            children.push(Node::new(segment.clone()));
            children.len() - 1
        }
    };
    &mut children[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::RoutePattern;

    fn insert(node: &mut Node<&'static str>, pattern: &str, method: Method, payload: &'static str) {
        let parsed = RoutePattern::parse(pattern).unwrap();
        node.insert(parsed.segments(), method, payload).unwrap();
    }

    fn first<'a>(node: &'a Node<&'static str>, path: &str) -> Option<Candidate<'a, &'static str>> {
        node.candidates(path).into_iter().next()
    }

    #[test]
    fn test_root_endpoint() {
        let mut root = Node::root();
        insert(&mut root, "/", Method::GET, "home");

        let (methods, params) = first(&root, "/").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"home"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_static_beats_param() {
        let mut root = Node::root();
        insert(&mut root, "/users/{id}", Method::GET, "show");
        insert(&mut root, "/users/me", Method::GET, "me");

        let candidates = root.candidates("/users/me");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].0.get(&Method::GET), Some(&"me"));
        assert_eq!(candidates[1].1.get("id"), Some("me"));
    }

    #[test]
    fn test_constraint_filters_candidates() {
        let mut root = Node::root();
        insert(&mut root, "/posts/{id:\\d+}", Method::GET, "by_id");
        insert(&mut root, "/posts/{slug}", Method::GET, "by_slug");

        let (methods, params) = first(&root, "/posts/42").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"by_id"));
        assert_eq!(params.get("id"), Some("42"));

        let (methods, params) = first(&root, "/posts/hello").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"by_slug"));
        assert_eq!(params.get("slug"), Some("hello"));
    }

    #[test]
    fn test_backtracking_drops_stale_captures() {
        let mut root = Node::root();
        insert(&mut root, "/{a}/x", Method::GET, "ax");
        insert(&mut root, "/{b:\\d+}/y", Method::GET, "by");

        let (methods, params) = first(&root, "/1/y").unwrap();
        assert_eq!(methods.get(&Method::GET), Some(&"by"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("a"), None);
    }

    #[test]
    fn test_wildcard_captures_rest() {
        let mut root = Node::root();
        insert(&mut root, "/files/*path", Method::GET, "file");

        let (_, params) = first(&root, "/files/a/b/c.txt").unwrap();
        assert_eq!(params.get("path"), Some("a/b/c.txt"));
        assert!(root.candidates("/files").is_empty());
    }

    #[test]
    fn test_duplicate_method_returns_payload() {
        let mut root = Node::root();
        insert(&mut root, "/a", Method::GET, "first");
        let parsed = RoutePattern::parse("/a").unwrap();
        assert_eq!(root.insert(parsed.segments(), Method::GET, "second"), Err("second"));
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        insert(&mut root, "/users", Method::GET, "list");
        assert!(root.candidates("/posts").is_empty());
        assert!(root.candidates("/users/1").is_empty());
    }
}
