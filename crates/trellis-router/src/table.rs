//! The path-matching table.

use std::collections::HashSet;

use http::Method;

use crate::error::RouteError;
use crate::method_table::MethodTable;
use crate::node::Node;
use crate::pattern::{expand_optional, RoutePattern};
use crate::Dispatch;

/// A radix tree mapping `(method, path pattern)` pairs to payloads.
///
/// # Example
///
/// ```rust
/// use trellis_router::{Dispatch, RouteTable};
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.add(Method::GET, "/users[/{id:\\d+}]", "users").unwrap();
///
/// match table.dispatch(&Method::GET, "/users/42") {
///     Dispatch::Found { payload, params } => {
///         assert_eq!(*payload, "users");
///         assert_eq!(params.get("id"), Some("42"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
///
/// # Route Priority
///
/// When several patterns match a path, static segments win over
/// placeholders and placeholders win over wildcards. Placeholders on the
/// same level are tried in registration order. The first candidate that
/// serves the request method is selected; a `HEAD` request falls back to
/// the `GET` payload when no candidate serves `HEAD` itself.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    root: Node<T>,
    /// `(method, canonical pattern)` pairs already registered
    registered: HashSet<(Method, String)>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            registered: HashSet::new(),
        }
    }

    /// Registers `payload` for `method` on one concrete pattern.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &RoutePattern,
        payload: T,
    ) -> Result<(), RouteError> {
        let key = (method, pattern.canonical());
        if self.registered.contains(&key) {
            return Err(RouteError::DuplicateRoute {
                method: key.0,
                pattern: pattern.as_str().to_string(),
            });
        }

        let method = key.0.clone();
        self.root
            .insert(pattern.segments(), method.clone(), payload)
            .map_err(|_| RouteError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            })?;
        self.registered.insert(key);
        Ok(())
    }

    /// Number of `(method, concrete pattern)` registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Matches a request against the table.
    #[must_use]
    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch<'_, T> {
        let candidates = self.root.candidates(path);
        if candidates.is_empty() {
            return Dispatch::NotFound;
        }

        let served = if candidates.iter().any(|(m, _)| m.contains(method)) {
            Some(method.clone())
        } else if *method == Method::HEAD
            && candidates.iter().any(|(m, _)| m.contains(&Method::GET))
        {
            Some(Method::GET)
        } else {
            None
        };

        if let Some(served) = served {
            for (methods, params) in candidates {
                if let Some(payload) = methods.get(&served) {
                    return Dispatch::Found { payload, params };
                }
            }
            return Dispatch::NotFound;
        }

        Dispatch::MethodNotAllowed {
            allowed: union_allowed(candidates.iter().map(|(m, _)| *m)),
        }
    }

    /// Methods served for `path`, across every matching pattern.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        union_allowed(self.root.candidates(path).into_iter().map(|(m, _)| m))
    }
}

fn union_allowed<'a, T: 'a>(tables: impl Iterator<Item = &'a MethodTable<T>>) -> Vec<Method> {
    let mut allowed: Vec<Method> = Vec::new();
    for table in tables {
        for method in table.allowed_methods() {
            if !allowed.contains(&method) {
                allowed.push(method);
            }
        }
    }
    allowed
}

impl<T: Clone> RouteTable<T> {
    /// Registers `payload` for `method` on every form of a pattern that may
    /// contain optional brackets.
    pub fn add(&mut self, method: Method, pattern: &str, payload: T) -> Result<(), RouteError> {
        for form in expand_optional(pattern)? {
            let parsed = RoutePattern::parse(&form)?;
            self.insert(method.clone(), &parsed, payload.clone())?;
        }
        Ok(())
    }

    /// Registers `payload` for every method on every form of `pattern`.
    ///
    /// Either all registrations succeed or the table is left unchanged.
    pub fn add_all(
        &mut self,
        methods: &[Method],
        pattern: &str,
        payload: T,
    ) -> Result<(), RouteError> {
        let forms = expand_optional(pattern)?
            .iter()
            .map(|form| RoutePattern::parse(form))
            .collect::<Result<Vec<_>, _>>()?;

        let mut pending = HashSet::new();
        for method in methods {
            for form in &forms {
                let key = (method.clone(), form.canonical());
                if self.registered.contains(&key) || !pending.insert(key) {
                    return Err(RouteError::DuplicateRoute {
                        method: method.clone(),
                        pattern: form.as_str().to_string(),
                    });
                }
            }
        }

        for method in methods {
            for form in &forms {
                self.insert(method.clone(), form, payload.clone())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/status", "status").unwrap();
        table.add(Method::GET, "/users/{id}", "show").unwrap();
        table.add(Method::PUT, "/users/{id}", "update").unwrap();
        table.add(Method::POST, "/users", "store").unwrap();
        table
    }

    #[test]
    fn test_found_with_params() {
        match table().dispatch(&Method::GET, "/users/42") {
            Dispatch::Found { payload, params } => {
                assert_eq!(*payload, "show");
                assert_eq!(params.get("id"), Some("42"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_method_not_allowed_lists_exact_methods() {
        match table().dispatch(&Method::DELETE, "/users/42") {
            Dispatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::PUT]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        assert!(matches!(
            table().dispatch(&Method::GET, "/unknown"),
            Dispatch::NotFound
        ));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        match table().dispatch(&Method::HEAD, "/status") {
            Dispatch::Found { payload, .. } => assert_eq!(*payload, "status"),
            other => panic!("unexpected {other:?}"),
        }
        // POST-only endpoints do not serve HEAD
        assert!(matches!(
            table().dispatch(&Method::HEAD, "/users"),
            Dispatch::MethodNotAllowed { .. }
        ));
    }

    #[test]
    fn test_method_falls_through_to_lower_priority_pattern() {
        let mut table = RouteTable::new();
        table.add(Method::POST, "/users/me", "me").unwrap();
        table.add(Method::GET, "/users/{id}", "show").unwrap();

        match table.dispatch(&Method::GET, "/users/me") {
            Dispatch::Found { payload, params } => {
                assert_eq!(*payload, "show");
                assert_eq!(params.get("id"), Some("me"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(table.allowed_methods("/users/me"), vec![Method::POST, Method::GET]);
    }

    #[test]
    fn test_optional_segments_register_every_form() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/archive[/{year}[/{month}]]", "archive").unwrap();
        assert_eq!(table.len(), 3);

        for path in ["/archive", "/archive/2024", "/archive/2024/05"] {
            assert!(matches!(
                table.dispatch(&Method::GET, path),
                Dispatch::Found { .. }
            ));
        }
        match table.dispatch(&Method::GET, "/archive/2024/05") {
            Dispatch::Found { params, .. } => {
                assert_eq!(params.get("year"), Some("2024"));
                assert_eq!(params.get("month"), Some("05"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut table = table();
        let err = table.add(Method::GET, "/users/{user}", "again").unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { method, .. } if method == Method::GET));

        // a different method on the same pattern is fine
        table.add(Method::DELETE, "/users/{user}", "destroy").unwrap();
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert!(matches!(
            table().dispatch(&Method::GET, "/status/"),
            Dispatch::Found { .. }
        ));
    }

    #[test]
    fn test_add_all_is_atomic() {
        let mut table = RouteTable::new();
        table.add(Method::PUT, "/items/{id}", 0).unwrap();

        let err = table
            .add_all(&[Method::GET, Method::PUT], "/items/{item}", 1)
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { method, .. } if method == Method::PUT));
        assert_eq!(table.len(), 1);
        assert!(matches!(table.dispatch(&Method::GET, "/items/3"), Dispatch::MethodNotAllowed { .. }));

        table.add_all(&[Method::GET, Method::POST], "/items[/{id}]", 2).unwrap();
        assert_eq!(table.len(), 5);
    }
}
