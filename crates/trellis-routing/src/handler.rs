//! Route handler references and the action registry.
//!
//! A route is declared with a [`HandlerRef`]: either a function, or the
//! name of a controller action registered in an [`ActionRegistry`].
//! Strings stay [`HandlerRef::Named`] until the collector has applied the
//! group namespace; tuples and [`HandlerRef::action`] are taken as written.
//!
//! ```rust
//! use trellis_routing::HandlerRef;
//!
//! let action = HandlerRef::from("PostsController@show");
//! assert_eq!(action.to_string(), "PostsController@show");
//! assert!(matches!(action.parsed(), HandlerRef::Action { .. }));
//!
//! let invokable = HandlerRef::from("HomeController").parsed();
//! assert!(matches!(invokable, HandlerRef::Invokable(_)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use trellis_core::{handler_fn, HandlerFn, HandlerResult, Invocation};

/// What a route was declared to call.
#[derive(Clone)]
pub enum HandlerRef {
    /// A function, statically typed to produce a response.
    Function(HandlerFn),
    /// `controller@action`.
    Action {
        /// Controller name
        controller: String,
        /// Action name
        action: String,
    },
    /// A controller whose [`ActionRegistry::INVOKE`] action handles the route.
    Invokable(String),
    /// A `"Controller@action"` or `"Controller"` string, not yet split.
    Named(String),
}

impl HandlerRef {
    /// Wraps an async closure.
    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Function(handler_fn(f))
    }

    /// References `controller@action`.
    pub fn action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Action {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Splits a [`Named`](Self::Named) reference. `"Controller@action"`
    /// names an action; a leading `@` or no `@` at all names an invokable
    /// controller. Other references are returned unchanged.
    #[must_use]
    pub fn parsed(self) -> Self {
        let Self::Named(raw) = self else {
            return self;
        };
        match raw.split_once('@') {
            Some((controller, action)) if !controller.is_empty() => {
                Self::action(controller, action)
            }
            _ => Self::Invokable(raw),
        }
    }

    /// Whether this reference was written as a string.
    #[must_use]
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// The controller this reference names, if any.
    #[must_use]
    pub fn controller(&self) -> Option<&str> {
        match self {
            Self::Function(_) => None,
            Self::Action { controller, .. } | Self::Invokable(controller) => Some(controller),
            Self::Named(raw) => match raw.split_once('@') {
                Some((controller, _)) if !controller.is_empty() => Some(controller),
                _ => Some(raw),
            },
        }
    }

    /// Prefixes the controller name with `namespace`.
    #[must_use]
    pub fn qualify(self, namespace: &str) -> Self {
        match self.parsed() {
            Self::Action { controller, action } => Self::Action {
                controller: format!("{namespace}{controller}"),
                action,
            },
            Self::Invokable(controller) => Self::Invokable(format!("{namespace}{controller}")),
            other => other,
        }
    }
}

impl From<&str> for HandlerRef {
    fn from(raw: &str) -> Self {
        Self::Named(raw.to_string())
    }
}

impl From<String> for HandlerRef {
    fn from(raw: String) -> Self {
        Self::Named(raw)
    }
}

impl From<(&str, &str)> for HandlerRef {
    fn from((controller, action): (&str, &str)) -> Self {
        Self::action(controller, action)
    }
}

impl From<HandlerFn> for HandlerRef {
    fn from(f: HandlerFn) -> Self {
        Self::Function(f)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("<function>"),
            Self::Action { controller, action } => write!(f, "{controller}@{action}"),
            Self::Invokable(controller) | Self::Named(controller) => f.write_str(controller),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.to_string()).finish()
    }
}

/// The declared result of a dynamically registered action.
///
/// Functions are typed `Invocation -> Response` by the compiler. Actions
/// registered at runtime (from scripts or configuration) carry a
/// declaration instead, checked when the route is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReturnType {
    /// The response type itself.
    #[default]
    Response,
    /// A type known to implement the response contract.
    ResponseLike(String),
    /// A response that may be absent.
    Nullable(String),
    /// No declaration.
    Missing,
    /// Anything else.
    Other(String),
}

impl ReturnType {
    /// Whether a route may use an action declared with this type.
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response | Self::ResponseLike(_))
    }
}

/// A registered controller action.
#[derive(Clone)]
pub struct Action {
    handler: HandlerFn,
    returns: ReturnType,
}

impl Action {
    /// The action function.
    #[must_use]
    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }

    /// The declared return type.
    #[must_use]
    pub fn returns(&self) -> &ReturnType {
        &self.returns
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("returns", &self.returns).finish_non_exhaustive()
    }
}

/// Controllers and their actions, looked up by name.
///
/// ```rust
/// use http::StatusCode;
/// use trellis_core::{Response, ResponseExt};
/// use trellis_routing::ActionRegistry;
///
/// let mut registry = ActionRegistry::new();
/// registry.action("PostsController", "index", |_inv| async {
///     Ok(Response::text(StatusCode::OK, "posts"))
/// });
/// assert!(registry.has_controller("PostsController"));
/// assert!(registry.get("PostsController", "index").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    controllers: HashMap<String, HashMap<String, Action>>,
}

impl ActionRegistry {
    /// Action name used for invokable controllers.
    pub const INVOKE: &'static str = "__invoke";

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action returning a response.
    pub fn action<F, Fut>(
        &mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
        f: F,
    ) -> &mut Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(controller, action, handler_fn(f), ReturnType::Response)
    }

    /// Registers the action of an invokable controller.
    pub fn invokable<F, Fut>(&mut self, controller: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(controller, Self::INVOKE, handler_fn(f), ReturnType::Response)
    }

    /// Registers an action with an explicit return declaration.
    pub fn insert(
        &mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
        handler: HandlerFn,
        returns: ReturnType,
    ) -> &mut Self {
        self.controllers
            .entry(controller.into())
            .or_default()
            .insert(action.into(), Action { handler, returns });
        self
    }

    /// Whether any action is registered for `controller`.
    #[must_use]
    pub fn has_controller(&self, controller: &str) -> bool {
        self.controllers.contains_key(controller)
    }

    /// Looks an action up.
    #[must_use]
    pub fn get(&self, controller: &str, action: &str) -> Option<&Action> {
        self.controllers.get(controller)?.get(action)
    }

    /// Number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use trellis_core::{Response, ResponseExt};

    #[test]
    fn test_parse_action_string() {
        match HandlerRef::from("UserController@show").parsed() {
            HandlerRef::Action { controller, action } => {
                assert_eq!(controller, "UserController");
                assert_eq!(action, "show");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_leading_at_is_not_split() {
        assert!(matches!(
            HandlerRef::from("@show").parsed(),
            HandlerRef::Invokable(name) if name == "@show"
        ));
    }

    #[test]
    fn test_only_first_at_splits() {
        let handler = HandlerRef::from("Mail@send@now");
        assert_eq!(handler.controller(), Some("Mail"));
        assert_eq!(handler.to_string(), "Mail@send@now");
    }

    #[test]
    fn test_qualify() {
        let handler = HandlerRef::from("PostsController@index").qualify("admin::");
        assert_eq!(handler.to_string(), "admin::PostsController@index");

        let function = HandlerRef::function(|_| async { Ok(Response::empty(StatusCode::OK)) });
        assert_eq!(function.qualify("admin::").to_string(), "<function>");
    }

    #[test]
    fn test_strings_are_named_until_parsed() {
        let named = HandlerRef::from("Posts@index");
        assert!(named.is_named());
        assert_eq!(named.controller(), Some("Posts"));
        assert!(!named.parsed().is_named());

        let tuple = HandlerRef::from(("Posts", "index"));
        assert!(!tuple.is_named());
        assert_eq!(tuple.to_string(), "Posts@index");
        assert_eq!(HandlerRef::from("Home").controller(), Some("Home"));
    }

    #[test]
    fn test_return_types() {
        assert!(ReturnType::Response.is_response());
        assert!(ReturnType::ResponseLike("JsonResponse".into()).is_response());
        assert!(!ReturnType::Nullable("Response".into()).is_response());
        assert!(!ReturnType::Missing.is_response());
        assert!(!ReturnType::Other("String".into()).is_response());
    }

    #[test]
    fn test_registry() {
        let mut registry = ActionRegistry::new();
        registry
            .action("Posts", "index", |_| async { Ok(Response::empty(StatusCode::OK)) })
            .invokable("Home", |_| async { Ok(Response::empty(StatusCode::OK)) });

        assert_eq!(registry.len(), 2);
        assert!(registry.get("Posts", "index").is_some());
        assert!(registry.get("Posts", "show").is_none());
        assert!(registry.get("Home", ActionRegistry::INVOKE).is_some());
        assert_eq!(
            registry.get("Posts", "index").map(Action::returns),
            Some(&ReturnType::Response)
        );
    }
}
