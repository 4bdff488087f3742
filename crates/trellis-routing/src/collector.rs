//! Route registration.
//!
//! ```rust
//! use http::StatusCode;
//! use trellis_core::{Response, ResponseExt};
//! use trellis_routing::{GroupParameters, HandlerRef, RouteCollector};
//!
//! # fn main() -> trellis_core::TrellisResult<()> {
//! let mut routes = RouteCollector::default();
//! routes.group(GroupParameters::prefixed("/api").attribute("version", 1), |api| {
//!     api.get("/status", HandlerRef::function(|_| async {
//!         Response::json(StatusCode::OK, &serde_json::json!({ "status": "UP" }))
//!     }))?
//!     .set_name("status")?;
//!     Ok(())
//! })?;
//!
//! assert_eq!(routes.routes()[0].path(), "/api/status");
//! let router = routes.router()?;
//! assert_eq!(router.url_for("status", &[])?, "/api/status");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use http::{Method, StatusCode};
use trellis_core::di::Container;
use trellis_core::{Response, ResponseExt, TrellisResult};
use trellis_middleware::{MiddlewarePipeFactory, MiddlewareResolver};
use trellis_router::{normalize_path, RouteTable};

use crate::compiler::RouteCompiler;
use crate::group::GroupParameters;
use crate::handler::{ActionRegistry, HandlerRef};
use crate::invoker::RouteInvoker;
use crate::resolver::{LazyRouteHandlerResolver, RegistryHandlerResolver, RouteHandlerResolver};
use crate::route::Route;
use crate::router::{Router, RouterFactory};

/// Methods registered by [`RouteCollector::any`].
pub const ANY_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::HEAD,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// The seven conventional resource actions: name, method, path suffix.
const RESOURCE_ACTIONS: [(&str, Method, &str); 7] = [
    ("index", Method::GET, "/"),
    ("create", Method::GET, "/create"),
    ("store", Method::POST, "/"),
    ("show", Method::GET, "/{id}"),
    ("edit", Method::GET, "/{id}/edit"),
    ("update", Method::PUT, "/{id}"),
    ("destroy", Method::DELETE, "/{id}"),
];

/// Which actions [`RouteCollector::resource`] registers.
///
/// `only` takes precedence over `except`. Each action is tested on its
/// own, so `only(["index", "show"])` registers both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    only: Option<Vec<String>>,
    except: Option<Vec<String>>,
}

impl ResourceOptions {
    /// All seven actions.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Only the named actions.
    #[must_use]
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(actions.into_iter().map(Into::into).collect()),
            except: None,
        }
    }

    /// Every action except the named ones.
    #[must_use]
    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: None,
            except: Some(actions.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether `action` is registered.
    #[must_use]
    pub fn includes(&self, action: &str) -> bool {
        if let Some(only) = &self.only {
            only.iter().any(|a| a == action)
        } else if let Some(except) = &self.except {
            !except.iter().any(|a| a == action)
        } else {
            true
        }
    }
}

/// Accumulates routes and groups, then produces a [`Router`].
///
/// Every route is registered in the path table under each of its methods
/// and each concrete form of its pattern; the table payload is the route's
/// index in [`routes`](Self::routes).
pub struct RouteCollector {
    routes: Vec<Route>,
    table: RouteTable<usize>,
    current_prefix: String,
    current_parameters: GroupParameters,
    resolver: Arc<dyn RouteHandlerResolver>,
    compiler: RouteCompiler,
    router_factory: RouterFactory,
}

impl Default for RouteCollector {
    /// A collector resolving only function handlers, with no container.
    fn default() -> Self {
        Self::new(
            Arc::new(RegistryHandlerResolver::default()),
            RouteCompiler::default(),
            RouterFactory,
        )
    }
}

impl RouteCollector {
    /// Creates a collector.
    pub fn new(
        resolver: Arc<dyn RouteHandlerResolver>,
        compiler: RouteCompiler,
        router_factory: RouterFactory,
    ) -> Self {
        Self {
            routes: Vec::new(),
            table: RouteTable::new(),
            current_prefix: String::new(),
            current_parameters: GroupParameters::new(),
            resolver,
            compiler,
            router_factory,
        }
    }

    /// Parameters inherited by every route, as if the whole collector were
    /// wrapped in a group. A prefix becomes the base path of every route.
    #[must_use]
    pub fn with_parameters(mut self, mut parameters: GroupParameters) -> Self {
        if let Some(prefix) = parameters.take_prefix() {
            self.current_prefix = normalize_path(&prefix);
        }
        self.current_parameters = parameters;
        self
    }

    /// Registers a route for `methods`.
    ///
    /// The path is normalized and prefixed with the enclosing groups'
    /// prefixes. Controllers named by a string are prefixed with the group
    /// namespace unless the resolver already knows them; tuples and
    /// [`HandlerRef::action`] are used as written.
    ///
    /// # Errors
    ///
    /// - [`TrellisError::WrongRouteHandler`] from an eager resolver
    /// - [`TrellisError::InvalidRoute`] for a malformed or duplicate pattern
    ///
    /// [`TrellisError::WrongRouteHandler`]: trellis_core::TrellisError::WrongRouteHandler
    /// [`TrellisError::InvalidRoute`]: trellis_core::TrellisError::InvalidRoute
    pub fn add_route(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: impl Into<HandlerRef>,
    ) -> TrellisResult<&mut Route> {
        let mut path = format!("{}{}", self.current_prefix, normalize_path(path));
        if path.is_empty() {
            path.push('/');
        }

        let mut handler = handler.into();
        let namespace = self
            .current_parameters
            .namespace_value()
            .filter(|_| handler.is_named());
        if let Some(namespace) = namespace {
            let known = handler
                .controller()
                .map_or(true, |controller| self.resolver.knows_controller(controller));
            if !known {
                handler = handler.qualify(namespace);
            }
        }
        let handler = self.resolver.resolve(handler.parsed())?;

        let mut route = Route::new(methods.to_vec(), path.clone(), handler);
        for middleware in self.current_parameters.middlewares() {
            route.middleware(middleware.clone())?;
        }
        for (key, value) in self.current_parameters.attributes() {
            route.with_attribute(key.clone(), value.clone());
        }

        let index = self.routes.len();
        self.table.add_all(methods, &path, index)?;
        let verbs = methods.iter().map(Method::as_str).collect::<Vec<_>>().join("|");
        tracing::debug!(methods = %verbs, %path, "route registered");

        self.routes.push(route);
        Ok(&mut self.routes[index])
    }

    /// Registers a route for several methods.
    pub fn map(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: impl Into<HandlerRef>,
    ) -> TrellisResult<&mut Route> {
        self.add_route(methods, path, handler)
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, path: &str, handler: impl Into<HandlerRef>) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::GET], path, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, path: &str, handler: impl Into<HandlerRef>) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::POST], path, handler)
    }

    /// Registers a `PUT` route.
    pub fn put(&mut self, path: &str, handler: impl Into<HandlerRef>) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::PUT], path, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete(
        &mut self,
        path: &str,
        handler: impl Into<HandlerRef>,
    ) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::DELETE], path, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch(
        &mut self,
        path: &str,
        handler: impl Into<HandlerRef>,
    ) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::PATCH], path, handler)
    }

    /// Registers a `HEAD` route.
    pub fn head(&mut self, path: &str, handler: impl Into<HandlerRef>) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::HEAD], path, handler)
    }

    /// Registers an `OPTIONS` route.
    pub fn options(
        &mut self,
        path: &str,
        handler: impl Into<HandlerRef>,
    ) -> TrellisResult<&mut Route> {
        self.add_route(&[Method::OPTIONS], path, handler)
    }

    /// Registers a route for every method in [`ANY_METHODS`].
    pub fn any(&mut self, path: &str, handler: impl Into<HandlerRef>) -> TrellisResult<&mut Route> {
        self.add_route(&ANY_METHODS, path, handler)
    }

    /// Runs `callback` inside a group.
    ///
    /// A `prefix` in `parameters` is appended to the current prefix; the
    /// rest is merged over the current group parameters. Both are restored
    /// when `callback` returns, whether or not it succeeded.
    pub fn group<F>(&mut self, mut parameters: GroupParameters, callback: F) -> TrellisResult<()>
    where
        F: FnOnce(&mut Self) -> TrellisResult<()>,
    {
        let prefix = parameters.take_prefix().unwrap_or_default();
        self.add_group(&prefix, parameters, callback)
    }

    /// Runs `callback` with `prefix` and `parameters` in effect.
    pub fn add_group<F>(
        &mut self,
        prefix: &str,
        parameters: GroupParameters,
        callback: F,
    ) -> TrellisResult<()>
    where
        F: FnOnce(&mut Self) -> TrellisResult<()>,
    {
        let previous_prefix = self.current_prefix.clone();
        let previous_parameters = self.current_parameters.clone();

        self.current_prefix = format!("{previous_prefix}{}", normalize_path(prefix));
        self.current_parameters = previous_parameters.merge(parameters);

        let result = callback(self);

        self.current_prefix = previous_prefix;
        self.current_parameters = previous_parameters;
        result
    }

    /// Registers the conventional resource routes for `controller`.
    ///
    /// For `/posts` the routes are named `posts.index`, `posts.create`,
    /// `posts.store`, `posts.show`, `posts.edit`, `posts.update` and
    /// `posts.destroy`; nested paths such as `admin/posts` produce
    /// `admin.posts.index`.
    pub fn resource(
        &mut self,
        path: &str,
        controller: &str,
        options: &ResourceOptions,
    ) -> TrellisResult<()> {
        let path = path.trim_matches('/');
        let name_prefix = format!("{}.", path.replace('/', "."));

        self.group(GroupParameters::prefixed(path), |routes| {
            for (action, method, suffix) in &RESOURCE_ACTIONS {
                if !options.includes(action) {
                    continue;
                }
                routes
                    .add_route(&[method.clone()], suffix, HandlerRef::action(controller, *action))?
                    .set_name(format!("{name_prefix}{action}"))?;
            }
            Ok(())
        })
    }

    /// Registers one resource with all actions per `(path, controller)`.
    pub fn resources<'a, I>(&mut self, resources: I) -> TrellisResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (path, controller) in resources {
            self.resource(path, controller, &ResourceOptions::all())?;
        }
        Ok(())
    }

    /// Registers an `any` route answering with a redirect to `to`.
    pub fn redirect(
        &mut self,
        from: &str,
        to: impl Into<String>,
        status: StatusCode,
    ) -> TrellisResult<&mut Route> {
        let to = to.into();
        let handler = HandlerRef::function(move |_| {
            let to = to.clone();
            async move { Response::redirect(&to, status) }
        });
        self.any(from, handler)
    }

    /// Registers a `301 Moved Permanently` redirect.
    pub fn redirect_permanently(
        &mut self,
        from: &str,
        to: impl Into<String>,
    ) -> TrellisResult<&mut Route> {
        self.redirect(from, to, StatusCode::MOVED_PERMANENTLY)
    }

    /// Registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The path table built so far.
    #[must_use]
    pub fn data(&self) -> &RouteTable<usize> {
        &self.table
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Compiles every route and builds the router.
    ///
    /// Routes compiled by an earlier call are left as they are.
    pub fn router(&mut self) -> TrellisResult<Router> {
        for route in &mut self.routes {
            self.compiler.compile(route)?;
        }
        let router = self.router_factory.create(self);
        tracing::debug!(routes = router.len(), "router built");
        Ok(router)
    }
}

impl std::fmt::Debug for RouteCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCollector")
            .field("routes", &self.routes.len())
            .field("current_prefix", &self.current_prefix)
            .field("lazy", &self.resolver.is_lazy())
            .finish_non_exhaustive()
    }
}

/// Builds collectors wired to a container and an action registry.
#[derive(Debug, Clone, Default)]
pub struct RouteCollectorFactory {
    request_aliases: Vec<String>,
    lazy: bool,
    parameters: GroupParameters,
}

impl RouteCollectorFactory {
    /// A factory producing eager collectors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request aliases bound by the route invoker.
    #[must_use]
    pub fn with_request_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Defers handler resolution to route compilation.
    #[must_use]
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Parameters applied to every route, such as a default namespace.
    #[must_use]
    pub fn with_parameters(mut self, parameters: GroupParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Creates a collector.
    ///
    /// Named middleware and handler injections are resolved through
    /// `container`; controller actions through `registry`.
    pub fn create(
        &self,
        container: Arc<Container>,
        registry: Arc<ActionRegistry>,
    ) -> TrellisResult<RouteCollector> {
        let eager: Arc<dyn RouteHandlerResolver> = Arc::new(RegistryHandlerResolver::new(registry));
        let resolver: Arc<dyn RouteHandlerResolver> = if self.lazy {
            Arc::new(LazyRouteHandlerResolver::new(eager)?)
        } else {
            eager
        };

        let compiler = RouteCompiler::new(
            MiddlewarePipeFactory::new(MiddlewareResolver::with_container(Arc::clone(&container))),
            RouteInvoker::new()
                .with_aliases(self.request_aliases.clone())
                .with_container(container),
        );
        Ok(RouteCollector::new(resolver, compiler, RouterFactory).with_parameters(self.parameters.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::TrellisError;

    fn ok() -> HandlerRef {
        HandlerRef::function(|_| async { Ok(Response::empty(StatusCode::OK)) })
    }

    fn summary(routes: &RouteCollector) -> Vec<(String, String, String)> {
        routes
            .routes()
            .iter()
            .map(|r| {
                let methods = r.methods().iter().map(Method::as_str).collect::<Vec<_>>().join("|");
                (methods, r.path().to_string(), r.name().to_string())
            })
            .collect()
    }

    #[test]
    fn test_paths_are_normalized() {
        let mut routes = RouteCollector::default();
        routes.get("users/", ok()).unwrap();
        routes.get("/", ok()).unwrap();
        // "" normalizes to "/", which is taken.
        routes.get("", ok()).unwrap_err();

        let paths: Vec<_> = routes.routes().iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/users", "/"]);
    }

    #[test]
    fn test_nested_groups_concatenate_prefixes() {
        let mut routes = RouteCollector::default();
        routes
            .group(GroupParameters::prefixed("api/"), |api| {
                api.group(GroupParameters::prefixed("/v1"), |v1| {
                    v1.get("/users/{id}", ok())?;
                    v1.get("/", ok())?;
                    Ok(())
                })?;
                api.get("status", ok())?;
                Ok(())
            })
            .unwrap();
        routes.get("/after", ok()).unwrap();

        let paths: Vec<_> = routes.routes().iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/api/v1/users/{id}", "/api/v1", "/api/status", "/after"]);
    }

    #[test]
    fn test_group_parameters_do_not_leak() {
        let mut routes = RouteCollector::default();
        routes
            .group(
                GroupParameters::new().middleware("auth").attribute("area", "admin"),
                |admin| {
                    admin.group(GroupParameters::new().middleware("audit"), |inner| {
                        inner.get("/inner", ok())?;
                        Ok(())
                    })?;
                    admin.get("/outer", ok())?;
                    Ok(())
                },
            )
            .unwrap();
        routes
            .group(GroupParameters::new().middleware("web"), |web| {
                web.get("/sibling", ok())?;
                Ok(())
            })
            .unwrap();

        let counts: Vec<_> = routes.routes().iter().map(|r| r.middlewares().len()).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(routes.routes()[0].attribute("area"), Some(&serde_json::json!("admin")));
        assert!(routes.routes()[2].attribute("area").is_none());
    }

    #[test]
    fn test_group_state_restored_on_error() {
        let mut routes = RouteCollector::default();
        let result = routes.group(GroupParameters::prefixed("/broken"), |g| {
            g.get("/{id}/{id}", ok())?;
            Ok(())
        });
        assert!(matches!(result, Err(TrellisError::InvalidRoute(_))));

        routes.get("/fine", ok()).unwrap();
        assert_eq!(routes.routes().last().map(Route::path), Some("/fine"));
    }

    #[test]
    fn test_any_registers_every_method() {
        let mut routes = RouteCollector::default();
        routes.any("/anything", ok()).unwrap();
        assert_eq!(routes.routes()[0].methods(), &ANY_METHODS);
        assert_eq!(routes.data().len(), 7);
    }

    #[test]
    fn test_optional_segments_register_every_form() {
        let mut routes = RouteCollector::default();
        routes.get("/archive[/{year}]", ok()).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.data().len(), 2);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut routes = RouteCollector::default();
        routes.get("/users/{id}", ok()).unwrap();
        let err = routes.get("/users/{user}", ok()).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::InvalidRoute(trellis_router::RouteError::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_resource_registers_seven_routes() {
        let mut registry = ActionRegistry::new();
        for action in ["index", "create", "store", "show", "edit", "update", "destroy"] {
            registry.action("Posts", action, |_| async { Ok(Response::empty(StatusCode::OK)) });
        }
        let mut routes = RouteCollectorFactory::new()
            .create(Arc::new(Container::new()), Arc::new(registry))
            .unwrap();

        routes.resource("/posts", "Posts", &ResourceOptions::all()).unwrap();

        let expected = [
            ("GET", "/posts", "posts.index"),
            ("GET", "/posts/create", "posts.create"),
            ("POST", "/posts", "posts.store"),
            ("GET", "/posts/{id}", "posts.show"),
            ("GET", "/posts/{id}/edit", "posts.edit"),
            ("PUT", "/posts/{id}", "posts.update"),
            ("DELETE", "/posts/{id}", "posts.destroy"),
        ];
        let expected: Vec<_> = expected
            .iter()
            .map(|(m, p, n)| ((*m).to_string(), (*p).to_string(), (*n).to_string()))
            .collect();
        assert_eq!(summary(&routes), expected);
    }

    #[test]
    fn test_resource_only_and_except() {
        let mut routes = RouteCollectorFactory::new()
            .lazy(true)
            .create(Arc::new(Container::new()), Arc::new(ActionRegistry::new()))
            .unwrap();

        routes
            .resource("admin/posts/", "Posts", &ResourceOptions::only(["index", "show"]))
            .unwrap();
        routes
            .resource("tags", "Tags", &ResourceOptions::except(["create", "edit"]))
            .unwrap();

        let names: Vec<_> = routes.routes().iter().map(Route::name).collect();
        assert_eq!(
            names,
            vec![
                "admin.posts.index",
                "admin.posts.show",
                "tags.index",
                "tags.store",
                "tags.show",
                "tags.update",
                "tags.destroy",
            ]
        );
    }

    #[test]
    fn test_namespace_prefixes_unknown_controllers() {
        let mut registry = ActionRegistry::new();
        registry.action("Shared", "ping", |_| async { Ok(Response::empty(StatusCode::OK)) });
        let mut routes = RouteCollectorFactory::new()
            .lazy(true)
            .create(Arc::new(Container::new()), Arc::new(registry))
            .unwrap();

        routes
            .group(GroupParameters::new().namespace("admin::"), |admin| {
                admin.get("/dashboard", "Dashboard@show")?;
                admin.get("/ping", "Shared@ping")?;
                admin.get("/fn", ok())?;
                Ok(())
            })
            .unwrap();
        routes.get("/home", "Home").unwrap();

        let handlers: Vec<_> = routes
            .routes()
            .iter()
            .map(|r| match r.handler() {
                crate::resolver::RouteHandler::Pending(p) => p.handler().to_string(),
                crate::resolver::RouteHandler::Resolved(_) => "resolved".to_string(),
            })
            .collect();
        assert_eq!(
            handlers,
            vec!["admin::Dashboard@show", "Shared@ping", "<function>", "Home"]
        );
    }

    #[test]
    fn test_namespace_skips_tuples_and_resources() {
        let mut routes = RouteCollectorFactory::new()
            .lazy(true)
            .create(Arc::new(Container::new()), Arc::new(ActionRegistry::new()))
            .unwrap();

        routes
            .group(GroupParameters::new().namespace("admin::"), |admin| {
                admin.get("/tuple", ("Tuple", "act"))?;
                admin.get("/string", "Tuple@act")?;
                admin.resource("/posts", "Posts", &ResourceOptions::only(["index"]))
            })
            .unwrap();

        let handlers: Vec<_> = routes
            .routes()
            .iter()
            .map(|r| match r.handler() {
                crate::resolver::RouteHandler::Pending(p) => p.handler().to_string(),
                crate::resolver::RouteHandler::Resolved(_) => "resolved".to_string(),
            })
            .collect();
        assert_eq!(handlers, vec!["Tuple@act", "admin::Tuple@act", "Posts@index"]);
    }

    #[test]
    fn test_base_path_prefixes_every_route() {
        let mut routes = RouteCollector::default().with_parameters(GroupParameters::prefixed("blog/"));
        routes.get("/", ok()).unwrap();
        routes
            .group(GroupParameters::prefixed("/posts"), |posts| {
                posts.get("/{id}", ok())?;
                Ok(())
            })
            .unwrap();

        let paths: Vec<_> = routes.routes().iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/blog", "/blog/posts/{id}"]);
    }

    #[test]
    fn test_eager_resolution_fails_at_registration() {
        let mut routes = RouteCollectorFactory::new()
            .create(Arc::new(Container::new()), Arc::new(ActionRegistry::new()))
            .unwrap();
        let err = routes.get("/", "Missing@index").unwrap_err();
        assert!(matches!(err, TrellisError::WrongRouteHandler { .. }));
        assert!(routes.is_empty());
    }

    #[test]
    fn test_redirects() {
        let mut routes = RouteCollector::default();
        routes.redirect("/old", "/new", StatusCode::FOUND).unwrap();
        routes.redirect_permanently("/legacy", "/new").unwrap();
        assert_eq!(routes.routes()[0].methods(), &ANY_METHODS);
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn test_resources() {
        let mut routes = RouteCollectorFactory::new()
            .lazy(true)
            .create(Arc::new(Container::new()), Arc::new(ActionRegistry::new()))
            .unwrap();
        routes.resources([("posts", "Posts"), ("users", "Users")]).unwrap();
        assert_eq!(routes.len(), 14);
        assert_eq!(routes.routes()[7].name(), "users.index");
    }

    #[test]
    fn test_router_compiles_every_route() {
        let mut routes = RouteCollector::default();
        routes.get("/a", ok()).unwrap();
        routes.post("/b", ok()).unwrap();

        let router = routes.router().unwrap();
        assert!(routes.routes().iter().all(Route::is_compiled));
        assert_eq!(router.len(), 2);

        routes.get("/c", ok()).unwrap();
        let router = routes.router().unwrap();
        assert_eq!(router.len(), 3);
        assert!(router.routes().all(Route::is_compiled));
    }
}
