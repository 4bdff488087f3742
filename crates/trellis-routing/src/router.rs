//! Runtime request routing.

use std::collections::HashMap;
use std::sync::Arc;

use trellis_core::{
    BoxFuture, HandlerResult, Request, RequestExt, RequestHandler, RouteArgs, RouteLabel,
    RouteLabelSlot, TrellisError, TrellisResult,
};
use trellis_router::{expand_optional, Dispatch, RoutePattern, RouteTable};

use crate::collector::RouteCollector;
use crate::route::{CurrentRoute, Route};

/// Matches requests against compiled routes and runs the matched route's
/// pipe.
///
/// On a match the router stores [`CurrentRoute`] and [`RouteArgs`] on the
/// request before handing it to the pipe, and tags the response with a
/// [`RouteLabel`]. Unmatched requests fail with
/// [`TrellisError::NotFound`] or [`TrellisError::MethodNotAllowed`].
///
/// A router is immutable and can be shared across tasks.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable<usize>,
    routes: Arc<[Arc<Route>]>,
    names: HashMap<String, usize>,
}

impl Router {
    /// Creates a router from a table whose payloads index into `routes`.
    #[must_use]
    pub fn new(table: RouteTable<usize>, routes: Vec<Route>) -> Self {
        let mut names = HashMap::new();
        for (index, route) in routes.iter().enumerate() {
            if !route.name().is_empty() {
                names.insert(route.name().to_string(), index);
            }
        }
        Self {
            table,
            routes: routes.into_iter().map(Arc::new).collect(),
            names,
        }
    }

    /// Every route, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|route| &**route)
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Looks a route up by name.
    #[must_use]
    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.names
            .get(name)
            .and_then(|&index| self.routes.get(index))
            .map(|route| &**route)
    }

    /// Builds the path of a named route.
    ///
    /// Optional trailing parts are kept as far as `params` supplies their
    /// placeholders.
    ///
    /// ```rust
    /// # use trellis_routing::{HandlerRef, RouteCollector};
    /// # use trellis_core::{Response, ResponseExt};
    /// # use http::StatusCode;
    /// let mut routes = RouteCollector::default();
    /// routes
    ///     .get("/archive[/{year}[/{month}]]", HandlerRef::function(|_| async {
    ///         Ok(Response::empty(StatusCode::OK))
    ///     }))
    ///     .unwrap()
    ///     .set_name("archive")
    ///     .unwrap();
    /// let router = routes.router().unwrap();
    ///
    /// assert_eq!(router.url_for("archive", &[]).unwrap(), "/archive");
    /// assert_eq!(router.url_for("archive", &[("year", "2024")]).unwrap(), "/archive/2024");
    /// ```
    ///
    /// # Errors
    ///
    /// [`TrellisError::UnknownRoute`] for an unknown name, and
    /// [`TrellisError::InvalidRoute`] when a required placeholder is missing
    /// or a value violates its constraint.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> TrellisResult<String> {
        let route = self.route_by_name(name).ok_or_else(|| TrellisError::UnknownRoute {
            name: name.to_string(),
        })?;
        let lookup = |key: &str| params.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        let forms = expand_optional(route.path())?;
        for form in forms.iter().rev() {
            let pattern = RoutePattern::parse(form)?;
            if pattern.placeholders().all(|p| lookup(p).is_some()) {
                return pattern.render(lookup).map_err(Into::into);
            }
        }
        // Nothing fully supplied: render the shortest form to report what
        // is missing.
        let shortest = forms.first().map(String::as_str).unwrap_or(route.path());
        RoutePattern::parse(shortest)?
            .render(lookup)
            .map_err(Into::into)
    }

    /// Matches and runs `request`.
    pub fn dispatch(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        self.handle(request)
    }
}

impl RequestHandler for Router {
    fn handle(&self, mut request: Request) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let route = match self.table.dispatch(&method, &path) {
                Dispatch::Found { payload, params } => {
                    let route = self
                        .routes
                        .get(*payload)
                        .map(Arc::clone)
                        .ok_or(TrellisError::RouteNotMatched)?;
                    request.set_attribute(RouteArgs(params));
                    route
                }
                Dispatch::MethodNotAllowed { allowed } => {
                    tracing::debug!(%method, %path, "method not allowed");
                    return Err(TrellisError::MethodNotAllowed { allowed });
                }
                Dispatch::NotFound => {
                    tracing::debug!(%method, %path, "no route matched");
                    return Err(TrellisError::not_found(method, path));
                }
            };

            tracing::debug!(%method, %path, route = route.label(), "route matched");
            if let Some(slot) = request.attribute::<RouteLabelSlot>() {
                slot.fill(route.label());
            }
            request.set_attribute(CurrentRoute(Arc::clone(&route)));
            let mut response = route.pipe()?.handle(request).await?;
            response
                .extensions_mut()
                .insert(RouteLabel(route.label().to_string()));
            Ok(response)
        })
    }
}

/// Snapshots a collector into a [`Router`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterFactory;

impl RouterFactory {
    /// Creates a router from the collector's current routes and table.
    #[must_use]
    pub fn create(&self, collector: &RouteCollector) -> Router {
        Router::new(collector.data().clone(), collector.routes().to_vec())
    }
}
