//! The terminal stage of every route pipe.

use std::fmt;
use std::sync::Arc;

use trellis_core::di::Container;
use trellis_core::{
    BoxFuture, HandlerResult, Invocation, Request, RequestExt, RequestHandler, TrellisError,
};

use crate::route::CurrentRoute;

/// Calls the matched route's handler.
///
/// The router leaves the matched route and its captured arguments on the
/// request. The invoker builds an [`Invocation`] from them, binding the
/// request under its own type key and under every configured alias, and
/// returns whatever the handler produces. It never calls a next stage.
#[derive(Clone, Default)]
pub struct RouteInvoker {
    aliases: Vec<String>,
    container: Option<Arc<Container>>,
}

impl RouteInvoker {
    /// An invoker without aliases or container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also binds the request under each of `aliases`.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Gives handlers access to `container`.
    #[must_use]
    pub fn with_container(mut self, container: Arc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// Configured request aliases.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl RequestHandler for RouteInvoker {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let route = request
                .attribute::<CurrentRoute>()
                .map(|current| Arc::clone(&current.0))
                .ok_or(TrellisError::RouteNotMatched)?;
            let args = request.route_args().cloned().unwrap_or_default();
            let handler = route.handler().resolve()?;

            let mut invocation = Invocation::new(request, args).with_aliases(self.aliases.clone());
            if let Some(container) = &self.container {
                invocation = invocation.with_container(Arc::clone(container));
            }
            handler(invocation).await
        })
    }
}

impl fmt::Debug for RouteInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteInvoker")
            .field("aliases", &self.aliases)
            .field("container", &self.container.is_some())
            .finish()
    }
}
