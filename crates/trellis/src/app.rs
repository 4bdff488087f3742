//! Application bootstrap.

use std::sync::Arc;
use std::time::Duration;

use trellis_config::{AppConfig, Config, CorsSection};
use trellis_core::di::Container;
use trellis_core::{
    BoxFuture, HandlerResult, HandlerFn, Request, RequestHandler, TrellisError, TrellisResult,
};
use trellis_middleware::stages::{
    CorsMiddleware, ErrorHandlingMiddleware, RequestIdMiddleware, TelemetryMiddleware,
    TimeoutMiddleware,
};
use trellis_middleware::{Dispatcher, DispatcherFactory, MiddlewareRef, MiddlewareResolver};
use trellis_routing::{
    ActionRegistry, GroupParameters, ReturnType, RouteCollector, RouteCollectorFactory, Router,
};
use trellis_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};

type RouteDeclaration = Box<dyn FnOnce(&mut RouteCollector) -> TrellisResult<()> + Send>;

/// Collects services, controller actions, middleware and routes, then
/// builds an [`Application`].
///
/// Route declarations run in [`build`](Self::build), once the container and
/// the action registry are complete.
///
/// ```
/// use http::StatusCode;
/// use trellis::prelude::*;
///
/// # fn main() -> TrellisResult<()> {
/// let mut app = App::new(Config::new(AppConfig::default())?);
/// app.action("PostsController", "index", |_| async {
///     Response::json(StatusCode::OK, &serde_json::json!([]))
/// });
/// app.routes(|routes| {
///     routes.get("/posts", "PostsController@index")?.set_name("posts.index")?;
///     Ok(())
/// });
///
/// let application = app.build()?;
/// assert_eq!(application.url_for("posts.index", &[])?, "/posts");
/// # Ok(())
/// # }
/// ```
pub struct App {
    config: Config,
    container: Container,
    actions: ActionRegistry,
    middleware: Vec<MiddlewareRef>,
    declarations: Vec<RouteDeclaration>,
}

impl App {
    /// Creates an application from its configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            container: Container::new(),
            actions: ActionRegistry::new(),
            middleware: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Creates an application from a typed configuration.
    ///
    /// # Errors
    ///
    /// [`TrellisError::Config`] if the configuration cannot be flattened.
    pub fn from_config(config: AppConfig) -> TrellisResult<Self> {
        Ok(Self::new(Config::new(config)?))
    }

    /// The framework version.
    #[must_use]
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The service container, for registrations not covered by
    /// [`bind`](Self::bind) and [`register`](Self::register).
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Binds `value` under `id`; named middleware and handler arguments
    /// resolve through these bindings.
    pub fn bind<T: Send + Sync + 'static>(&mut self, id: impl Into<String>, value: T) -> &mut Self {
        self.container.bind(id, value);
        self
    }

    /// Registers a typed service.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        self.container.register(service);
        self
    }

    /// The controller action registry.
    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    /// Registers `controller@action`.
    pub fn action<F, Fut>(&mut self, controller: &str, action: &str, handler: F) -> &mut Self
    where
        F: Fn(trellis_core::Invocation) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        self.actions.action(controller, action, handler);
        self
    }

    /// Registers an action with a declared return type, checked when the
    /// route using it is resolved.
    pub fn dynamic_action(
        &mut self,
        controller: &str,
        action: &str,
        handler: HandlerFn,
        returns: ReturnType,
    ) -> &mut Self {
        self.actions.insert(controller, action, handler, returns);
        self
    }

    /// Appends a global middleware. Global middleware runs after the
    /// built-in stages and before routing, in the order added.
    pub fn add(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Declares routes.
    pub fn routes<F>(&mut self, declare: F) -> &mut Self
    where
        F: FnOnce(&mut RouteCollector) -> TrellisResult<()> + Send + 'static,
    {
        self.declarations.push(Box::new(declare));
        self
    }

    /// Installs logging and metrics as configured.
    ///
    /// # Errors
    ///
    /// [`TrellisError::Config`] if a global subscriber or recorder is
    /// already installed or the log filter is invalid.
    pub fn init_telemetry(&self) -> TrellisResult<TelemetryGuard> {
        let app = self.config.app();
        let telemetry = TelemetryConfig::builder()
            .service_name(&app.app.name)
            .environment(&app.app.env)
            .logging(app.logging.to_log_config(&app.app.name))
            .build();
        init_telemetry(&telemetry).map_err(|e| TrellisError::config(e.to_string()))
    }

    /// Runs the route declarations, compiles every route and assembles
    /// the request pipeline:
    ///
    /// ```text
    /// RequestId → Cors → ErrorHandling → Telemetry → Timeout → global middleware → Router
    /// ```
    ///
    /// # Errors
    ///
    /// Any registration or compilation error, and [`TrellisError::Config`]
    /// for an invalid CORS section.
    pub fn build(self) -> TrellisResult<Application> {
        let settings = self.config.app();
        let container = Arc::new(self.container);
        let actions = Arc::new(self.actions);

        let mut parameters = GroupParameters::new();
        if let Some(base_path) = &settings.app.base_path {
            parameters = parameters.prefix(base_path.clone());
        }
        if let Some(namespace) = &settings.routing.default_namespace {
            parameters = parameters.namespace(namespace.clone());
        }

        let mut routes = RouteCollectorFactory::new()
            .lazy(settings.routing.lazy_handlers)
            .with_request_aliases(settings.routing.request_aliases.iter().cloned())
            .with_parameters(parameters)
            .create(Arc::clone(&container), actions)?;
        for declare in self.declarations {
            declare(&mut routes)?;
        }
        let router = Arc::new(routes.router()?);

        let mut stages = vec![MiddlewareRef::middleware(if settings.http.trust_request_id {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        })];
        if settings.http.cors.enabled {
            stages.push(MiddlewareRef::middleware(cors(&settings.http.cors)?));
        }
        stages.push(MiddlewareRef::middleware(ErrorHandlingMiddleware::new(settings.app.debug)));
        stages.push(MiddlewareRef::middleware(TelemetryMiddleware::new()));
        if settings.http.request_timeout_ms > 0 {
            stages.push(MiddlewareRef::middleware(TimeoutMiddleware::from_millis(
                settings.http.request_timeout_ms,
            )));
        }
        stages.extend(self.middleware);
        let terminal: Arc<dyn RequestHandler> = router.clone();
        stages.push(MiddlewareRef::from(terminal));

        let dispatcher = DispatcherFactory::new(MiddlewareResolver::with_container(Arc::clone(
            &container,
        )))
        .create(stages)?;

        tracing::info!(
            app = %settings.app.name,
            env = %settings.app.env,
            routes = router.len(),
            stages = dispatcher.len(),
            "application built"
        );

        Ok(Application {
            config: self.config,
            container,
            router,
            dispatcher,
        })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.config.app().app.name)
            .field("actions", &self.actions.len())
            .field("middleware", &self.middleware.len())
            .field("declarations", &self.declarations.len())
            .finish_non_exhaustive()
    }
}

fn cors(section: &CorsSection) -> TrellisResult<CorsMiddleware> {
    let builder = CorsMiddleware::builder()
        .allow_origins(section.allowed_origins.iter().cloned())
        .allow_methods(section.methods()?)
        .allow_headers(section.allowed_headers.iter().cloned())
        .allow_credentials(section.allow_credentials);
    let builder = match section.max_age_secs {
        Some(secs) => builder.max_age(Duration::from_secs(secs)),
        None => builder.no_max_age(),
    };
    Ok(builder.build())
}

/// A built application: the global pipeline in front of the router.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Application {
    config: Config,
    container: Arc<Container>,
    router: Arc<Router>,
    dispatcher: Arc<Dispatcher>,
}

impl Application {
    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The compiled router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Builds the path of a named route.
    ///
    /// # Errors
    ///
    /// See [`Router::url_for`].
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> TrellisResult<String> {
        self.router.url_for(name, params)
    }
}

impl RequestHandler for Application {
    /// Runs `request` through the global pipeline and the router.
    ///
    /// Errors are rendered as responses by the error-handling stage; only
    /// failures raised before it (a rejected CORS preflight) are returned.
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        self.dispatcher.dispatch(request)
    }
}
