//! Pipeline stages and their resolution.
//!
//! A [`Stage`] is one element of a pipe or dispatcher: a middleware, a
//! terminal handler, or a whole pipe nested inside another. Callers refer
//! to stages through [`MiddlewareRef`], which can also name a container
//! binding that [`MiddlewareResolver`] looks up.

use std::fmt;
use std::sync::Arc;

use trellis_core::di::Container;
use trellis_core::{RequestHandler, TrellisError, TrellisResult};

use crate::middleware::Middleware;
use crate::pipe::MiddlewarePipe;

/// One resolved element of a chain.
#[derive(Clone)]
pub enum Stage {
    /// Processes the request and may call the rest of the chain.
    Middleware(Arc<dyn Middleware>),
    /// Produces the response; nothing after it runs.
    Handler(Arc<dyn RequestHandler>),
    /// A pipe used as a middleware; falls through to the rest of the chain
    /// when its own nodes are exhausted.
    Pipe(Box<MiddlewarePipe>),
}

impl Stage {
    /// Wraps a middleware.
    pub fn middleware<M: Middleware>(middleware: M) -> Self {
        Self::Middleware(Arc::new(middleware))
    }

    /// Wraps a terminal handler.
    pub fn handler<H: RequestHandler + 'static>(handler: H) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Wraps a pipe.
    #[must_use]
    pub fn pipe(pipe: MiddlewarePipe) -> Self {
        Self::Pipe(Box::new(pipe))
    }

    /// Returns true for a terminal handler.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Middleware(m) => m.name(),
            Self::Handler(_) => "handler",
            Self::Pipe(_) => "pipe",
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Middleware(m) => f.debug_tuple("Middleware").field(&m.name()).finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::Pipe(pipe) => f.debug_tuple("Pipe").field(&pipe.len()).finish(),
        }
    }
}

/// A stage, or the identifier of a container binding holding one.
#[derive(Debug, Clone)]
pub enum MiddlewareRef {
    /// An already-resolved stage.
    Stage(Stage),
    /// A container identifier.
    Named(String),
}

impl MiddlewareRef {
    /// References a middleware value.
    pub fn middleware<M: Middleware>(middleware: M) -> Self {
        Self::Stage(Stage::middleware(middleware))
    }

    /// References a terminal handler.
    pub fn handler<H: RequestHandler + 'static>(handler: H) -> Self {
        Self::Stage(Stage::handler(handler))
    }

    /// References a pipe.
    #[must_use]
    pub fn pipe(pipe: MiddlewarePipe) -> Self {
        Self::Stage(Stage::pipe(pipe))
    }
}

impl From<Stage> for MiddlewareRef {
    fn from(stage: Stage) -> Self {
        Self::Stage(stage)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::Stage(Stage::Middleware(middleware))
    }
}

impl From<Arc<dyn RequestHandler>> for MiddlewareRef {
    fn from(handler: Arc<dyn RequestHandler>) -> Self {
        Self::Stage(Stage::Handler(handler))
    }
}

impl From<MiddlewarePipe> for MiddlewareRef {
    fn from(pipe: MiddlewarePipe) -> Self {
        Self::pipe(pipe)
    }
}

impl From<&str> for MiddlewareRef {
    fn from(id: &str) -> Self {
        Self::Named(id.to_string())
    }
}

impl From<String> for MiddlewareRef {
    fn from(id: String) -> Self {
        Self::Named(id)
    }
}

/// Turns references into stages.
///
/// Identifiers are looked up in the container. A binding may hold a
/// [`Stage`], an `Arc<dyn Middleware>`, an `Arc<dyn RequestHandler>` or a
/// [`MiddlewarePipe`]; anything else is a type mismatch.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareResolver {
    container: Option<Arc<Container>>,
}

impl MiddlewareResolver {
    /// A resolver that can only pass stages through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that looks identifiers up in `container`.
    #[must_use]
    pub fn with_container(container: Arc<Container>) -> Self {
        Self {
            container: Some(container),
        }
    }

    /// Resolves one reference.
    pub fn resolve(&self, reference: MiddlewareRef) -> TrellisResult<Stage> {
        let id = match reference {
            MiddlewareRef::Stage(stage) => return Ok(stage),
            MiddlewareRef::Named(id) => id,
        };

        let Some(container) = &self.container else {
            return Err(TrellisError::type_mismatch(format!(
                "identifier `{id}` (no container)"
            )));
        };

        let binding = container.get(&id)?;
        if let Some(stage) = binding.downcast_ref::<Stage>() {
            return Ok(stage.clone());
        }
        if let Some(middleware) = binding.downcast_ref::<Arc<dyn Middleware>>() {
            return Ok(Stage::Middleware(Arc::clone(middleware)));
        }
        if let Some(handler) = binding.downcast_ref::<Arc<dyn RequestHandler>>() {
            return Ok(Stage::Handler(Arc::clone(handler)));
        }
        if let Some(pipe) = binding.downcast_ref::<MiddlewarePipe>() {
            return Ok(Stage::pipe(pipe.clone()));
        }
        Err(TrellisError::type_mismatch(binding.type_name()))
    }

    /// Resolves a list, failing on the first bad reference.
    pub fn resolve_all<I>(&self, references: I) -> TrellisResult<Vec<Stage>>
    where
        I: IntoIterator<Item = MiddlewareRef>,
    {
        references.into_iter().map(|r| self.resolve(r)).collect()
    }
}
