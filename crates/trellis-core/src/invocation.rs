//! Route handler invocation.
//!
//! Route handlers receive an [`Invocation`]: the matched request, the path
//! arguments captured for it and access to the container. Arguments are
//! resolved in a fixed order: the request under its type key or one of its
//! aliases, then captured arguments by name, then by position, then
//! container bindings, then caller-supplied defaults.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use trellis_router::Params;

use crate::di::Container;
use crate::error::{TrellisError, TrellisResult};
use crate::handler::{BoxFuture, HandlerResult};
use crate::types::{read_body, Request};

/// A resolved route handler.
pub type HandlerFn = Arc<dyn Fn(Invocation) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wraps an async closure as a [`HandlerFn`].
///
/// ```rust
/// use trellis_core::{handler_fn, Response, ResponseExt};
/// use http::StatusCode;
///
/// let show = handler_fn(|inv| async move {
///     let id: u64 = inv.parse("id")?;
///     Response::json(StatusCode::OK, &serde_json::json!({ "id": id }))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |invocation| Box::pin(f(invocation)))
}

/// The key the request is always bound under.
#[must_use]
pub fn request_type_key() -> &'static str {
    std::any::type_name::<Request>()
}

/// A value found by [`Invocation::argument`].
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a> {
    /// The request itself.
    Request(&'a Request),
    /// A captured path argument.
    Value(&'a str),
}

/// Everything a route handler is called with.
#[derive(Debug)]
pub struct Invocation {
    request: Request,
    request_keys: Vec<String>,
    args: Params,
    container: Option<Arc<Container>>,
}

impl Invocation {
    /// Creates an invocation for `request` with captured `args`.
    #[must_use]
    pub fn new(request: Request, args: Params) -> Self {
        Self {
            request,
            request_keys: vec![request_type_key().to_string()],
            args,
            container: None,
        }
    }

    /// Also binds the request under each alias key.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_keys.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Attaches the container used for dependency lookups.
    #[must_use]
    pub fn with_container(mut self, container: Arc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// The matched request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Takes the request out.
    #[must_use]
    pub fn into_request(self) -> Request {
        self.request
    }

    /// Captured path arguments.
    #[must_use]
    pub fn args(&self) -> &Params {
        &self.args
    }

    /// Resolves `key` as a request type key, an argument name or a
    /// numeric position, in that order.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<Argument<'_>> {
        if self.request_keys.iter().any(|k| k == key) {
            return Some(Argument::Request(&self.request));
        }
        if let Some(value) = self.args.get(key) {
            return Some(Argument::Value(value));
        }
        key.parse::<usize>()
            .ok()
            .and_then(|index| self.args.get_index(index))
            .map(Argument::Value)
    }

    /// A captured argument that must be present.
    pub fn param(&self, name: &str) -> TrellisResult<&str> {
        match self.argument(name) {
            Some(Argument::Value(value)) => Ok(value),
            _ => Err(TrellisError::MissingArgument {
                name: name.to_string(),
            }),
        }
    }

    /// A captured argument, or `default` when absent.
    #[must_use]
    pub fn param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.param(name).unwrap_or(default)
    }

    /// Parses a captured argument; a malformed value is a client error.
    pub fn parse<T>(&self, name: &str) -> TrellisResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.param(name)?;
        raw.parse().map_err(|e| {
            TrellisError::http(
                StatusCode::BAD_REQUEST,
                format!("invalid value `{raw}` for `{name}`: {e}"),
            )
        })
    }

    /// Resolves a service by type from the container.
    pub fn inject<T: Send + Sync + 'static>(&self) -> TrellisResult<Arc<T>> {
        match &self.container {
            Some(container) => Ok(container.resolve_required::<T>()?),
            None => Err(crate::di::InjectionError::not_registered::<T>().into()),
        }
    }

    /// Looks up an identifier binding, falling back to a captured argument
    /// of the same name parsed as `T`.
    pub fn lookup<T>(&self, id: &str) -> TrellisResult<T>
    where
        T: Clone + FromStr + 'static,
        T::Err: std::fmt::Display,
    {
        if let Some(container) = &self.container {
            if container.has(id) {
                return Ok(container.get_as::<T>(id)?);
            }
        }
        self.parse(id)
    }

    /// Deserializes the JSON request body.
    pub async fn json<T: DeserializeOwned>(self) -> TrellisResult<T> {
        let body = read_body(self.request.into_body()).await;
        serde_json::from_slice(&body).map_err(|e| {
            TrellisError::http(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
        })
    }
}
