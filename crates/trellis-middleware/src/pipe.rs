//! Linked middleware pipes.
//!
//! A [`MiddlewarePipe`] is a chain of nodes. Each node holds a [`Stage`] and
//! a link to the next node; the last node links to [`EmptyRequestHandler`].
//!
//! ```text
//! node(auth) → node(log) → node(handler) → Empty
//! ```
//!
//! Pipes are immutable once built and can serve concurrent requests. A pipe
//! is itself a [`RequestHandler`] and a [`Middleware`]: run as a middleware,
//! reaching its empty tail continues with the outer chain's `next`.

use std::fmt;

use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler, TrellisError, TrellisResult};

use crate::middleware::Middleware;
use crate::stage::Stage;

/// The terminal sentinel of every pipe.
///
/// Reaching it means every stage delegated onwards and nothing produced a
/// response.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRequestHandler;

impl RequestHandler for EmptyRequestHandler {
    fn handle(&self, _request: Request) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async { Err(TrellisError::PipelineExhausted) })
    }
}

#[derive(Clone)]
enum PipeNext {
    Pipe(Box<MiddlewarePipe>),
    Empty(EmptyRequestHandler),
}

/// A chain of stages ending in the empty sentinel.
#[derive(Clone)]
pub struct MiddlewarePipe {
    stage: Stage,
    next: PipeNext,
}

impl MiddlewarePipe {
    /// A single-node pipe.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            next: PipeNext::Empty(EmptyRequestHandler),
        }
    }

    /// A node placed in front of `next`.
    #[must_use]
    pub fn with_next(stage: Stage, next: MiddlewarePipe) -> Self {
        Self {
            stage,
            next: PipeNext::Pipe(Box::new(next)),
        }
    }

    /// This node's stage.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The following node, if any.
    #[must_use]
    pub fn next(&self) -> Option<&MiddlewarePipe> {
        match &self.next {
            PipeNext::Pipe(next) => Some(next),
            PipeNext::Empty(_) => None,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.next().map_or(0, MiddlewarePipe::len)
    }

    /// Always false; a pipe has at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the stages from head to tail.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        std::iter::successors(Some(self), |node| node.next()).map(MiddlewarePipe::stage)
    }

    /// Replaces the empty tail with `tail`.
    ///
    /// Fails if any node of this pipe is a terminal handler, since nothing
    /// after a handler would ever run.
    pub(crate) fn append(&mut self, tail: MiddlewarePipe) -> TrellisResult<()> {
        if self.stage.is_handler() {
            return Err(TrellisError::CannotMergeWithHandler);
        }
        match &mut self.next {
            PipeNext::Pipe(next) => next.append(tail),
            PipeNext::Empty(_) => {
                self.next = PipeNext::Pipe(Box::new(tail));
                Ok(())
            }
        }
    }

    /// Runs the pipe; `outer` continues the chain past the empty tail.
    fn run<'a>(
        &'a self,
        request: Request,
        outer: Option<&'a dyn RequestHandler>,
    ) -> BoxFuture<'a, HandlerResult> {
        let link = Link {
            next: &self.next,
            outer,
        };
        match &self.stage {
            Stage::Handler(handler) => handler.handle(request),
            Stage::Middleware(middleware) => {
                Box::pin(async move { middleware.process(request, &link).await })
            }
            Stage::Pipe(pipe) => Box::pin(async move { pipe.run(request, Some(&link)).await }),
        }
    }
}

/// The `next` handed to a node's stage.
struct Link<'a> {
    next: &'a PipeNext,
    outer: Option<&'a dyn RequestHandler>,
}

impl RequestHandler for Link<'_> {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        match (self.next, self.outer) {
            (PipeNext::Pipe(pipe), outer) => pipe.run(request, outer),
            (PipeNext::Empty(_), Some(outer)) => outer.handle(request),
            (PipeNext::Empty(empty), None) => empty.handle(request),
        }
    }
}

impl RequestHandler for MiddlewarePipe {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        self.run(request, None)
    }
}

impl Middleware for MiddlewarePipe {
    fn name(&self) -> &'static str {
        "pipe"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        self.run(request, Some(next))
    }
}

impl fmt::Debug for MiddlewarePipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stages()).finish()
    }
}
