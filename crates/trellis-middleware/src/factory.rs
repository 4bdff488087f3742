//! Building pipes from stage lists.

use trellis_core::{TrellisError, TrellisResult};

use crate::pipe::MiddlewarePipe;
use crate::stage::{MiddlewareRef, MiddlewareResolver, Stage};

/// Builds a [`MiddlewarePipe`] from an ordered list of references.
///
/// The list is read front to back as execution order; the pipe is
/// assembled back to front. A reference that resolves to a pipe is merged
/// in place: a copy of it is taken and the already-built remainder is
/// attached to its tail, so the original pipe is never modified.
#[derive(Debug, Clone, Default)]
pub struct MiddlewarePipeFactory {
    resolver: MiddlewareResolver,
}

impl MiddlewarePipeFactory {
    /// Creates a factory resolving references with `resolver`.
    #[must_use]
    pub fn new(resolver: MiddlewareResolver) -> Self {
        Self { resolver }
    }

    /// The resolver used for references.
    #[must_use]
    pub fn resolver(&self) -> &MiddlewareResolver {
        &self.resolver
    }

    /// Builds a pipe running `middlewares` in order.
    ///
    /// # Errors
    ///
    /// - [`TrellisError::EmptyPipeline`] for an empty list
    /// - [`TrellisError::CannotMergeWithHandler`] when a pipe that already
    ///   contains a terminal handler would have stages merged after it
    /// - whatever resolution of a reference fails with
    pub fn create(&self, middlewares: Vec<MiddlewareRef>) -> TrellisResult<MiddlewarePipe> {
        let mut reversed = middlewares.into_iter().rev();
        let innermost = reversed.next().ok_or(TrellisError::EmptyPipeline)?;

        let mut pipe = MiddlewarePipe::new(self.resolver.resolve(innermost)?);
        for reference in reversed {
            pipe = match self.resolver.resolve(reference)? {
                Stage::Pipe(sub) => {
                    let mut merged = *sub;
                    merged.append(pipe)?;
                    merged
                }
                stage => MiddlewarePipe::with_next(stage, pipe),
            };
        }

        tracing::trace!(nodes = pipe.len(), "middleware pipe built");
        Ok(pipe)
    }
}
