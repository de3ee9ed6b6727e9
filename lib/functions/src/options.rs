use std::{fmt, future::Future, sync::Arc};

use futures::future::{self, BoxFuture, FutureExt};

use crate::{context::RequestContext, error::BoxError};

type ComputeOptionsFn<T> =
    dyn Fn(&dyn RequestContext) -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync;

/// Handler options, either fixed at construction or computed from every invocation's context.
///
/// The handlers resolve the source once per invocation, before delegating to the engine or
/// the renderer.
pub enum OptionsSource<T> {
    Static(Arc<T>),
    Computed(Arc<ComputeOptionsFn<T>>),
}

impl<T> Clone for OptionsSource<T> {
    fn clone(&self) -> Self {
        match self {
            OptionsSource::Static(value) => OptionsSource::Static(value.clone()),
            OptionsSource::Computed(compute) => OptionsSource::Computed(compute.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OptionsSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsSource::Static(value) => f.debug_tuple("Static").field(value).finish(),
            OptionsSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<T: Send + Sync + 'static> OptionsSource<T> {
    pub fn from_value(value: T) -> Self {
        OptionsSource::Static(Arc::new(value))
    }

    /// Options computed synchronously from the request context.
    pub fn from_fn<F>(compute: F) -> Self
    where
        F: Fn(&dyn RequestContext) -> T + Send + Sync + 'static,
    {
        OptionsSource::Computed(Arc::new(move |ctx: &dyn RequestContext| {
            let value = compute(ctx);
            future::ready(Ok::<T, BoxError>(value)).boxed()
        }))
    }

    /// Options computed asynchronously from the request context. The returned future must
    /// own whatever it needs from the context.
    pub fn from_async_fn<F, Fut>(compute: F) -> Self
    where
        F: Fn(&dyn RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        OptionsSource::Computed(Arc::new(move |ctx: &dyn RequestContext| {
            compute(ctx).boxed()
        }))
    }

    pub async fn resolve(&self, ctx: &dyn RequestContext) -> Result<Arc<T>, BoxError> {
        match self {
            OptionsSource::Static(value) => Ok(value.clone()),
            OptionsSource::Computed(compute) => compute(ctx).await.map(Arc::new),
        }
    }
}

impl<T: Send + Sync + 'static> From<T> for OptionsSource<T> {
    fn from(value: T) -> Self {
        OptionsSource::from_value(value)
    }
}
