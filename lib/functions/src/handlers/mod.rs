pub mod explorer;
pub mod query;
pub mod router;

use async_trait::async_trait;

use crate::{context::RequestContext, error::BoxError};

/// A handler a function host can invoke with its per-request context.
///
/// `Err` carries failures the handler did not recognize; the response was not written and the
/// host should report them through its own error handling.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    async fn invoke(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError>;
}
