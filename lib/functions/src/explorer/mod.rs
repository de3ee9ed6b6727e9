pub mod graphiql;

use async_trait::async_trait;

use crate::{
    context::{QueryParams, RequestContext},
    error::BoxError,
};

/// The page-rendering seam of the explorer handler.
#[async_trait]
pub trait ExplorerRenderer: Send + Sync {
    type Options: Send + Sync + 'static;

    /// Renders the exploration page as HTML.
    async fn render(
        &self,
        query: &QueryParams,
        options: &Self::Options,
        ctx: &dyn RequestContext,
    ) -> Result<String, BoxError>;
}
