pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use serde::Serialize;

use crate::{
    context::{QueryParams, RequestContext},
    error::ExecutionError,
};

/// The GraphQL payload handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPayload {
    /// The raw request body, used for `POST`.
    Body(Bytes),
    /// The query-string parameters, used for every other method.
    Params(QueryParams),
}

impl QueryPayload {
    pub fn from_context(ctx: &dyn RequestContext) -> Self {
        if ctx.method() == Method::POST {
            QueryPayload::Body(ctx.body().cloned().unwrap_or_default())
        } else {
            QueryPayload::Params(ctx.query_params().clone())
        }
    }
}

pub struct HttpQueryRequest<O> {
    pub method: Method,
    pub options: Arc<O>,
    pub query: QueryPayload,
}

/// The GraphQL engine seam of the query handler.
///
/// Implementations return `ExecutionError::Protocol` for failures that map to an HTTP
/// response, anything else is reported as `ExecutionError::Opaque`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    type Options: Send + Sync + 'static;
    type Output: Serialize + Send;

    async fn run_http_query(
        &self,
        ctx: &dyn RequestContext,
        request: HttpQueryRequest<Self::Options>,
    ) -> Result<Self::Output, ExecutionError>;
}
