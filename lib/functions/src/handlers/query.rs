use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue};

use crate::{
    context::RequestContext,
    error::{BoxError, ConfigurationError, ExecutionError, HttpQueryError},
    execution::{HttpQueryRequest, QueryExecutor, QueryPayload},
    handlers::FunctionHandler,
    hooks::{default_observer, HandlerKind, InvocationOutcome, SharedObserver},
    options::OptionsSource,
};

/// Runs GraphQL operations through a `QueryExecutor` and writes the outcome onto the context.
pub struct QueryHandler<E: QueryExecutor> {
    options: OptionsSource<E::Options>,
    executor: E,
    pub(crate) observer: SharedObserver,
}

pub struct QueryHandlerBuilder<E: QueryExecutor> {
    options: Vec<OptionsSource<E::Options>>,
    executor: Option<E>,
    observer: Option<SharedObserver>,
}

impl<E: QueryExecutor> Default for QueryHandlerBuilder<E> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            executor: None,
            observer: None,
        }
    }
}

impl<E: QueryExecutor> QueryHandlerBuilder<E> {
    /// Supplies the execution options. Exactly one call is accepted, `build` rejects any other
    /// count.
    pub fn options(mut self, options: impl Into<OptionsSource<E::Options>>) -> Self {
        self.options.push(options.into());
        self
    }

    pub fn executor(mut self, executor: E) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(mut self) -> Result<QueryHandler<E>, ConfigurationError> {
        let options = match self.options.len() {
            0 => return Err(ConfigurationError::MissingOptions),
            1 => self.options.remove(0),
            count => return Err(ConfigurationError::UnexpectedArguments(count)),
        };
        let executor = self.executor.ok_or(ConfigurationError::MissingExecutor)?;

        Ok(QueryHandler {
            options,
            executor,
            observer: self.observer.unwrap_or_else(default_observer),
        })
    }
}

/// Builds a query handler from a single options source.
pub fn graphql_functions<E: QueryExecutor>(
    options: impl Into<OptionsSource<E::Options>>,
    executor: E,
) -> Result<QueryHandler<E>, ConfigurationError> {
    QueryHandler::builder()
        .options(options)
        .executor(executor)
        .build()
}

impl<E: QueryExecutor> QueryHandler<E> {
    pub fn builder() -> QueryHandlerBuilder<E> {
        QueryHandlerBuilder::default()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Handles one invocation. Protocol errors are written as responses, any other failure is
    /// returned untouched and leaves the response unwritten.
    pub async fn handle(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        self.observer.on_request(HandlerKind::Query, ctx.method());

        let options = match self.options.resolve(&*ctx).await {
            Ok(options) => options,
            Err(err) => {
                self.write_protocol_error(ctx, HttpQueryError::invalid_options(&err));
                return Ok(());
            }
        };

        let request = HttpQueryRequest {
            method: ctx.method().clone(),
            options,
            query: QueryPayload::from_context(&*ctx),
        };

        match self.executor.run_http_query(&*ctx, request).await {
            Ok(output) => {
                let body = sonic_rs::to_vec(&output)?;
                ctx.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                ctx.set_body(Bytes::from(body));
                ctx.done();
                self.observer
                    .on_response(HandlerKind::Query, InvocationOutcome::Completed);
                Ok(())
            }
            Err(ExecutionError::Protocol(error)) => {
                self.write_protocol_error(ctx, error);
                Ok(())
            }
            Err(ExecutionError::Opaque(error)) => {
                self.observer
                    .on_unhandled_error(HandlerKind::Query, error.as_ref());
                Err(error)
            }
        }
    }

    fn write_protocol_error(&self, ctx: &mut dyn RequestContext, error: HttpQueryError) {
        for (name, value) in error.headers.iter() {
            ctx.set_header(name.clone(), value.clone());
        }
        ctx.set_status(error.status);
        ctx.set_body(Bytes::from(error.message));
        ctx.done();
        self.observer
            .on_response(HandlerKind::Query, InvocationOutcome::Failed(error.status));
    }
}

#[async_trait]
impl<E: QueryExecutor> FunctionHandler for QueryHandler<E> {
    async fn invoke(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        self.handle(ctx).await
    }
}
