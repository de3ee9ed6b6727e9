use std::collections::HashMap;

use async_graphql::{
    parser::{
        parse_query,
        types::{DocumentOperations, OperationType},
    },
    BatchRequest, BatchResponse, Request, Variables,
};
use async_trait::async_trait;
use bytes::Bytes;
use graphql_functions_config::execution::ExecutionOptions;
use http::{header::CONTENT_TYPE, HeaderValue, Method};
use tracing::{trace, warn};

use crate::{
    context::{QueryParams, RequestContext},
    error::{ExecutionError, HttpQueryError},
    execution::{HttpQueryRequest, QueryExecutor, QueryPayload},
};

/// Runs GraphQL-over-HTTP requests against any `async_graphql` executor, usually a `Schema`.
pub struct SchemaExecutor<E> {
    executor: E,
}

impl<E> SchemaExecutor<E>
where
    E: async_graphql::Executor,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<E> QueryExecutor for SchemaExecutor<E>
where
    E: async_graphql::Executor,
{
    type Options = ExecutionOptions;
    type Output = BatchResponse;

    async fn run_http_query(
        &self,
        _ctx: &dyn RequestContext,
        request: HttpQueryRequest<ExecutionOptions>,
    ) -> Result<BatchResponse, ExecutionError> {
        let options = request.options;
        let batch = match (&request.method, request.query) {
            (&Method::POST, QueryPayload::Body(body)) => {
                trace!("processing POST GraphQL request");
                batch_from_body(&body)?
            }
            (&Method::GET, QueryPayload::Params(params)) => {
                trace!("processing GET GraphQL request");
                BatchRequest::Single(request_from_params(&params)?)
            }
            (method, _) => {
                warn!("unsupported HTTP method: {}", method);
                return Err(HttpQueryError::method_not_allowed(
                    "GET, POST",
                    "GraphQL only supports GET and POST requests.",
                )
                .into());
            }
        };

        let batch = apply_options(batch, &options)?;
        let is_batch = matches!(batch, BatchRequest::Batch(_));
        let response = self.executor.execute_batch(batch).await;

        if !is_batch {
            if let BatchResponse::Single(single) = &response {
                if is_request_error(single) {
                    let message = sonic_rs::to_string(single).map_err(ExecutionError::opaque)?;

                    return Err(HttpQueryError::bad_request(message)
                        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                        .into());
                }
            }
        }

        Ok(response)
    }
}

/// Parse and validation failures never reach execution: no data and only errors without a
/// path. Field errors that null the whole result still carry their path.
fn is_request_error(response: &async_graphql::Response) -> bool {
    response.data == async_graphql::Value::Null
        && response.is_err()
        && response.errors.iter().all(|error| error.path.is_empty())
}

fn batch_from_body(body: &Bytes) -> Result<BatchRequest, HttpQueryError> {
    if body.is_empty() {
        return Err(HttpQueryError::bad_request("POST body missing."));
    }

    serde_json::from_slice::<BatchRequest>(body).map_err(|err| {
        warn!("failed to parse body: {}", err);
        HttpQueryError::bad_request("POST body sent invalid JSON.")
    })
}

fn non_empty<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params.get_str(key).filter(|value| !value.is_empty())
}

fn request_from_params(params: &QueryParams) -> Result<Request, HttpQueryError> {
    let query = non_empty(params, "query")
        .ok_or_else(|| HttpQueryError::bad_request("Must provide query string."))?;
    let operation_name = non_empty(params, "operationName");

    if let Some(kind) = operation_type(query, operation_name) {
        if kind != OperationType::Query {
            return Err(HttpQueryError::method_not_allowed(
                "POST",
                "GET supports only query operation",
            ));
        }
    }

    let mut request = Request::new(query);

    if let Some(operation_name) = operation_name {
        request = request.operation_name(operation_name);
    }

    if let Some(variables) = non_empty(params, "variables") {
        let variables = serde_json::from_str::<serde_json::Value>(variables)
            .map_err(|_| HttpQueryError::bad_request("Variables are invalid JSON."))?;
        request = request.variables(Variables::from_json(variables));
    }

    if let Some(extensions) = non_empty(params, "extensions") {
        request.extensions.extend(extensions_from_json(extensions)?);
    }

    Ok(request)
}

fn extensions_from_json(
    raw: &str,
) -> Result<HashMap<String, async_graphql::Value>, HttpQueryError> {
    serde_json::from_str(raw).map_err(|_| HttpQueryError::bad_request("Extensions are invalid JSON."))
}

/// The type of the operation that would run. Unparsable documents and ambiguous selections
/// yield `None` and are left to the engine to report.
fn operation_type(query: &str, operation_name: Option<&str>) -> Option<OperationType> {
    let document = parse_query(query).ok()?;

    match document.operations {
        DocumentOperations::Single(operation) => Some(operation.node.ty),
        DocumentOperations::Multiple(operations) => operations
            .get(operation_name?)
            .map(|operation| operation.node.ty),
    }
}

fn apply_options(
    batch: BatchRequest,
    options: &ExecutionOptions,
) -> Result<BatchRequest, HttpQueryError> {
    let configure = |request: Request| {
        if options.introspection {
            request
        } else {
            request.disable_introspection()
        }
    };

    match batch {
        BatchRequest::Single(request) => Ok(BatchRequest::Single(configure(request))),
        BatchRequest::Batch(requests) => {
            if !options.batching {
                return Err(HttpQueryError::bad_request("Operation batching is disabled."));
            }
            if let Some(max_batch_size) = options.max_batch_size {
                if requests.len() > max_batch_size {
                    return Err(HttpQueryError::bad_request(format!(
                        "Batch of {} operations exceeds the limit of {}.",
                        requests.len(),
                        max_batch_size
                    )));
                }
            }
            Ok(BatchRequest::Batch(
                requests.into_iter().map(configure).collect(),
            ))
        }
    }
}
