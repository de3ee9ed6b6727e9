pub mod context;
pub mod error;
pub mod execution;
pub mod explorer;
pub mod handlers;
pub mod hooks;
pub mod logger;
pub mod ntex_host;
pub mod options;

pub use graphql_functions_config as config;
pub use http;
pub use ntex;

pub use crate::{
    context::{FunctionContext, QueryParamValue, QueryParams, RequestContext},
    error::{BoxError, ConfigurationError, ExecutionError, HttpQueryError},
    execution::{schema::SchemaExecutor, HttpQueryRequest, QueryExecutor, QueryPayload},
    explorer::{graphiql::GraphiQLRenderer, ExplorerRenderer},
    handlers::{
        explorer::{graphiql_functions, ExplorerHandler},
        query::{graphql_functions, QueryHandler, QueryHandlerBuilder},
        router::{combined_functions, CombinedRouter, EXPLORER_ROUTE},
        FunctionHandler,
    },
    hooks::{HandlerObserver, NoopObserver, SharedObserver, TracingObserver},
    options::OptionsSource,
};
