use http::{header::ALLOW, HeaderMap, HeaderName, HeaderValue, StatusCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised while building a handler, before any request reaches it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("GraphQL functions handler requires options.")]
    MissingOptions,
    #[error("GraphQL functions handler requires a query executor.")]
    MissingExecutor,
    #[error("GraphQL functions handler expects exactly one options argument, got {0}")]
    UnexpectedArguments(usize),
}

/// An expected GraphQL-over-HTTP failure. The query handler turns it into a response
/// carrying its status, headers and message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HttpQueryError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub message: String,
}

impl HttpQueryError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed(allow: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
            .with_header(ALLOW, HeaderValue::from_static(allow))
    }

    pub fn invalid_options(cause: &BoxError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid options provided to the GraphQL server: {}", cause),
        )
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Failure reported by a query executor.
///
/// Only `Protocol` errors are recovered by the query handler, `Opaque` ones are handed back
/// to the host untouched.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Protocol(#[from] HttpQueryError),
    #[error("{0}")]
    Opaque(BoxError),
}

impl ExecutionError {
    pub fn opaque(error: impl Into<BoxError>) -> Self {
        ExecutionError::Opaque(error.into())
    }
}
