use std::collections::{hash_map::Entry, HashMap};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use ntex::web::{error::QueryPayloadError, types::Query};
use serde::Serialize;
use tracing::warn;

/// A query-string value. Keys repeated in the query string collapse into `Multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryParamValue {
    /// The first value given for the key.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryParamValue::Single(value) => Some(value),
            QueryParamValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryParamValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = QueryParamValue::Multiple(vec![first, value]);
            }
            QueryParamValue::Multiple(values) => values.push(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(HashMap<String, QueryParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw, url-encoded query string (without the leading `?`).
    pub fn parse(query_string: &str) -> Result<Self, QueryPayloadError> {
        let pairs = Query::<Vec<(String, String)>>::from_query(query_string)?.0;

        Ok(Self::from_pairs(pairs))
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.append(key, value);
        }
        params
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match self.0.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
            Entry::Vacant(entry) => {
                entry.insert(QueryParamValue::Single(value.into()));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryParamValue> {
        self.0.get(key)
    }

    /// The first value of `key`, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(QueryParamValue::first)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The per-invocation request/response handle a function host hands to the handlers.
///
/// Handlers only read the request side and write the response side. Hosts implement this
/// trait on top of their own request types, `FunctionContext` is the host-agnostic version.
pub trait RequestContext: Send + Sync {
    fn method(&self) -> &Method;

    fn query_params(&self) -> &QueryParams;

    /// The raw request body, only interpreted for `POST` requests.
    fn body(&self) -> Option<&Bytes>;

    /// The route segment used to pick between the query and the explorer handler.
    fn route_param(&self) -> Option<&str>;

    fn set_status(&mut self, status: StatusCode);

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    fn set_body(&mut self, body: Bytes);

    /// Signals the host that the response is complete.
    fn done(&mut self);
}

#[derive(Debug, Clone)]
pub struct FunctionRequest {
    pub method: Method,
    pub query: QueryParams,
    pub body: Option<Bytes>,
    pub route: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Default for FunctionResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub req: FunctionRequest,
    pub res: FunctionResponse,
    done: bool,
}

impl FunctionContext {
    pub fn new(req: FunctionRequest) -> Self {
        Self {
            req,
            res: FunctionResponse::default(),
            done: false,
        }
    }

    pub fn builder() -> FunctionContextBuilder {
        FunctionContextBuilder::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn into_response(self) -> FunctionResponse {
        self.res
    }
}

impl RequestContext for FunctionContext {
    fn method(&self) -> &Method {
        &self.req.method
    }

    fn query_params(&self) -> &QueryParams {
        &self.req.query
    }

    fn body(&self) -> Option<&Bytes> {
        self.req.body.as_ref()
    }

    fn route_param(&self) -> Option<&str> {
        self.req.route.as_deref()
    }

    fn set_status(&mut self, status: StatusCode) {
        self.res.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.res.headers.insert(name, value);
    }

    fn set_body(&mut self, body: Bytes) {
        self.res.body = Some(body);
    }

    fn done(&mut self) {
        if self.done {
            warn!("completion was already signaled for this invocation, ignoring");
            return;
        }
        self.done = true;
    }
}

pub struct FunctionContextBuilder {
    method: Method,
    query: QueryParams,
    body: Option<Bytes>,
    route: Option<String>,
}

impl Default for FunctionContextBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            query: QueryParams::new(),
            body: None,
            route: None,
        }
    }
}

impl FunctionContextBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn query_params(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    /// Replaces the query parameters with the ones parsed from a raw query string.
    pub fn query_string(mut self, query_string: &str) -> Result<Self, QueryPayloadError> {
        self.query = QueryParams::parse(query_string)?;
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn build(self) -> FunctionContext {
        FunctionContext::new(FunctionRequest {
            method: self.method,
            query: self.query,
            body: self.body,
            route: self.route,
        })
    }
}
