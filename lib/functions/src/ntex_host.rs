//! Runs function handlers behind an `ntex` web server, for local development or for hosts
//! that forward plain HTTP requests.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use ntex::web::{self, error::QueryPayloadError, HttpRequest, HttpResponse};
use tracing::{error, warn};

use crate::{
    context::{FunctionContext, FunctionRequest, QueryParams},
    handlers::FunctionHandler,
};

/// The path segment name the routes registered by `configure_function_routes` capture.
pub const ROUTE_PARAM: &str = "route";

impl FunctionContext {
    /// Builds a context from an incoming `ntex` request. The route parameter is read from the
    /// matched path segment named `route_param`.
    pub fn from_ntex_request(
        req: &HttpRequest,
        body: &[u8],
        route_param: &str,
    ) -> Result<Self, QueryPayloadError> {
        let query = QueryParams::parse(req.query_string())?;
        let body = if body.is_empty() {
            None
        } else {
            Some(Bytes::copy_from_slice(body))
        };

        Ok(FunctionContext::new(FunctionRequest {
            method: req.method().clone(),
            query,
            body,
            route: req.match_info().get(route_param).map(str::to_owned),
        }))
    }

    pub fn into_ntex_response(self) -> HttpResponse {
        let response = self.into_response();
        let mut builder = HttpResponse::build(response.status);
        for (name, value) in response.headers.iter() {
            builder.header(name.clone(), value.clone());
        }

        match response.body {
            Some(body) => builder.body(body.to_vec()),
            None => builder.finish(),
        }
    }
}

/// Runs `handler` for one `ntex` request.
///
/// A query string the urlencoded parser rejects is answered with `400` and the parser's message.
/// The parser decodes leniently, so in practice this only happens for malformed input it cannot
/// split into pairs. Errors the handler hands back are logged and answered with an empty `500`.
pub async fn handle_ntex_request<H>(
    handler: &H,
    req: &HttpRequest,
    body: &[u8],
    route_param: &str,
) -> HttpResponse
where
    H: FunctionHandler + ?Sized,
{
    let mut ctx = match FunctionContext::from_ntex_request(req, body, route_param) {
        Ok(ctx) => ctx,
        Err(err) => return query_string_rejected(err),
    };

    if let Err(err) = handler.invoke(&mut ctx).await {
        error!(error = %err, "function handler failed");
        return HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR).finish();
    }

    if !ctx.is_done() {
        warn!("function handler returned without signaling completion");
    }

    ctx.into_ntex_response()
}

fn query_string_rejected(err: QueryPayloadError) -> HttpResponse {
    warn!(error = %err, "failed to parse the query string");
    HttpResponse::build(StatusCode::BAD_REQUEST).body(err.to_string())
}

async fn function_endpoint<H>(
    req: HttpRequest,
    body: ntex::util::Bytes,
    handler: web::types::State<Arc<H>>,
) -> HttpResponse
where
    H: FunctionHandler + 'static,
{
    handle_ntex_request(handler.get_ref().as_ref(), &req, &body, ROUTE_PARAM).await
}

/// Mounts the handler stored as `web::types::State<Arc<H>>` on `base_path` and on
/// `base_path/{route}`.
pub fn configure_function_routes<H>(service_config: &mut web::ServiceConfig, base_path: &str)
where
    H: FunctionHandler + 'static,
{
    let base_path = base_path.trim_end_matches('/');
    service_config
        .route(
            &format!("{}/{{{}}}", base_path, ROUTE_PARAM),
            web::to(function_endpoint::<H>),
        )
        .route(
            if base_path.is_empty() { "/" } else { base_path },
            web::to(function_endpoint::<H>),
        );
}
