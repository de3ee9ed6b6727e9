use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Query,
    Explorer,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Query => "query",
            HandlerKind::Explorer => "explorer",
        }
    }
}

/// How an invocation ended, from the handler's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The engine or the renderer produced a body.
    Completed,
    /// A recovered failure was written with this status.
    Failed(StatusCode),
}

/// Observes handler invocations. Every method defaults to a no-op.
pub trait HandlerObserver: Send + Sync {
    fn on_request(&self, _kind: HandlerKind, _method: &Method) {}

    fn on_dispatch(&self, _route: Option<&str>, _kind: HandlerKind) {}

    fn on_response(&self, _kind: HandlerKind, _outcome: InvocationOutcome) {}

    fn on_unhandled_error(&self, _kind: HandlerKind, _error: &(dyn std::error::Error + Send + Sync)) {
    }
}

pub type SharedObserver = Arc<dyn HandlerObserver>;

/// Reports invocations through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl HandlerObserver for TracingObserver {
    fn on_request(&self, kind: HandlerKind, method: &Method) {
        debug!(handler = kind.as_str(), %method, "handling function invocation");
    }

    fn on_dispatch(&self, route: Option<&str>, kind: HandlerKind) {
        debug!(
            route = route.unwrap_or("<none>"),
            handler = kind.as_str(),
            "dispatching function invocation"
        );
    }

    fn on_response(&self, kind: HandlerKind, outcome: InvocationOutcome) {
        match outcome {
            InvocationOutcome::Completed => {
                debug!(handler = kind.as_str(), "function invocation completed")
            }
            InvocationOutcome::Failed(status) => warn!(
                handler = kind.as_str(),
                status = status.as_u16(),
                "function invocation failed"
            ),
        }
    }

    fn on_unhandled_error(&self, kind: HandlerKind, error: &(dyn std::error::Error + Send + Sync)) {
        error!(
            handler = kind.as_str(),
            error = %error,
            "unexpected error, handing it back to the host"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl HandlerObserver for NoopObserver {}

pub fn default_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}
