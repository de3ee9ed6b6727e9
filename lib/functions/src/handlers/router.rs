use async_trait::async_trait;

use crate::{
    context::RequestContext,
    error::{BoxError, ConfigurationError},
    execution::QueryExecutor,
    explorer::ExplorerRenderer,
    handlers::{
        explorer::{graphiql_functions, ExplorerHandler},
        query::{graphql_functions, QueryHandler},
        FunctionHandler,
    },
    hooks::{HandlerKind, SharedObserver},
    options::OptionsSource,
};

/// The route parameter value that selects the explorer. Matched exactly.
pub const EXPLORER_ROUTE: &str = "graphiql";

/// Serves both handlers behind one function, dispatching on the route parameter.
pub struct CombinedRouter<E: QueryExecutor, R: ExplorerRenderer> {
    query: QueryHandler<E>,
    explorer: ExplorerHandler<R>,
    observer: SharedObserver,
}

/// Builds the combined function from the query options and the explorer options.
pub fn combined_functions<E, R>(
    query_options: impl Into<OptionsSource<E::Options>>,
    executor: E,
    explorer_options: impl Into<OptionsSource<R::Options>>,
    renderer: R,
) -> Result<CombinedRouter<E, R>, ConfigurationError>
where
    E: QueryExecutor,
    R: ExplorerRenderer,
{
    Ok(CombinedRouter::new(
        graphql_functions(query_options, executor)?,
        graphiql_functions(explorer_options, renderer),
    ))
}

impl<E: QueryExecutor, R: ExplorerRenderer> CombinedRouter<E, R> {
    /// Dispatch events go to the query handler's observer until `with_observer` replaces it.
    pub fn new(query: QueryHandler<E>, explorer: ExplorerHandler<R>) -> Self {
        let observer = query.observer.clone();
        Self {
            query,
            explorer,
            observer,
        }
    }

    /// Replaces the observer of the router and of both handlers.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.query.observer = observer.clone();
        self.explorer.observer = observer.clone();
        self.observer = observer;
        self
    }

    /// Replaces only the observer that sees dispatch decisions.
    pub fn with_dispatch_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn query_handler(&self) -> &QueryHandler<E> {
        &self.query
    }

    pub fn explorer_handler(&self) -> &ExplorerHandler<R> {
        &self.explorer
    }

    pub async fn handle(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        let route = ctx.route_param();

        if route == Some(EXPLORER_ROUTE) {
            self.observer.on_dispatch(route, HandlerKind::Explorer);
            self.explorer.handle(ctx).await;
            Ok(())
        } else {
            self.observer.on_dispatch(route, HandlerKind::Query);
            self.query.handle(ctx).await
        }
    }
}

#[async_trait]
impl<E: QueryExecutor, R: ExplorerRenderer> FunctionHandler for CombinedRouter<E, R> {
    async fn invoke(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        self.handle(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::{
        context::FunctionContext,
        handlers::testkit::{StubExecutor, StubOptions, StubRenderer},
        hooks::{
            recording::{ObservedEvent, RecordingObserver},
            InvocationOutcome,
        },
    };

    fn router() -> CombinedRouter<StubExecutor, StubRenderer> {
        combined_functions(
            StubOptions::new("query"),
            StubExecutor::responding(json!({ "data": { "ok": true } })),
            StubOptions::new("explorer"),
            StubRenderer::rendering("<html>explorer</html>"),
        )
        .expect("router builds")
    }

    #[tokio::test]
    async fn explorer_route_renders_the_page() {
        let router = router();
        let mut ctx = FunctionContext::builder().route("graphiql").build();

        router.handle(&mut ctx).await.expect("invocation succeeds");

        assert_eq!(
            ctx.res.body.as_deref(),
            Some(b"<html>explorer</html>".as_ref())
        );
        assert_eq!(router.explorer_handler().renderer().seen().len(), 1);
        assert!(router.query_handler().executor().calls().is_empty());
    }

    #[tokio::test]
    async fn other_routes_run_the_query() {
        let router = router();

        for route in [Some("graphql"), Some("GraphiQL"), Some("graphiql/"), None] {
            let mut builder = FunctionContext::builder().method(Method::POST).body("{}");
            if let Some(route) = route {
                builder = builder.route(route);
            }
            let mut ctx = builder.build();

            router.handle(&mut ctx).await.expect("invocation succeeds");

            assert_eq!(
                ctx.res.body.as_deref(),
                Some(br#"{"data":{"ok":true}}"#.as_ref()),
                "route {:?} should reach the query handler",
                route
            );
        }

        assert_eq!(router.query_handler().executor().calls().len(), 4);
        assert!(router.explorer_handler().renderer().seen().is_empty());
    }

    #[tokio::test]
    async fn handlers_keep_their_own_options() {
        let router = router();
        let mut query_ctx = FunctionContext::builder().build();
        let mut explorer_ctx = FunctionContext::builder().route("graphiql").build();

        router.handle(&mut query_ctx).await.expect("invocation succeeds");
        router.handle(&mut explorer_ctx).await.expect("invocation succeeds");

        assert_eq!(
            router.query_handler().executor().calls()[0].options,
            StubOptions::new("query")
        );
        assert_eq!(
            router.explorer_handler().renderer().seen()[0].1,
            StubOptions::new("explorer")
        );
    }

    #[tokio::test]
    async fn dispatch_observer_is_independent_of_the_handlers() {
        let query_observer = Arc::new(RecordingObserver::default());
        let explorer_observer = Arc::new(RecordingObserver::default());
        let dispatch_observer = Arc::new(RecordingObserver::default());
        let query = QueryHandler::builder()
            .options(StubOptions::new("query"))
            .executor(StubExecutor::responding(json!({})))
            .observer(query_observer.clone())
            .build()
            .expect("handler builds");
        let explorer = graphiql_functions(
            StubOptions::new("explorer"),
            StubRenderer::rendering("<html></html>"),
        )
        .with_observer(explorer_observer.clone());
        let router =
            CombinedRouter::new(query, explorer).with_dispatch_observer(dispatch_observer.clone());
        let mut ctx = FunctionContext::builder().route("graphiql").build();

        router.handle(&mut ctx).await.expect("invocation succeeds");

        assert_eq!(
            dispatch_observer.events(),
            vec![ObservedEvent::Dispatch(
                Some("graphiql".to_string()),
                HandlerKind::Explorer
            )]
        );
        assert_eq!(
            explorer_observer.events(),
            vec![
                ObservedEvent::Request(HandlerKind::Explorer, Method::GET),
                ObservedEvent::Response(HandlerKind::Explorer, InvocationOutcome::Completed),
            ]
        );
        assert!(query_observer.events().is_empty());
    }

    #[tokio::test]
    async fn new_router_reports_dispatch_to_the_query_observer() {
        let query_observer = Arc::new(RecordingObserver::default());
        let query = QueryHandler::builder()
            .options(StubOptions::new("query"))
            .executor(StubExecutor::responding(json!({})))
            .observer(query_observer.clone())
            .build()
            .expect("handler builds");
        let explorer = graphiql_functions(StubOptions::new("explorer"), StubRenderer::rendering(""));
        let router = CombinedRouter::new(query, explorer);
        let mut ctx = FunctionContext::builder().build();

        router.handle(&mut ctx).await.expect("invocation succeeds");

        assert_eq!(
            query_observer.events()[0],
            ObservedEvent::Dispatch(None, HandlerKind::Query)
        );
    }

    #[tokio::test]
    async fn observer_sees_the_dispatch() {
        let observer = Arc::new(RecordingObserver::default());
        let router = router().with_observer(observer.clone());
        let mut ctx = FunctionContext::builder().route("graphiql").build();

        router.handle(&mut ctx).await.expect("invocation succeeds");

        assert_eq!(
            observer.events(),
            vec![
                ObservedEvent::Dispatch(Some("graphiql".to_string()), HandlerKind::Explorer),
                ObservedEvent::Request(HandlerKind::Explorer, Method::GET),
                ObservedEvent::Response(HandlerKind::Explorer, InvocationOutcome::Completed),
            ]
        );
        assert_eq!(ctx.res.status, StatusCode::OK);
    }
}
