use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, StatusCode};

use crate::{
    context::RequestContext,
    error::BoxError,
    explorer::ExplorerRenderer,
    handlers::FunctionHandler,
    hooks::{default_observer, HandlerKind, InvocationOutcome, SharedObserver},
    options::OptionsSource,
};

/// Serves the interactive exploration page.
///
/// Every failure, including options that cannot be computed, is written as a `500` whose body
/// is the error message. Completion is signaled on both paths.
pub struct ExplorerHandler<R: ExplorerRenderer> {
    options: OptionsSource<R::Options>,
    renderer: R,
    pub(crate) observer: SharedObserver,
}

/// Builds an explorer handler from a single options source.
pub fn graphiql_functions<R: ExplorerRenderer>(
    options: impl Into<OptionsSource<R::Options>>,
    renderer: R,
) -> ExplorerHandler<R> {
    ExplorerHandler::new(options, renderer)
}

impl<R: ExplorerRenderer> ExplorerHandler<R> {
    pub fn new(options: impl Into<OptionsSource<R::Options>>, renderer: R) -> Self {
        Self {
            options: options.into(),
            renderer,
            observer: default_observer(),
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub async fn handle(&self, ctx: &mut dyn RequestContext) {
        self.observer.on_request(HandlerKind::Explorer, ctx.method());

        match self.render(&*ctx).await {
            Ok(html) => {
                ctx.set_header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/html"),
                );
                ctx.set_body(Bytes::from(html));
                self.observer
                    .on_response(HandlerKind::Explorer, InvocationOutcome::Completed);
            }
            Err(err) => {
                ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                ctx.set_body(Bytes::from(err.to_string()));
                self.observer.on_response(
                    HandlerKind::Explorer,
                    InvocationOutcome::Failed(StatusCode::INTERNAL_SERVER_ERROR),
                );
            }
        }

        ctx.done();
    }

    async fn render(&self, ctx: &dyn RequestContext) -> Result<String, BoxError> {
        let options = self.options.resolve(ctx).await?;

        self.renderer
            .render(ctx.query_params(), &options, ctx)
            .await
    }
}

#[async_trait]
impl<R: ExplorerRenderer> FunctionHandler for ExplorerHandler<R> {
    async fn invoke(&self, ctx: &mut dyn RequestContext) -> Result<(), BoxError> {
        self.handle(ctx).await;
        Ok(())
    }
}
