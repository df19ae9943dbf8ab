use crate::routing::RequestContext;
use actix_web::HttpResponse;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::future::Future;

pub type HandlerResult = Result<HttpResponse, actix_web::Error>;

// actix-web runs every request on a single worker thread, futures don't need to be `Send`
pub type HandlerFuture = LocalBoxFuture<'static, HandlerResult>;

/// Terminal request-handling logic bound to a route.
///
/// The handler object itself is shared by every worker thread, so it must be
/// `Send + Sync`; the future it returns stays on the worker serving the request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> HandlerFuture;
}

// Lets plain `async fn(RequestContext) -> Result<HttpResponse, E>` be registered directly
impl<F, Fut, E> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, E>> + 'static,
    E: Into<actix_web::Error> + 'static,
{
    fn call(&self, ctx: RequestContext) -> HandlerFuture {
        (self)(ctx).map(|result| result.map_err(Into::into)).boxed_local()
    }
}
