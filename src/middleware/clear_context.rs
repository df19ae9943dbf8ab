use crate::middleware::{Middleware, MiddlewareKind, Next};
use crate::routing::{HandlerFuture, RequestContext};
use futures::FutureExt;

/// Releases request-scoped storage once the terminal handler is done with it.
pub struct ClearContext;

impl Middleware for ClearContext {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::ClearContext
    }

    fn call(&self, ctx: RequestContext, next: Next) -> HandlerFuture {
        let guard = ScopeGuard(ctx.clone());
        async move {
            // Dropped on every exit path: normal return, error, unwinding panic
            // or the future being dropped before completion
            let _guard = guard;
            next.run(ctx).await
        }
        .boxed_local()
    }
}

struct ScopeGuard(RequestContext);

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.0.clear();
    }
}
