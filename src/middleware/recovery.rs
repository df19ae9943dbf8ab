use crate::middleware::{Middleware, MiddlewareKind, Next};
use crate::routing::{HandlerFuture, RequestContext};
use actix_web::HttpResponse;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Turns a panic anywhere below it into a `500 Internal Server Error`.
pub struct Recovery;

impl Middleware for Recovery {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Recovery
    }

    fn call(&self, ctx: RequestContext, next: Next) -> HandlerFuture {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        // The inner chain is only entered on first poll, so synchronous panics
        // raised while building the inner futures are caught as well
        AssertUnwindSafe(async move { next.run(ctx).await })
            .catch_unwind()
            .map(move |outcome| match outcome {
                Ok(result) => result,
                Err(panic) => {
                    tracing::error!(
                        http.method = %method,
                        http.path = %path,
                        panic.message = %panic_message(panic.as_ref()),
                        "Recovered from a panic while handling request"
                    );
                    Ok(HttpResponse::InternalServerError().finish())
                }
            })
            .boxed_local()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
