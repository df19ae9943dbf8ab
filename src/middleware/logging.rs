use crate::middleware::{Middleware, MiddlewareKind, Next};
use crate::routing::{HandlerFuture, RequestContext};
use futures::FutureExt;
use std::time::Instant;
use tracing::Instrument;

/// Records method, path, matched route and final status of every routed request.
pub struct Logging;

impl Middleware for Logging {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Logging
    }

    fn call(&self, ctx: RequestContext, next: Next) -> HandlerFuture {
        let span = tracing::info_span!(
            "Routed request",
            http.method = %ctx.method(),
            http.path = %ctx.path(),
            http.route = %ctx.route(),
            http.status = tracing::field::Empty,
        );

        async move {
            let started_at = Instant::now();
            let result = next.run(ctx).await;
            // Errors are rendered by the router later, read their status without touching them
            let status = match &result {
                Ok(response) => response.status(),
                Err(error) => error.as_response_error().status_code(),
            };
            tracing::Span::current().record("http.status", status.as_u16());
            if let Err(error) = &result {
                if status.is_server_error() {
                    tracing::error!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        "Handler failed"
                    );
                } else {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        "Request rejected"
                    );
                }
            }
            tracing::info!(
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Request completed with status {}",
                status
            );
            result
        }
        .instrument(span)
        .boxed_local()
    }
}
