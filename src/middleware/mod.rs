mod clear_context;
mod cors;
mod logging;
mod recovery;

pub use clear_context::*;
pub use cors::*;
pub use logging::*;
pub use recovery::*;

use crate::routing::{Handler, HandlerFuture, RequestContext};
use crate::utils::error_chain_fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Position-sensitive middlewares are identified by kind so the chain can
/// check their order when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum MiddlewareKind {
    Recovery,
    Logging,
    ClearContext,
    Custom,
}

pub trait Middleware: Send + Sync + 'static {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Custom
    }

    fn call(&self, ctx: RequestContext, next: Next) -> HandlerFuture;
}

/// The rest of the chain below a middleware, ending with the terminal handler.
#[derive(Clone)]
pub struct Next {
    inner: Arc<dyn Handler>,
}

impl Next {
    pub fn run(&self, ctx: RequestContext) -> HandlerFuture {
        self.inner.call(ctx)
    }
}

struct Wrapped {
    middleware: Arc<dyn Middleware>,
    next: Next,
}

impl Handler for Wrapped {
    fn call(&self, ctx: RequestContext) -> HandlerFuture {
        self.middleware.call(ctx, self.next.clone())
    }
}

#[derive(thiserror::Error)]
pub enum ChainError {
    #[error("{0} middleware must be the outermost layer")]
    RecoveryNotOutermost(&'static str),
    #[error("{0} middleware must wrap the terminal handler directly")]
    ClearContextNotInnermost(&'static str),
    #[error("{0} middleware is listed more than once")]
    Duplicate(&'static str),
}

impl Debug for ChainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Ordered middlewares applied to every route, outermost first.
#[derive(Clone)]
pub struct MiddlewareChain {
    layers: Arc<[Arc<dyn Middleware>]>,
}

impl MiddlewareChain {
    pub fn new(layers: Vec<Arc<dyn Middleware>>) -> Result<Self, ChainError> {
        let kinds: Vec<MiddlewareKind> = layers.iter().map(|layer| layer.kind()).collect();

        for kind in [
            MiddlewareKind::Recovery,
            MiddlewareKind::Logging,
            MiddlewareKind::ClearContext,
        ] {
            if kinds.iter().filter(|k| **k == kind).count() > 1 {
                return Err(ChainError::Duplicate(kind.into()));
            }
        }

        // Recovery has to observe failures raised by every other layer
        if let Some(position) = kinds.iter().position(|k| *k == MiddlewareKind::Recovery) {
            if position != 0 {
                return Err(ChainError::RecoveryNotOutermost(
                    MiddlewareKind::Recovery.into(),
                ));
            }
        }

        // Clear-context runs as soon as the terminal handler returns
        if let Some(position) = kinds
            .iter()
            .position(|k| *k == MiddlewareKind::ClearContext)
        {
            if position + 1 != kinds.len() {
                return Err(ChainError::ClearContextNotInnermost(
                    MiddlewareKind::ClearContext.into(),
                ));
            }
        }

        Ok(Self {
            layers: layers.into(),
        })
    }

    /// Recovery, logging, clear-context.
    pub fn standard() -> Result<Self, ChainError> {
        Self::new(vec![
            Arc::new(Recovery),
            Arc::new(Logging),
            Arc::new(ClearContext),
        ])
    }

    pub fn kinds(&self) -> Vec<MiddlewareKind> {
        self.layers.iter().map(|layer| layer.kind()).collect()
    }

    pub fn then(&self, handler: impl Handler) -> Arc<dyn Handler> {
        self.then_arc(Arc::new(handler))
    }

    pub fn then_arc(&self, handler: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.layers
            .iter()
            .rev()
            .fold(handler, |inner, middleware| {
                Arc::new(Wrapped {
                    middleware: middleware.clone(),
                    next: Next { inner },
                })
            })
    }
}
