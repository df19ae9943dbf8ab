mod context;
mod handler;
mod pattern;
mod router;
mod static_files;

pub use context::*;
pub use handler::*;
pub use pattern::*;
pub use router::*;
pub use static_files::*;

use crate::middleware::ChainError;
use crate::utils::error_chain_fmt;
use actix_web::http::Method;
use std::fmt::{Debug, Formatter};

#[derive(thiserror::Error)]
pub enum RouterError {
    #[error("Invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("A handler for {method} {pattern} is already registered")]
    DuplicateRoute { method: Method, pattern: String },
    #[error("Invalid static files prefix `{0}`")]
    InvalidPrefix(String),
    #[error("Static files are already served under `{0}`")]
    DuplicateMount(String),
    #[error("Invalid middleware chain")]
    InvalidChain(#[from] ChainError),
}

impl Debug for RouterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
