//! Database collaborators.
//!
//! Handlers only see the two narrow traits below. `PostgresStore` is the
//! production implementation; `MemoryStore` backs tests and local runs
//! without a database.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use crate::configuration::{DatabaseBackend, DatabaseSettings};
use crate::domain::{Account, Newsletter, NewsletterFilter, Role};
use crate::utils::error_chain_fmt;
use futures::future::BoxFuture;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub trait NewsletterStore: Send + Sync {
    fn insert<'a>(&'a self, newsletter: &'a Newsletter) -> StoreFuture<'a, ()>;

    /// Matching newsletters, newest `date` first.
    fn find<'a>(&'a self, filter: &'a NewsletterFilter) -> StoreFuture<'a, Vec<Newsletter>>;
}

pub trait AccountStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the username is taken for that role.
    fn insert<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()>;

    /// Accounts of one role ordered by username.
    fn find(&self, role: Role) -> StoreFuture<'_, Vec<Account>>;

    fn find_by_username<'a>(
        &'a self,
        role: Role,
        username: &'a str,
    ) -> StoreFuture<'a, Option<Account>>;
}

#[derive(Clone)]
pub struct Stores {
    pub newsletters: Arc<dyn NewsletterStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            newsletters: store.clone(),
            accounts: store,
        }
    }

    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        Self {
            newsletters: store.clone(),
            accounts: store,
        }
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, anyhow::Error> {
        match settings.backend {
            DatabaseBackend::Memory => {
                tracing::warn!("Using the in-memory database, data will not survive a restart");
                Ok(Self::in_memory())
            }
            DatabaseBackend::Postgres => {
                let store = PostgresStore::new(get_pg_pool(settings));
                store.migrate().await?;
                Ok(Self::postgres(store))
            }
        }
    }
}
