use crate::domain::{Account, Newsletter, NewsletterFilter, Role};
use crate::storage::{AccountStore, NewsletterStore, StoreError, StoreFuture};
use futures::future::ready;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    newsletters: Mutex<Vec<Newsletter>>,
    accounts: Mutex<Vec<Account>>,
}

impl MemoryStore {
    fn poisoned(what: &str) -> StoreError {
        StoreError::Unexpected(anyhow::anyhow!("{} store lock is poisoned", what))
    }
}

impl NewsletterStore for MemoryStore {
    fn insert<'a>(&'a self, newsletter: &'a Newsletter) -> StoreFuture<'a, ()> {
        let result = self
            .newsletters
            .lock()
            .map(|mut newsletters| newsletters.push(newsletter.clone()))
            .map_err(|_| Self::poisoned("newsletter"));
        Box::pin(ready(result))
    }

    fn find<'a>(&'a self, filter: &'a NewsletterFilter) -> StoreFuture<'a, Vec<Newsletter>> {
        let result = self
            .newsletters
            .lock()
            .map(|newsletters| {
                let mut found: Vec<Newsletter> = newsletters
                    .iter()
                    .filter(|newsletter| filter.accepts(newsletter))
                    .cloned()
                    .collect();
                found.sort_by(|a, b| b.date.cmp(&a.date));
                found
            })
            .map_err(|_| Self::poisoned("newsletter"));
        Box::pin(ready(result))
    }
}

impl AccountStore for MemoryStore {
    fn insert<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
        let result = match self.accounts.lock() {
            Ok(mut accounts) => {
                let taken = accounts.iter().any(|existing| {
                    existing.role == account.role && existing.username == account.username
                });
                if taken {
                    Err(StoreError::Conflict(format!(
                        "{} `{}`",
                        account.role.as_ref(),
                        account.username
                    )))
                } else {
                    accounts.push(account.clone());
                    Ok(())
                }
            }
            Err(_) => Err(Self::poisoned("account")),
        };
        Box::pin(ready(result))
    }

    fn find(&self, role: Role) -> StoreFuture<'_, Vec<Account>> {
        let result = self
            .accounts
            .lock()
            .map(|accounts| {
                let mut found: Vec<Account> = accounts
                    .iter()
                    .filter(|account| account.role == role)
                    .cloned()
                    .collect();
                found.sort_by(|a, b| a.username.cmp(&b.username));
                found
            })
            .map_err(|_| Self::poisoned("account"));
        Box::pin(ready(result))
    }

    fn find_by_username<'a>(
        &'a self,
        role: Role,
        username: &'a str,
    ) -> StoreFuture<'a, Option<Account>> {
        let result = self
            .accounts
            .lock()
            .map(|accounts| {
                accounts
                    .iter()
                    .find(|account| account.role == role && account.username == username)
                    .cloned()
            })
            .map_err(|_| Self::poisoned("account"));
        Box::pin(ready(result))
    }
}
