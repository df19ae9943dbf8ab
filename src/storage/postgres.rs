use crate::configuration::DatabaseSettings;
use crate::domain::{Account, Newsletter, NewsletterFilter, Role};
use crate::storage::{AccountStore, NewsletterStore, StoreError, StoreFuture};
use anyhow::Context;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

pub fn get_pg_pool(database: &DatabaseSettings) -> PgPool {
    // Connections are opened on first use, startup never waits for the database
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(database.get_pg_options())
}

pub struct PostgresStore {
    pg_pool: PgPool,
}

impl PostgresStore {
    pub fn new(pg_pool: PgPool) -> Self {
        Self { pg_pool }
    }

    #[tracing::instrument(name = "Run database migrations", skip(self))]
    pub async fn migrate(&self) -> Result<(), anyhow::Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pg_pool)
            .await
            .context("Failed to migrate the database")
    }
}

impl NewsletterStore for PostgresStore {
    fn insert<'a>(&'a self, newsletter: &'a Newsletter) -> StoreFuture<'a, ()> {
        Box::pin(insert_newsletter(&self.pg_pool, newsletter))
    }

    fn find<'a>(&'a self, filter: &'a NewsletterFilter) -> StoreFuture<'a, Vec<Newsletter>> {
        Box::pin(find_newsletters(&self.pg_pool, filter))
    }
}

impl AccountStore for PostgresStore {
    fn insert<'a>(&'a self, account: &'a Account) -> StoreFuture<'a, ()> {
        Box::pin(insert_account(&self.pg_pool, account))
    }

    fn find(&self, role: Role) -> StoreFuture<'_, Vec<Account>> {
        Box::pin(find_accounts(&self.pg_pool, role))
    }

    fn find_by_username<'a>(
        &'a self,
        role: Role,
        username: &'a str,
    ) -> StoreFuture<'a, Option<Account>> {
        Box::pin(find_account_by_username(&self.pg_pool, role, username))
    }
}

#[tracing::instrument(
    name = "Insert newsletter into database",
    skip(pg_pool, newsletter),
    fields(newsletter_id = %newsletter.id, letter_no = %newsletter.letter_no)
)]
async fn insert_newsletter(pg_pool: &PgPool, newsletter: &Newsletter) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO newsletters (id, title, description, date, image, back_image, letter_no, kind)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(newsletter.id)
    .bind(&newsletter.title)
    .bind(&newsletter.description)
    .bind(&newsletter.date)
    .bind(&newsletter.image)
    .bind(&newsletter.back_image)
    .bind(&newsletter.letter_no)
    .bind(&newsletter.kind)
    .execute(pg_pool)
    .await
    .context("Failed to insert newsletter")?;
    Ok(())
}

#[tracing::instrument(name = "Find newsletters in database", skip(pg_pool))]
async fn find_newsletters(
    pg_pool: &PgPool,
    filter: &NewsletterFilter,
) -> Result<Vec<Newsletter>, StoreError> {
    let newsletters = sqlx::query_as::<_, Newsletter>(
        r#"
        SELECT id, title, description, date, image, back_image, letter_no, kind
        FROM newsletters
        WHERE ($1::TEXT IS NULL OR letter_no = $1)
          AND ($2::TEXT IS NULL OR kind = $2)
        ORDER BY date DESC
        "#,
    )
    .bind(filter.letter_no.as_deref())
    .bind(filter.kind.as_deref())
    .fetch_all(pg_pool)
    .await
    .context("Failed to fetch newsletters")?;
    Ok(newsletters)
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            username: row.username,
            email: row.email,
            role: Role::from_str(&row.role)
                .with_context(|| format!("Unknown role `{}` stored in database", row.role))?,
            password_hash: Secret::new(row.password_hash),
            created_at: row.created_at,
        })
    }
}

#[tracing::instrument(
    name = "Insert account into database",
    skip(pg_pool, account),
    fields(username = %account.username, role = %account.role.as_ref())
)]
async fn insert_account(pg_pool: &PgPool, account: &Account) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO accounts (id, username, email, role, password_hash, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(account.id)
    .bind(&account.username)
    .bind(&account.email)
    .bind(account.role.as_ref())
    .bind(account.password_hash.expose_secret())
    .bind(account.created_at)
    .execute(pg_pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => Err(
            StoreError::Conflict(format!("{} `{}`", account.role.as_ref(), account.username)),
        ),
        Err(e) => Err(anyhow::Error::new(e)
            .context("Failed to insert account")
            .into()),
    }
}

#[tracing::instrument(name = "Find accounts in database", skip(pg_pool))]
async fn find_accounts(pg_pool: &PgPool, role: Role) -> Result<Vec<Account>, StoreError> {
    let rows = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT id, username, email, role, password_hash, created_at
        FROM accounts
        WHERE role = $1
        ORDER BY username
        "#,
    )
    .bind(role.as_ref())
    .fetch_all(pg_pool)
    .await
    .context("Failed to fetch accounts")?;

    let accounts = rows
        .into_iter()
        .map(Account::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

#[tracing::instrument(name = "Find account by username in database", skip(pg_pool))]
async fn find_account_by_username(
    pg_pool: &PgPool,
    role: Role,
    username: &str,
) -> Result<Option<Account>, StoreError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT id, username, email, role, password_hash, created_at
        FROM accounts
        WHERE role = $1 AND username = $2
        "#,
    )
    .bind(role.as_ref())
    .bind(username)
    .fetch_optional(pg_pool)
    .await
    .context("Failed to fetch account")?;

    Ok(row.map(Account::try_from).transpose()?)
}
