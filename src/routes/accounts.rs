use crate::authentication::{compute_password_hash, validate_credentials, AuthError, Credentials};
use crate::domain::{Account, NewAccount, NewAccountPayload, Role};
use crate::routing::RequestContext;
use crate::storage::{AccountStore, StoreError};
use crate::utils::error_chain_fmt;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum AccountError {
    #[error("Invalid account payload")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid username or password")]
    AuthFailed(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for AccountError {
    fn status_code(&self) -> StatusCode {
        match self {
            AccountError::InvalidPayload(_) | AccountError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AccountError::Conflict(_) => StatusCode::CONFLICT,
            AccountError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            AccountError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Debug for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => AccountError::Conflict(format!("{} already exists", what)),
            StoreError::Unexpected(e) => AccountError::UnexpectedError(e),
        }
    }
}

#[tracing::instrument(name = "List accounts", skip(ctx, role), fields(role = %role.as_ref()))]
pub async fn list_accounts(ctx: RequestContext, role: Role) -> Result<HttpResponse, AccountError> {
    let store = ctx.data::<dyn AccountStore>()?;
    let accounts = store.find(role).await?;
    Ok(HttpResponse::Ok().json(accounts))
}

#[tracing::instrument(
    name = "Create an account",
    skip(ctx, role),
    fields(role = %role.as_ref(), username = tracing::field::Empty)
)]
pub async fn create_account(
    ctx: RequestContext,
    role: Role,
) -> Result<HttpResponse, AccountError> {
    let payload: NewAccountPayload = ctx.json().map_err(AccountError::InvalidPayload)?;
    let new_account = NewAccount::try_from(payload).map_err(AccountError::ValidationError)?;
    tracing::Span::current().record("username", tracing::field::display(&new_account.username));
    let store = ctx.data::<dyn AccountStore>()?;

    let password_hash = compute_password_hash(new_account.password).await?;
    let account = Account {
        id: Uuid::new_v4(),
        username: new_account.username.as_ref().to_string(),
        email: new_account.email.as_ref().to_string(),
        role,
        password_hash,
        created_at: Utc::now(),
    };
    store.insert(&account).await?;

    Ok(HttpResponse::Created().json(account))
}

#[tracing::instrument(
    name = "Authenticate an account",
    skip(ctx, role),
    fields(role = %role.as_ref(), username = tracing::field::Empty, account_id = tracing::field::Empty)
)]
pub async fn authenticate(ctx: RequestContext, role: Role) -> Result<HttpResponse, AccountError> {
    let credentials: Credentials = ctx.json().map_err(AccountError::InvalidPayload)?;
    tracing::Span::current().record("username", tracing::field::display(&credentials.username));
    let store = ctx.data::<dyn AccountStore>()?;

    let account = validate_credentials(store.get_ref(), role, credentials)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(_) => AccountError::AuthFailed(e.into()),
            AuthError::UnexpectedError(_) => AccountError::UnexpectedError(e.into()),
        })?;
    tracing::Span::current().record("account_id", tracing::field::display(&account.id));

    Ok(HttpResponse::Ok().json(account))
}
