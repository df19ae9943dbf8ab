use crate::domain::{Account, Role};
use crate::storage::AccountStore;
use crate::utils::{error_chain_fmt, spawn_blocking_task_with_tracing};
use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use std::fmt::Debug;

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Invalid Credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

#[tracing::instrument(
    name = "Validate credentials",
    skip(store, credentials),
    fields(username = %credentials.username, role = %role.as_ref())
)]
pub async fn validate_credentials(
    store: &dyn AccountStore,
    role: Role,
    credentials: Credentials,
) -> Result<Account, AuthError> {
    const HASHED_PASSWORD_IF_INVALID_USERNAME: &str = "$argon2d$v=19$m=15000,t=2,p=1\
        $QhQyHN2/VvKTi5QYqo+VZA\
        $JkXwR/rdESxDi2DfcCf8lk2U4+ShyN3CXZATJQvP0lg";

    let account = store
        .find_by_username(role, &credentials.username)
        .await
        .context("Failed to look up account")?;
    let expected_password_hash = match &account {
        Some(account) => Secret::new(account.password_hash.expose_secret().clone()),
        None => Secret::new(HASHED_PASSWORD_IF_INVALID_USERNAME.to_string()),
    };

    // The hash is verified even for unknown usernames so both paths take the same time
    spawn_blocking_task_with_tracing(move || {
        verify_password_hash(credentials.password, expected_password_hash)
    })
    .await
    .context("Failed to spawn blocking task")
    .map_err(AuthError::UnexpectedError)??;

    account.ok_or_else(|| {
        AuthError::InvalidCredentials(anyhow::anyhow!("Invalid username or password"))
    })
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
pub fn verify_password_hash(
    password: Secret<String>,
    expected_password_hash: Secret<String>,
) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .map_err(|e| AuthError::UnexpectedError(anyhow::anyhow!(e)))?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
        .context("Failed to verify password hash")
        .map_err(AuthError::InvalidCredentials)
}

pub fn hash_password(password: &Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to build argon2 parameters")?;
    let hasher = Argon2::new(Algorithm::Argon2d, Version::V0x13, params);
    let password_hash = hasher
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to hash password")?;

    Ok(Secret::new(password_hash.to_string()))
}

/// Hashes on the blocking pool, argon2 is too slow for the event loop.
#[tracing::instrument(name = "Compute password hash", skip_all)]
pub async fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    spawn_blocking_task_with_tracing(move || hash_password(&password))
        .await
        .context("Failed to spawn blocking task")?
}
