use crate::domain::{AccountEmail, Username};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[strum(serialize = "user")]
    User,
    #[strum(serialize = "admin")]
    Admin,
}

/// A stored account. The password hash never leaves the server.
#[derive(Debug, serde::Serialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: Secret<String>,
    pub created_at: DateTime<Utc>,
}

impl Clone for Account {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            password_hash: Secret::new(self.password_hash.expose_secret().clone()),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug)]
pub struct NewAccount {
    pub username: Username,
    pub email: AccountEmail,
    pub password: Secret<String>,
}

#[derive(serde::Deserialize)]
pub struct NewAccountPayload {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}

impl TryFrom<NewAccountPayload> for NewAccount {
    type Error = String;

    fn try_from(payload: NewAccountPayload) -> Result<Self, Self::Error> {
        if payload.password.expose_secret().is_empty() {
            return Err("Password cannot be empty".into());
        }
        Ok(Self {
            username: Username::parse(payload.username)?,
            email: AccountEmail::parse(payload.email)?,
            password: payload.password,
        })
    }
}
