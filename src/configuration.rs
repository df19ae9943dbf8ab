use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;

pub const PORT_ENV_VAR: &str = "PORT";

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub bucket: BucketSettings,
    pub cors: CorsSettings,
    pub static_files: StaticFilesSettings,
}

impl Settings {
    pub fn get_configuration() -> Result<Settings, config::ConfigError> {
        let base_path = std::env::current_dir().map_err(|e| {
            config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
        })?;
        let config_dir = base_path.join("configuration");

        let env: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or(Environment::Local.as_str().into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        // Read the configuration from the file
        // supported file extensions: json, toml, yaml, etc
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base")))
            // ConfigBuilder will merge multiple sources to one when build
            .add_source(config::File::from(config_dir.join(env.as_str())))
            .build()?
            // Deserialize the configuration into a Settings struct
            .try_deserialize()?;

        settings.application.port =
            port_from_env(std::env::var(PORT_ENV_VAR).ok(), settings.application.port)?;
        Ok(settings)
    }
}

// A single environment variable picks the listening port, the configured one is the default
fn port_from_env(value: Option<String>, default: u16) -> Result<u16, config::ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(port) => port.parse().map_err(|_| {
            config::ConfigError::Message(format!("Invalid {}: {}", PORT_ENV_VAR, port))
        }),
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub name: String,
    pub default_log_level: String,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_body_bytes: usize,
}

impl ApplicationSettings {
    pub fn get_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn get_pg_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
            .database(&self.database_name)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct BucketSettings {
    pub endpoint: String,
    pub bucket_name: String,
    pub public_base_url: String,
    pub auth_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_millis: u64,
}

impl BucketSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_millis)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    #[serde(default)]
    pub max_age_secs: Option<usize>,
}

#[derive(serde::Deserialize, Clone)]
pub struct StaticFilesSettings {
    pub assets_dir: PathBuf,
    pub admin_dir: PathBuf,
}

enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!("Invalid APP_ENVIRONMENT: {}", other)),
        }
    }
}
