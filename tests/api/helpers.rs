use fake::faker::internet::en::{Password, SafeEmail};
use fake::Fake;
use futures::future::ready;
use newsletter_admin::configuration::{DatabaseBackend, DatabaseSettings, Settings};
use newsletter_admin::domain::{Newsletter, NewsletterFilter};
use newsletter_admin::startup::Application;
use newsletter_admin::storage::{NewsletterStore, StoreError, StoreFuture, Stores};
use newsletter_admin::telemetry::{get_tracing_subscriber, init_tracing_subscriber};
use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection};
use std::sync::Arc;
use uuid::Uuid;
use wiremock::MockServer;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

static TRACING: Lazy<()> = Lazy::new(|| {
    let test_name = "test_app";
    let default_log_level = "debug";
    if std::env::var("TEST_LOG").is_ok() {
        init_tracing_subscriber(get_tracing_subscriber(
            test_name,
            default_log_level,
            std::io::stdout,
        ));
    } else {
        init_tracing_subscriber(get_tracing_subscriber(
            test_name,
            default_log_level,
            std::io::sink,
        ));
    }
});

pub struct TestApp {
    pub addr: String,
    pub bucket_server: MockServer,
    pub public_base_url: String,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.request(reqwest::Method::GET, path).await
    }

    pub async fn request(&self, method: reqwest::Method, path: &str) -> reqwest::Response {
        self.api_client
            .request(method, &format!("{}{}", self.addr, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", self.addr, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", self.addr, path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn upload_letter(&self, body: &serde_json::Value) -> reqwest::Response {
        self.post_json("/uploadLetter", body).await
    }

    pub async fn get_json_array(&self, path: &str) -> Vec<serde_json::Value> {
        let response = self.get(path).await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Body is not a JSON array")
    }
}

pub struct TestAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestAccount {
    pub fn generate() -> Self {
        Self {
            username: format!("editor{}", (1000..9999).fake::<u16>()),
            email: SafeEmail().fake(),
            password: Password(8..16).fake(),
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
        })
    }

    pub fn credentials(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password,
        })
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_stores(Stores::in_memory()).await
}

pub async fn spawn_app_with_stores(stores: Stores) -> TestApp {
    // Lazy mean only run when it is called
    Lazy::force(&TRACING);

    let bucket_server = MockServer::start().await;
    let mut settings = test_settings(&bucket_server);
    settings.database.backend = DatabaseBackend::Memory;

    let app = Application::build_with_stores(settings.clone(), stores)
        .expect("Failed to build Server");
    launch(app, &settings, bucket_server)
}

/// The same application backed by a brand new Postgres database, which the
/// application migrates itself on startup.
pub async fn spawn_app_with_postgres() -> TestApp {
    Lazy::force(&TRACING);

    let bucket_server = MockServer::start().await;
    let mut settings = test_settings(&bucket_server);
    settings.database.backend = DatabaseBackend::Postgres;
    settings.database.database_name = create_test_database(&settings.database).await;

    let app = Application::build(settings.clone())
        .await
        .expect("Failed to build Server");
    launch(app, &settings, bucket_server)
}

fn test_settings(bucket_server: &MockServer) -> Settings {
    let mut settings = Settings::get_configuration().expect("Failed to read configuration");
    // Use port 0 to ask the OS to pick a random free port
    settings.application.port = 0;
    // Use mock server as the bucket for testing
    settings.bucket.endpoint = bucket_server.uri();
    settings.bucket.public_base_url = format!("{}/public", bucket_server.uri());
    settings.bucket.timeout_millis = 2000;
    settings.cors.allowed_origins = vec![TEST_ORIGIN.into()];
    settings
}

fn launch(app: Application, settings: &Settings, bucket_server: MockServer) -> TestApp {
    let addr = format!("http://127.0.0.1:{}", app.port());
    tokio::spawn(app.run_until_stopped());

    // Redirects are asserted on, never followed
    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        bucket_server,
        public_base_url: settings.bucket.public_base_url.clone(),
        api_client,
    }
}

// Every test gets its own database so tests never see each other's rows.
// Test databases are not dropped afterwards.
async fn create_test_database(database: &DatabaseSettings) -> String {
    let database_name = Uuid::new_v4().to_string();

    let maintenance = database.get_pg_options().database("postgres");
    let mut connection = PgConnection::connect_with(&maintenance)
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, database_name).as_str())
        .await
        .expect("Failed to create database");

    database_name
}

/// A newsletter store whose database is always down.
pub struct BrokenNewsletterStore;

impl NewsletterStore for BrokenNewsletterStore {
    fn insert<'a>(&'a self, _newsletter: &'a Newsletter) -> StoreFuture<'a, ()> {
        Box::pin(ready(Err(StoreError::Unexpected(anyhow::anyhow!(
            "database is down"
        )))))
    }

    fn find<'a>(&'a self, _filter: &'a NewsletterFilter) -> StoreFuture<'a, Vec<Newsletter>> {
        Box::pin(ready(Err(StoreError::Unexpected(anyhow::anyhow!(
            "database is down"
        )))))
    }
}

pub fn stores_with_broken_newsletters() -> Stores {
    let mut stores = Stores::in_memory();
    stores.newsletters = Arc::new(BrokenNewsletterStore);
    stores
}
