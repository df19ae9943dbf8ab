use crate::bucket_client::BucketClient;
use crate::configuration::{Settings, StaticFilesSettings};
use crate::domain::Role;
use crate::middleware::{CorsEnvelope, MiddlewareChain};
use crate::routes::{
    authenticate, create_account, get_letters, health_check, letters_by_number, list_accounts,
    page, upload_letter,
};
use crate::routing::{RequestContext, Router, RouterError};
use crate::storage::{AccountStore, NewsletterStore, Stores};
use actix_web::dev::Server;
use actix_web::web::{Bytes, Data, PayloadConfig};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Context;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Builds the server with the stores selected by `database.backend`.
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let stores = Stores::from_settings(&settings.database).await?;
        Self::build_with_stores(settings, stores)
    }

    pub fn build_with_stores(settings: Settings, stores: Stores) -> Result<Self, anyhow::Error> {
        let addr = settings.application.get_url();
        let listener =
            TcpListener::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;
        // Port 0 lets the OS pick, read back the one actually bound
        let port = listener.local_addr()?.port();

        let bucket_client = BucketClient::new(&settings.bucket)?;
        let cors = CorsEnvelope::from_settings(&settings.cors)?;
        let router = build_router(&settings.static_files)?;
        tracing::info!(
            routes = router.routes().count(),
            "Listening on {}:{}",
            settings.application.host,
            port
        );

        let server = run(
            listener,
            cors,
            router,
            stores,
            bucket_client,
            settings.application.max_body_bytes,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn build_router(static_files: &StaticFilesSettings) -> Result<Router, RouterError> {
    let mut router = Router::new(MiddlewareChain::standard()?);
    router
        .get("/health", health_check)?
        .get("/admin", page(static_files.admin_dir.join("index.html")))?
        .get("/login", page(static_files.admin_dir.join("login.html")))?
        .get("/getAdminUsers", |ctx: RequestContext| {
            list_accounts(ctx, Role::Admin)
        })?
        .post("/newAdmin", |ctx: RequestContext| {
            create_account(ctx, Role::Admin)
        })?
        .post("/authAdmin", |ctx: RequestContext| {
            authenticate(ctx, Role::Admin)
        })?
        .get("/getUsers", |ctx: RequestContext| list_accounts(ctx, Role::User))?
        .post("/newuser", |ctx: RequestContext| create_account(ctx, Role::User))?
        .post("/auth", |ctx: RequestContext| authenticate(ctx, Role::User))?
        .get("/getLetters", get_letters)?
        .get("/letters/:letterNo", letters_by_number)?
        .post("/uploadLetter", upload_letter)?
        .serve_files("/assets", static_files.assets_dir.clone())?
        .serve_files("/admin", static_files.admin_dir.clone())?;
    Ok(router)
}

fn run(
    listener: TcpListener,
    cors: CorsEnvelope,
    router: Router,
    stores: Stores,
    bucket_client: BucketClient,
    max_body_bytes: usize,
) -> Result<Server, anyhow::Error> {
    // web::Data is an Arc, every worker shares the same router and collaborators
    let router = Data::new(router);
    let newsletters: Data<dyn NewsletterStore> = Data::from(stores.newsletters);
    let accounts: Data<dyn AccountStore> = Data::from(stores.accounts);
    let bucket_client = Data::new(bucket_client);

    let server = HttpServer::new(move || {
        App::new()
            // The last `wrap` is the outermost: tracing, then CORS, then the router
            .wrap(cors.cors())
            .wrap(TracingLogger::default())
            .app_data(PayloadConfig::new(max_body_bytes))
            .app_data(router.clone())
            .app_data(newsletters.clone())
            .app_data(accounts.clone())
            .app_data(bucket_client.clone())
            // Every request goes through our own router, actix only provides the transport
            .default_service(web::to(serve))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

async fn serve(request: HttpRequest, body: Bytes, router: Data<Router>) -> HttpResponse {
    router.dispatch(request, body).await
}
