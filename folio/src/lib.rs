//! # folio: content service for a single-owner portfolio site
//!
//! `folio` serves the content of a personal portfolio (profile, skills, projects, contact
//! details, CV) to the public site and lets the owner edit it through an authenticated admin API.
//! Visitors can leave messages through a contact form; each message is stored and the owner is
//! notified by email.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) and persists to
//! PostgreSQL, or to an in-process store for development. Content lives in a shared
//! [`ContentStore`](sync::store::ContentStore): reads are served from memory, edits mark the
//! content dirty and a debouncer saves it once the edits go quiet. A poller reloads from the
//! database so that edits made elsewhere show up. When the database is unreachable, content is
//! served from a local JSON cache (or the built-in defaults) and saves go to the cache only.
//!
//! ### Core Components
//!
//! - [`api`]: HTTP handlers and envelopes for the public, authentication and admin surfaces
//! - [`auth`]: the configured admin identity, password hashing and session tokens
//! - [`content`]: the content model, seed defaults, merge and validation rules
//! - [`db`]: the [`Backend`](db::Backend) seam with PostgreSQL and in-memory implementations
//! - [`sync`]: the content store, remote access and local cache
//! - [`storage`]: uploads to S3-compatible object storage with an inline fallback
//! - [`notifications`]: recording and delivering contact form notifications
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use folio::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = folio::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     folio::telemetry::init_telemetry(config.logging.format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
mod email;
pub mod errors;
pub mod notifications;
mod openapi;
pub mod storage;
pub mod sync;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::AdminCredentials,
    config::{CorsOrigin, DatabaseConfig, PoolSettings},
    db::{Backend, InMemoryBackend, PostgresBackend},
    email::EmailService,
    notifications::{HttpNotifier, Mailer, NotificationService, Notifier},
    openapi::ApiDoc,
    storage::FileUploads,
    sync::{remote::RemoteSync, store::ContentStore},
};
pub use config::Config;

/// Application state shared across all request handlers.
///
/// - `config`: Application configuration
/// - `backend`: Database access, used directly by the inbox and notification listings
/// - `store`: Current content and its sync state
/// - `notifications`: Records and delivers owner notifications
/// - `uploads`: Object storage for images and the CV
/// - `admin`: Configured admin identity; `None` disables the admin API
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub store: ContentStore,
    pub notifications: Arc<NotificationService>,
    pub uploads: Arc<FileUploads>,
    pub admin: Option<AdminCredentials>,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
}

/// Connect to the configured backend and run migrations.
///
/// An unreachable PostgreSQL server is not fatal: the pool connects lazily and the content store
/// starts from the local cache until `POST /admin/api/portfolio/reload` finds the database again.
/// Migrations only run when the server is reachable at startup; a failing migration on a
/// reachable server is fatal.
async fn setup_database(config: &Config) -> anyhow::Result<(Arc<dyn Backend>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::Postgres { url, pool } => {
            info!("Using PostgreSQL database");
            let pg = pool_options(pool).connect_lazy(url)?;

            match pg.acquire().await {
                Ok(conn) => {
                    drop(conn);
                    migrator().run(&pg).await?;
                    debug!("Migrations applied");
                }
                Err(e) => {
                    warn!(error = %e, "Database unreachable at startup, serving cached content and skipping migrations");
                }
            }

            Ok((Arc::new(PostgresBackend::new(pg.clone())), Some(pg)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory database: content is kept in the local cache only across restarts");
            Ok((Arc::new(InMemoryBackend::new()), None))
        }
    }
}

/// Wire the services together and load the initial content.
///
/// Contact form notifications go to `notifications.endpoint` when one is configured, and are
/// delivered in-process otherwise.
#[instrument(skip_all)]
pub async fn create_app_state(
    config: Config,
    backend: Arc<dyn Backend>,
    uploads: FileUploads,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<AppState> {
    let admin = AdminCredentials::from_config(&config.admin, &config.auth.password)?;
    if admin.is_none() {
        warn!("No admin configured, the admin API is disabled");
    }

    let notifications = Arc::new(NotificationService::new(backend.clone(), mailer, config.notifications.clone()));
    let notifier: Arc<dyn Notifier> = match &config.notifications.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Forwarding contact notifications");
            Arc::new(HttpNotifier::new(endpoint.clone())?)
        }
        None => notifications.clone() as Arc<dyn Notifier>,
    };

    let remote = Arc::new(RemoteSync::new(backend.clone(), config.sync.owner_key.clone(), notifier));
    let store = ContentStore::new(remote, &config.sync);
    let source = store.load().await;
    info!(source = ?source, "Content loaded");

    if !uploads.initialize().await {
        warn!("Some upload buckets could not be initialised, uploads may fall back to inline storage");
    }

    Ok(AppState::builder()
        .config(config)
        .backend(backend)
        .store(store)
        .notifications(notifications)
        .uploads(Arc::new(uploads))
        .maybe_admin(admin)
        .build())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router: public API, authentication, admin API, health check and docs.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, contact, messages, notifications, portfolio, uploads};

    let public_routes = Router::new()
        .route("/api/portfolio", get(portfolio::get_portfolio))
        .route("/api/portfolio/status", get(portfolio::get_status))
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/send-notification", post(notifications::send_notification));

    let auth_routes = Router::new()
        .route("/authentication/login", post(auth::login))
        .route("/authentication/logout", post(auth::logout))
        .route("/authentication/session", get(auth::get_session));

    // Inline data URLs can make content bodies as large as uploads
    let admin_routes = Router::new()
        .route("/profile", patch(portfolio::update_profile))
        .route("/skills", put(portfolio::replace_skills))
        .route("/projects", put(portfolio::replace_projects))
        .route("/contact", patch(portfolio::update_contact))
        .route("/cv", patch(portfolio::update_cv))
        .route("/portfolio/save", post(portfolio::save))
        .route("/portfolio/reload", post(portfolio::reload))
        .route("/portfolio/reset", post(portfolio::reset))
        .route("/uploads", delete(uploads::delete_upload))
        .route("/uploads/profile-image", post(uploads::upload_profile_image))
        .route("/uploads/projects/{project_id}/image", post(uploads::upload_project_image))
        .route("/uploads/cv", post(uploads::upload_cv).delete(uploads::delete_cv))
        .route("/messages", get(messages::list_messages))
        .route("/messages/{id}", patch(messages::update_message))
        .route("/notifications", get(notifications::list_notifications))
        .layer(DefaultBodyLimit::max(state.config.upload_body_limit()));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(public_routes)
        .merge(auth_routes)
        .nest("/admin/api", admin_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Background tasks running alongside the HTTP server: the save debouncer and the poller.
///
/// [`shutdown`](BackgroundServices::shutdown) cancels them and waits; the debouncer flushes
/// pending edits before it exits. Dropping the struct cancels them too, through `drop_guard`.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<DropGuard>,
}

impl BackgroundServices {
    fn start(store: &ContentStore) -> Self {
        let shutdown_token = CancellationToken::new();
        let background_tasks = store.spawn_background(shutdown_token.clone());
        Self {
            background_tasks,
            drop_guard: Some(shutdown_token.clone().drop_guard()),
            shutdown_token,
        }
    }

    /// Gracefully shutdown all background tasks
    pub async fn shutdown(mut self) {
        self.shutdown_token.cancel();
        if let Some(guard) = self.drop_guard.take() {
            guard.disarm();
        }

        for handle in self.background_tasks {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
    }
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] connects the database, loads content and starts the
///    background tasks
/// 2. **Serve**: [`Application::serve`] binds the configured address and handles requests
/// 3. **Shutdown**: once the shutdown future resolves, in-flight requests drain, pending edits are
///    saved and the pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting folio with configuration: {:#?}", config);

        let (backend, pool) = setup_database(&config).await?;
        let uploads = FileUploads::from_config(&config.storage, config.uploads.clone()).await?;
        let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&config.email)?);

        let state = create_app_state(config.clone(), backend, uploads, mailer).await?;
        let router = build_router(&state)?;
        let bg_services = BackgroundServices::start(&state.store);

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("folio listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Stopping the debouncer saves anything still pending
        info!("Stopping background tasks...");
        self.bg_services.shutdown().await;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::create_test_config;

    #[tokio::test]
    async fn test_healthz_and_docs() {
        let app = crate::test_utils::create_test_app().await;

        let health = app.server.get("/healthz").await;
        health.assert_status_ok();
        health.assert_text("OK");

        let doc = app.server.get("/docs/openapi.json").await;
        doc.assert_status_ok();
        let doc: serde_json::Value = doc.json();
        assert!(doc["paths"]["/api/portfolio"].is_object());

        app.server.get("/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_application_with_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());

        let app = Application::new(config).await.unwrap();
        let (server, bg_services) = app.into_test_server();

        server.get("/api/portfolio").await.assert_status_ok();
        let status: serde_json::Value = server.get("/api/portfolio/status").await.json();
        assert_eq!(status["is_database_connected"], true);

        bg_services.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_edits_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let cache_dir = config.sync.cache_dir.clone();

        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let uploads = FileUploads::new(None, &config.storage, config.uploads.clone());
        let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&config.email).unwrap());
        let state = create_app_state(config, backend, uploads, mailer).await.unwrap();
        let bg_services = BackgroundServices::start(&state.store);

        state
            .store
            .update_contact(crate::content::ContactPatch {
                phone: Some("+1 555 0199".into()),
                ..Default::default()
            })
            .await;
        bg_services.shutdown().await;

        let cached = crate::sync::cache::LocalCache::new(&cache_dir).read().await.unwrap();
        assert_eq!(cached["contact"]["phone"], "+1 555 0199");
        assert!(!state.store.status().await.pending_edits);
    }

    #[test]
    fn test_cors_layer_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config(dir.path());
        config.auth.cors.allowed_origins = vec![CorsOrigin::Url("https://portfolio.example.com/".parse().unwrap())];
        config.auth.cors.max_age = Some(600);
        assert!(create_cors_layer(&config).is_ok());
    }
}
