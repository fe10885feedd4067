//! # vpctl: Venture Prediction Control Panel
//!
//! `vpctl` is a small role-gated web portal in front of a pre-trained startup
//! outcome classifier. Users sign in, submit feature values through a form (or
//! programmatically as JSON clients), and get back a binary Success/Failure
//! prediction; every evaluated submission is persisted together with an audit
//! trail. Administrators get a console over the recent activity.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses SQLite (via sqlx) for persistence, so a single
//! binary plus one file on disk is a complete deployment.
//!
//! ### Request flow
//!
//! A browser request carries a session cookie holding a signed JWT. The
//! session authority ([`auth::session`]) verifies the signature, checks the
//! token against an in-memory liveness table (which makes logout immediate),
//! and enforces the role the route requires. Handlers then talk to the
//! database through per-entity repositories ([`db::handlers`]) and render
//! pages with minijinja ([`api::render`]).
//!
//! `POST /predict` is the core pipeline: coerce the raw form fields against
//! the model's feature schema, run the decision forest ([`classifier`]),
//! persist the prediction record and an audit entry, then either redirect the
//! browser back to the dashboard or answer JSON, depending on what the caller
//! asked for.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use vpctl::{Application, Config, config::Args};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse();
//!     let config = Config::load(&args.config)?;
//!
//!     vpctl::telemetry::init_telemetry();
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use crate::{
    api::models::users::Role,
    auth::{password, session::Sessions},
    classifier::Classifier,
    db::{handlers::Users, models::users::UserCreateDBRequest},
};

pub use config::Config;
pub use types::{SessionId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// `None` when the model artifact is missing; the app runs degraded.
    pub classifier: Option<Arc<Classifier>>,
    #[builder(default)]
    pub sessions: Arc<Sessions>,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create a user account if the username is not already taken.
///
/// Idempotent: an existing account is left untouched, password included, so
/// bootstrap seeding cannot clobber accounts that were changed after first
/// run.
#[instrument(skip(db, password))]
pub async fn create_initial_user(db: &SqlitePool, username: &str, password: &str, role: Role) -> anyhow::Result<Option<UserId>> {
    let mut conn = db.acquire().await?;

    if Users::new(&mut conn).get_by_username(username).await?.is_some() {
        debug!("bootstrap user already exists");
        return Ok(None);
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .context("join password hashing task")??;

    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, "bootstrap user created");
    Ok(Some(user.id))
}

/// Open the SQLite pool, run migrations, and seed bootstrap accounts.
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)
        .with_context(|| format!("parse database url {}", config.database.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await.context("open database")?;

    migrator().run(&pool).await.context("run migrations")?;

    if let Some(password) = &config.bootstrap.admin_password {
        create_initial_user(&pool, &config.bootstrap.admin_username, password, Role::Admin).await?;
    }
    if let Some(password) = &config.bootstrap.demo_password {
        create_initial_user(&pool, &config.bootstrap.demo_username, password, Role::User).await?;
    }

    Ok(pool)
}

/// Load the model artifact, tolerating its absence.
///
/// A missing file is a warning, not a startup failure: the portal still
/// serves logins and records degraded predictions. A present-but-invalid
/// artifact is an error, since that points at a broken deployment.
pub fn load_classifier(config: &Config) -> anyhow::Result<Option<Arc<Classifier>>> {
    if !config.model_path.exists() {
        warn!(path = %config.model_path.display(), "model artifact not found, predictions disabled");
        return Ok(None);
    }

    let classifier = Classifier::load(&config.model_path)?;
    info!(model = classifier.name(), features = ?classifier.schema(), "model loaded");
    Ok(Some(Arc::new(classifier)))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::handlers::auth::login_form).post(api::handlers::auth::login))
        .route("/predict", post(api::handlers::predictions::predict))
        .route("/user", get(api::handlers::dashboard::user_dashboard))
        .route("/admin", get(api::handlers::admin::admin_dashboard))
        .route("/logout", get(api::handlers::auth::logout))
        .route("/healthz", get(api::handlers::health))
        .fallback(api::handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting prediction portal with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool)
    }

    /// Like [`Application::new`] but over an existing pool (migrations and
    /// seeding are assumed done).
    pub fn new_with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let classifier = load_classifier(&config)?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_classifier(classifier)
            .build();

        Ok(Self {
            router: build_router(state),
            config,
            pool,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Prediction portal listening on http://{bind_addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
