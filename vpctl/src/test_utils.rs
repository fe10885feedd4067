//! Shared helpers for tests.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    AppState, build_router, create_initial_user,
    api::models::users::Role,
    classifier::{Classifier, ForestModel},
    config::Config,
    db::models::users::UserDBResponse,
    types::UserId,
};

/// A config suitable for tests: signing key set, no bootstrap accounts,
/// cookies usable over plain HTTP.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key-not-for-production".to_string());
    config.session.cookie_secure = false;
    config
}

/// The real model artifact, parsed from the bundled file.
pub fn test_forest() -> ForestModel {
    serde_json::from_str(include_str!("../model/startup_forest.json")).expect("bundled model artifact parses")
}

pub fn test_classifier() -> Classifier {
    Classifier::from_model(test_forest()).expect("bundled model artifact validates")
}

/// A user row as the database layer would return it, without touching a
/// database. For session and unit tests only.
pub fn test_user_row(id: UserId, username: &str, role: Role) -> UserDBResponse {
    UserDBResponse {
        id,
        username: username.to_string(),
        password_hash: "unused".to_string(),
        role,
        created_at: Utc::now(),
    }
}

/// Create a user account through the normal bootstrap path.
pub async fn seed_user(pool: &SqlitePool, username: &str, password: &str, role: Role) {
    create_initial_user(pool, username, password, role)
        .await
        .expect("seeding test user succeeds");
}

/// Build a test server over the given pool, with cookie persistence so a
/// login carries into subsequent requests.
pub async fn create_test_app(pool: SqlitePool, with_model: bool) -> TestServer {
    let config = create_test_config();

    let state = AppState::builder()
        .db(pool)
        .config(config)
        .maybe_classifier(with_model.then(|| Arc::new(test_classifier())))
        .build();

    let mut server = TestServer::new(build_router(state)).expect("Failed to create test server");
    server.save_cookies();
    server
}

/// Log in through the real endpoint; the session cookie sticks to the server.
pub async fn login(server: &TestServer, username: &str, password: &str) {
    let response = server
        .post("/")
        .form(&crate::api::models::auth::LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await;

    response.assert_status(axum::http::StatusCode::SEE_OTHER);
}
