#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub use bizdesk::auth;
pub use bizdesk::config::Config;
pub use bizdesk::db::{self, DbPool};
pub use bizdesk::error::AppError;
pub use bizdesk::models::*;
pub use bizdesk::state::AppState;
pub use bizdesk::store::{SqliteGateway, StorageGateway};
pub use bizdesk::util::{MILLIS_PER_DAY, now_millis};

/// Single-connection in-memory pool; every pooled connection to
/// `:memory:` would otherwise be a separate database.
pub fn memory_pool(init: fn(&Connection) -> rusqlite::Result<()>) -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    init(&pool.get().unwrap()).unwrap();
    pool
}

pub fn test_gateway() -> Arc<SqliteGateway> {
    Arc::new(SqliteGateway::new(
        memory_pool(db::init_db),
        memory_pool(db::init_settings_db),
    ))
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        settings_database_path: ":memory:".to_string(),
        dev_mode: true,
        trial_days: 3,
        license_poll: Duration::from_secs(5),
        bootstrap_admin_password: Some("admin-pass".to_string()),
        bootstrap_super_admin_password: Some("super-pass".to_string()),
    }
}

/// Persist a trial that started `days_ago` days before now.
pub async fn seed_trial(gateway: &dyn StorageGateway, days_ago: i64, is_active: bool) -> LicenseState {
    let mut state = LicenseState::new_trial(now_millis() - days_ago * MILLIS_PER_DAY);
    state.is_active = is_active;
    if is_active {
        state.is_trial = false;
        state.plan_type = LicensePlan::Lifetime;
    }
    gateway.save_license_state(&state).await.unwrap();
    state
}

/// A plain user that has not picked a password yet.
pub async fn seed_first_access_user(gateway: &dyn StorageGateway, username: &str) -> User {
    auth::create_user(
        gateway,
        &CreateUser {
            username: username.to_string(),
            id_type: IdType::Cpf,
            role: UserRole::User,
            password: None,
            permissions: None,
        },
    )
    .await
    .unwrap()
}

pub async fn start_app(gateway: Arc<SqliteGateway>, cancel: &CancellationToken) -> (AppState, Router) {
    let state = AppState::start(gateway, &test_config(), cancel).await.unwrap();
    let app = bizdesk::handlers::router(state.clone());
    (state, app)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}
