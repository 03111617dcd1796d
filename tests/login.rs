//! First-access password bootstrap, login outcomes and built-in accounts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use tokio_util::sync::CancellationToken;

mod common;
use common::*;

use bizdesk::auth::{ADMIN_ID, SUPER_ADMIN_ID, bootstrap_admins, builtin_admins, hash_password, login};
use bizdesk::error::StoreError;
use bizdesk::store::StoreResult;

#[tokio::test]
async fn test_first_access_sets_password_then_requires_it() {
    let gateway = test_gateway();
    let user = seed_first_access_user(gateway.as_ref(), "12345678900").await;
    assert!(user.is_first_access);

    let logged_in = login(gateway.as_ref(), "12345678900", "abcd").await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(!logged_in.is_first_access);

    let stored = gateway.list_users().await.unwrap();
    let stored = stored.iter().find(|u| u.id == user.id).unwrap();
    assert!(!stored.is_first_access);
    assert!(stored.password_hash.as_deref().unwrap().starts_with("$argon2"));

    // Same password works, a different one no longer overwrites it
    login(gateway.as_ref(), "12345678900", "abcd").await.unwrap();
    let err = login(gateway.as_ref(), "12345678900", "wxyz").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_first_access_short_password_rejected_without_mutation() {
    let gateway = test_gateway();
    let user = seed_first_access_user(gateway.as_ref(), "maria").await;

    let err = login(gateway.as_ref(), "maria", "abc").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored = gateway.list_users().await.unwrap();
    let stored = stored.iter().find(|u| u.id == user.id).unwrap();
    assert!(stored.is_first_access);
    assert!(stored.password_hash.is_none());

    // The user can still pick a valid password afterwards
    login(gateway.as_ref(), "maria", "abcd").await.unwrap();
}

#[tokio::test]
async fn test_unknown_username_is_not_found() {
    let gateway = test_gateway();
    seed_first_access_user(gateway.as_ref(), "maria").await;

    for password in ["abcd", "x", "a much longer password"] {
        let err = login(gateway.as_ref(), "joao", password).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "{:?}", err);
    }
}

#[tokio::test]
async fn test_username_match_is_case_sensitive() {
    let gateway = test_gateway();
    seed_first_access_user(gateway.as_ref(), "Maria").await;

    let err = login(gateway.as_ref(), "maria", "abcd").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_empty_fields_rejected() {
    let gateway = test_gateway();
    assert!(matches!(
        login(gateway.as_ref(), "", "abcd").await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert!(matches!(
        login(gateway.as_ref(), "maria", "").await.unwrap_err(),
        AppError::Validation(_)
    ));
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let gateway = test_gateway();
    let admins = builtin_admins(Some("admin-pass".into()), Some("super-pass".into()));

    assert_eq!(bootstrap_admins(gateway.as_ref(), &admins).await, 2);
    assert_eq!(bootstrap_admins(gateway.as_ref(), &admins).await, 0);

    let users = gateway.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.id == ADMIN_ID));
    assert!(users.iter().any(|u| u.id == SUPER_ADMIN_ID));
    assert!(users.iter().all(|u| u.role == UserRole::Admin && !u.is_first_access));
    assert!(users.iter().all(|u| u.permissions == Some(AdminPermissions::FULL)));
}

#[tokio::test]
async fn test_bootstrap_keeps_existing_admin_password() {
    let gateway = test_gateway();
    bootstrap_admins(gateway.as_ref(), &builtin_admins(Some("first".into()), None)).await;
    bootstrap_admins(gateway.as_ref(), &builtin_admins(Some("second".into()), None)).await;

    login(gateway.as_ref(), "admin", "first").await.unwrap();
    let err = login(gateway.as_ref(), "admin", "second").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_create_user_rejects_duplicate_username() {
    let gateway = test_gateway();
    seed_first_access_user(gateway.as_ref(), "maria").await;

    let err = auth::create_user(
        gateway.as_ref(),
        &CreateUser {
            username: "maria".into(),
            id_type: IdType::Registration,
            role: UserRole::User,
            password: None,
            permissions: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_user() {
    let gateway = test_gateway();
    let user = seed_first_access_user(gateway.as_ref(), "maria").await;

    auth::delete_user(gateway.as_ref(), &user.id).await.unwrap();
    assert!(gateway.list_users().await.unwrap().is_empty());
    assert!(matches!(
        auth::delete_user(gateway.as_ref(), &user.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_save_user_last_write_wins() {
    let gateway = test_gateway();
    let mut user = seed_first_access_user(gateway.as_ref(), "maria").await;

    user.username = "maria.silva".into();
    gateway.save_user(&user).await.unwrap();

    let users = gateway.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "maria.silva");
    login(gateway.as_ref(), "maria.silva", "abcd").await.unwrap();
}

/// Gateway whose back end is unreachable.
struct OfflineGateway;

fn offline<T>() -> StoreResult<T> {
    Err(StoreError::Connection("network unreachable".into()))
}

#[async_trait]
impl StorageGateway for OfflineGateway {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        offline()
    }
    async fn get_user(&self, _user_id: &str) -> StoreResult<Option<User>> {
        offline()
    }
    async fn save_user(&self, _user: &User) -> StoreResult<()> {
        offline()
    }
    async fn create_user_if_absent(&self, _user: &User) -> StoreResult<bool> {
        offline()
    }
    async fn set_initial_password(&self, _user_id: &str, _hash: &str) -> StoreResult<bool> {
        offline()
    }
    async fn delete_user(&self, _user_id: &str) -> StoreResult<bool> {
        offline()
    }
    async fn get_license_state(&self) -> StoreResult<LicenseState> {
        offline()
    }
    async fn save_license_state(&self, _state: &LicenseState) -> StoreResult<()> {
        offline()
    }
    async fn get_settings(&self) -> StoreResult<AppSettings> {
        offline()
    }
    async fn save_settings(&self, _settings: &AppSettings) -> StoreResult<()> {
        offline()
    }
}

#[tokio::test]
async fn test_unreachable_store_surfaces_connection_error() {
    let err = login(&OfflineGateway, "maria", "abcd").await.unwrap_err();
    assert!(matches!(err, AppError::Connection(_)));
    assert!(!err.to_string().contains("network unreachable"));
}

#[tokio::test]
async fn test_bootstrap_survives_unreachable_store() {
    let admins = builtin_admins(None, None);
    assert_eq!(bootstrap_admins(&OfflineGateway, &admins).await, 0);
}

#[tokio::test]
async fn test_login_endpoint_status_codes() {
    let gateway = test_gateway();
    seed_first_access_user(gateway.as_ref(), "maria").await;
    let cancel = CancellationToken::new();
    let (_state, app) = start_app(gateway, &cancel).await;

    let response = send_json(&app, "POST", "/auth/login", json!({ "username": "maria", "password": "abc" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(&app, "POST", "/auth/login", json!({ "username": "maria", "password": "abcd" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await;
    assert_eq!(user["username"], "maria");
    assert_eq!(user["is_first_access"], false);
    assert!(user.get("password_hash").is_none());

    let response = send_json(&app, "POST", "/auth/login", json!({ "username": "maria", "password": "nope" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Incorrect password.");

    let response = send_json(&app, "POST", "/auth/login", json!({ "username": "joao", "password": "abcd" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cancel.cancel();
}

/// Real store where every first-access claim is beaten by a concurrent
/// login that picked `winner_password`. Counts create-if-absent writes.
struct RacingGateway {
    inner: Arc<SqliteGateway>,
    winner_password: &'static str,
    creates: AtomicUsize,
}

impl RacingGateway {
    fn new(winner_password: &'static str) -> Self {
        Self {
            inner: test_gateway(),
            winner_password,
            creates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StorageGateway for RacingGateway {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.inner.list_users().await
    }
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.inner.get_user(user_id).await
    }
    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.inner.save_user(user).await
    }
    async fn create_user_if_absent(&self, user: &User) -> StoreResult<bool> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_user_if_absent(user).await
    }
    async fn set_initial_password(&self, user_id: &str, _hash: &str) -> StoreResult<bool> {
        let winner = hash_password(self.winner_password).unwrap();
        assert!(self.inner.set_initial_password(user_id, &winner).await?);
        Ok(false)
    }
    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        self.inner.delete_user(user_id).await
    }
    async fn get_license_state(&self) -> StoreResult<LicenseState> {
        self.inner.get_license_state().await
    }
    async fn save_license_state(&self, state: &LicenseState) -> StoreResult<()> {
        self.inner.save_license_state(state).await
    }
    async fn get_settings(&self) -> StoreResult<AppSettings> {
        self.inner.get_settings().await
    }
    async fn save_settings(&self, settings: &AppSettings) -> StoreResult<()> {
        self.inner.save_settings(settings).await
    }
}

#[tokio::test]
async fn test_first_access_race_loser_with_same_password_logs_in() {
    let gateway = RacingGateway::new("abcd");
    let user = seed_first_access_user(&gateway, "maria").await;

    let logged_in = login(&gateway, "maria", "abcd").await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(!logged_in.is_first_access);
}

#[tokio::test]
async fn test_first_access_race_loser_with_other_password_rejected() {
    let gateway = RacingGateway::new("abcd");
    let user = seed_first_access_user(&gateway, "maria").await;

    let err = login(&gateway, "maria", "wxyz").await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    // The winner's password stays in place
    let stored = gateway.get_user(&user.id).await.unwrap().unwrap();
    assert!(!stored.is_first_access);
    login(&gateway, "maria", "abcd").await.unwrap();
}

#[tokio::test]
async fn test_bootstrap_skips_existing_admins_without_writing() {
    let gateway = RacingGateway::new("abcd");
    let admins = builtin_admins(Some("admin-pass".into()), None);

    assert_eq!(bootstrap_admins(&gateway, &admins).await, 2);
    assert_eq!(gateway.creates.load(Ordering::SeqCst), 2);

    assert_eq!(bootstrap_admins(&gateway, &admins).await, 0);
    assert_eq!(gateway.creates.load(Ordering::SeqCst), 2);
}
