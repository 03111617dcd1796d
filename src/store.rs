//! Storage gateway: the narrow interface the gating and login code uses to
//! reach user records (document store) and the local license/settings
//! record.

use async_trait::async_trait;
use chrono::Utc;

use crate::db::{DbPool, queries, queries::keys};
use crate::error::StoreError;
use crate::models::{AppSettings, LicenseState, User};
use crate::util::now_millis;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// All user records.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Insert or replace a user record.
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Write `user` only if no record with its id or username exists.
    /// Returns true if it was written.
    async fn create_user_if_absent(&self, user: &User) -> StoreResult<bool>;

    /// Store the first password of a user that is still in first access and
    /// clear the flag. Returns false if the user was no longer in first access.
    async fn set_initial_password(&self, user_id: &str, password_hash: &str) -> StoreResult<bool>;

    /// Returns true if a record was removed.
    async fn delete_user(&self, user_id: &str) -> StoreResult<bool>;

    /// The installation's license record, created as a fresh trial on first read.
    async fn get_license_state(&self) -> StoreResult<LicenseState>;

    async fn save_license_state(&self, state: &LicenseState) -> StoreResult<()>;

    /// Branding/dashboard settings, defaults when never saved.
    async fn get_settings(&self) -> StoreResult<AppSettings>;

    async fn save_settings(&self, settings: &AppSettings) -> StoreResult<()>;
}

/// SQLite-backed gateway: `remote` holds user documents, `local` the
/// key/value settings of this installation.
#[derive(Clone)]
pub struct SqliteGateway {
    remote: DbPool,
    local: DbPool,
}

impl SqliteGateway {
    pub fn new(remote: DbPool, local: DbPool) -> Self {
        Self { remote, local }
    }
}

#[async_trait]
impl StorageGateway for SqliteGateway {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.remote.get()?;
        queries::list_users(&conn).map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let conn = self.remote.get()?;
        queries::get_user_by_id(&conn, user_id).map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.remote.get()?;
        queries::upsert_user(&conn, user)?;
        Ok(())
    }

    async fn create_user_if_absent(&self, user: &User) -> StoreResult<bool> {
        let conn = self.remote.get()?;
        Ok(queries::insert_user_if_absent(&conn, user)?)
    }

    async fn set_initial_password(&self, user_id: &str, password_hash: &str) -> StoreResult<bool> {
        let conn = self.remote.get()?;
        Ok(queries::claim_first_access(&conn, user_id, password_hash)?)
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        let conn = self.remote.get()?;
        Ok(queries::delete_user(&conn, user_id)?)
    }

    async fn get_license_state(&self) -> StoreResult<LicenseState> {
        let conn = self.local.get()?;
        if let Some(state) = queries::get_setting::<LicenseState>(&conn, keys::LICENSE)? {
            return Ok(state);
        }

        // Another process may create it between our read and write; the
        // conditional insert keeps whichever start date landed first.
        let fresh = LicenseState::new_trial(now_millis());
        if queries::put_setting_if_absent(&conn, keys::LICENSE, &fresh)? {
            tracing::info!("Started trial at {}", Utc::now().to_rfc3339());
            return Ok(fresh);
        }
        queries::get_setting::<LicenseState>(&conn, keys::LICENSE)?
            .ok_or_else(|| StoreError::Persistence("license record vanished".into()))
    }

    async fn save_license_state(&self, state: &LicenseState) -> StoreResult<()> {
        let conn = self.local.get()?;
        queries::put_setting(&conn, keys::LICENSE, state)?;
        Ok(())
    }

    async fn get_settings(&self) -> StoreResult<AppSettings> {
        let conn = self.local.get()?;
        Ok(queries::get_setting::<AppSettings>(&conn, keys::APP_SETTINGS)?.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &AppSettings) -> StoreResult<()> {
        let conn = self.local.get()?;
        queries::put_setting(&conn, keys::APP_SETTINGS, settings)?;
        Ok(())
    }
}
