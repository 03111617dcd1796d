use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};

use super::from_row::{USER_COLS, query_all, query_one};
use crate::models::User;

/// Keys used in the local settings table.
pub mod keys {
    pub const LICENSE: &str = "license";
    pub const APP_SETTINGS: &str = "app_settings";
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn permissions_json(user: &User) -> rusqlite::Result<Option<String>> {
    user.permissions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

// ============ Users ============

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    query_all(
        conn,
        &format!("SELECT {} FROM users ORDER BY created_at ASC", USER_COLS),
        [],
    )
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        params![id],
    )
}

/// Insert or fully replace a user record (last write wins).
pub fn upsert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, id_type, password_hash, is_first_access, role, permissions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            username = excluded.username,
            id_type = excluded.id_type,
            password_hash = excluded.password_hash,
            is_first_access = excluded.is_first_access,
            role = excluded.role,
            permissions = excluded.permissions",
        params![
            &user.id,
            &user.username,
            user.id_type.as_ref(),
            &user.password_hash,
            user.is_first_access,
            user.role.as_ref(),
            permissions_json(user)?,
            user.created_at,
        ],
    )?;
    Ok(())
}

/// Insert a user unless a record with the same id or username exists.
/// Returns true if the row was written.
pub fn insert_user_if_absent(conn: &Connection, user: &User) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (id, username, id_type, password_hash, is_first_access, role, permissions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &user.id,
            &user.username,
            user.id_type.as_ref(),
            &user.password_hash,
            user.is_first_access,
            user.role.as_ref(),
            permissions_json(user)?,
            user.created_at,
        ],
    )?;
    Ok(inserted > 0)
}

/// Set the first password of a user still in first access.
/// Returns false if the user no longer is (another login got there first).
pub fn claim_first_access(conn: &Connection, id: &str, password_hash: &str) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE users SET password_hash = ?1, is_first_access = 0
         WHERE id = ?2 AND is_first_access = 1",
        params![password_hash, id],
    )?;
    Ok(updated > 0)
}

pub fn delete_user(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Local settings ============

/// Read a JSON value stored under `key`.
pub fn get_setting<T: DeserializeOwned>(conn: &Connection, key: &str) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;

    raw.map(|json| {
        serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

pub fn put_setting<T: Serialize>(conn: &Connection, key: &str, value: &T) -> rusqlite::Result<()> {
    let json =
        serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, json, now()],
    )?;
    Ok(())
}

/// Store `value` under `key` only if nothing is stored there yet.
/// Returns true if the row was written.
pub fn put_setting_if_absent<T: Serialize>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> rusqlite::Result<bool> {
    let json =
        serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
        params![key, json, now()],
    )?;
    Ok(inserted > 0)
}
