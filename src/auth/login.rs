use crate::error::{AppError, Result};
use crate::models::{MIN_PASSWORD_LEN, User};
use crate::store::StorageGateway;

use super::password::{hash_password, verify_password};

/// Log a user in, letting a first-access user pick their password.
///
/// Returns the user as stored after the login.
pub async fn login(gateway: &dyn StorageGateway, username: &str, password: &str) -> Result<User> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation("Fill in all fields.".into()));
    }

    let users = gateway.list_users().await?;
    let mut user = users
        .into_iter()
        .find(|u| u.username == username)
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    if user.is_first_access {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Use at least {} characters to create your password.",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = hash_password(password)?;
        if gateway.set_initial_password(&user.id, &hash).await? {
            tracing::info!("User {} set their password on first access", user.id);
            user.password_hash = Some(hash);
            user.is_first_access = false;
            return Ok(user);
        }

        // Lost the race to a concurrent first login; check against theirs.
        tracing::warn!("First access for user {} was already claimed", user.id);
        user = gateway
            .get_user(&user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;
    }

    let matches = match user.password_hash.as_deref() {
        Some(hash) => verify_password(password, hash)?,
        None => false,
    };
    if !matches {
        return Err(AppError::Auth("Incorrect password.".into()));
    }

    Ok(user)
}
