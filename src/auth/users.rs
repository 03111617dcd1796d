use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AdminPermissions, CreateUser, User, UserRole};
use crate::store::StorageGateway;

use super::password::hash_password;

/// Create a user account. Admins get their password hashed now; users
/// start in first access.
pub async fn create_user(gateway: &dyn StorageGateway, input: &CreateUser) -> Result<User> {
    input.validate()?;

    let users = gateway.list_users().await?;
    if users.iter().any(|u| u.username == input.username) {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let (password_hash, permissions) = match input.role {
        UserRole::Admin => {
            let password = input.password.as_deref().unwrap_or_default();
            (
                Some(hash_password(password)?),
                Some(input.permissions.unwrap_or(AdminPermissions::FULL)),
            )
        }
        UserRole::User => (None, None),
    };

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: input.username.clone(),
        id_type: input.id_type,
        is_first_access: password_hash.is_none(),
        password_hash,
        role: input.role,
        permissions,
        created_at: Utc::now().timestamp(),
    };

    if !gateway.create_user_if_absent(&user).await? {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    tracing::info!("Created {} account '{}'", user.role.as_ref(), user.username);
    Ok(user)
}

/// Remove a user account.
pub async fn delete_user(gateway: &dyn StorageGateway, user_id: &str) -> Result<()> {
    if !gateway.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    tracing::info!("Deleted user {}", user_id);
    Ok(())
}
