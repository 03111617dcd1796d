use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result};

/// Shortest password accepted when a user sets or is given one.
pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    User,
}

/// Kind of identifier the username holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdType {
    Cpf,
    Registration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPermissions {
    pub create_users: bool,
    pub create_content: bool,
    pub edit_data: bool,
    pub delete_data: bool,
    pub view_users: bool,
    pub manage_admins: bool,
}

impl AdminPermissions {
    pub const FULL: AdminPermissions = AdminPermissions {
        create_users: true,
        create_content: true,
        edit_data: true,
        delete_data: true,
        view_users: true,
        manage_admins: true,
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub id_type: IdType,
    /// Argon2 PHC string; None until the user sets a password
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_first_access: bool,
    pub role: UserRole,
    /// Only present for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<AdminPermissions>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub id_type: IdType,
    pub role: UserRole,
    /// Required for admins; users pick theirs on first access
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub permissions: Option<AdminPermissions>,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("Username is required".into()));
        }
        match self.role {
            UserRole::Admin => {
                let password = self.password.as_deref().unwrap_or_default();
                if password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(AppError::Validation(format!(
                        "Admin accounts need a password of at least {} characters",
                        MIN_PASSWORD_LEN
                    )));
                }
            }
            UserRole::User => {
                if self.password.is_some() {
                    return Err(AppError::Validation(
                        "User accounts set their own password on first access".into(),
                    ));
                }
                if self.permissions.is_some() {
                    return Err(AppError::Validation(
                        "Only admin accounts carry permissions".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
