use chrono::Utc;

use crate::models::{AdminPermissions, IdType, User, UserRole};
use crate::store::StorageGateway;

use super::password::{generate_password, hash_password};

/// A built-in administrator account.
pub struct BuiltinAdmin {
    pub id: &'static str,
    pub username: &'static str,
    /// None generates a random password at creation
    pub password: Option<String>,
}

pub const ADMIN_ID: &str = "admin-001";
pub const SUPER_ADMIN_ID: &str = "super-admin-001";

pub fn builtin_admins(
    admin_password: Option<String>,
    super_admin_password: Option<String>,
) -> [BuiltinAdmin; 2] {
    [
        BuiltinAdmin {
            id: ADMIN_ID,
            username: "admin",
            password: admin_password,
        },
        BuiltinAdmin {
            id: SUPER_ADMIN_ID,
            username: "superadmin",
            password: super_admin_password,
        },
    ]
}

/// Create the built-in admins that don't exist yet.
///
/// Failures are logged and skipped so startup continues in a degraded
/// state. Returns how many accounts were created.
pub async fn bootstrap_admins(gateway: &dyn StorageGateway, admins: &[BuiltinAdmin]) -> usize {
    let mut created = 0;

    for admin in admins {
        // Skip hashing for accounts already there; the insert below still
        // decides when two processes start together.
        match gateway.get_user(admin.id).await {
            Ok(Some(_)) => {
                tracing::debug!("Built-in admin '{}' already exists", admin.username);
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to initialize built-in admin '{}': {}", admin.username, e);
                continue;
            }
        }

        let (password, generated) = match &admin.password {
            Some(p) => (p.clone(), false),
            None => (generate_password(16), true),
        };

        let hash = match hash_password(&password) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!("Failed to prepare built-in admin {}: {}", admin.id, e);
                continue;
            }
        };

        let user = User {
            id: admin.id.to_string(),
            username: admin.username.to_string(),
            id_type: IdType::Registration,
            password_hash: Some(hash),
            is_first_access: false,
            role: UserRole::Admin,
            permissions: Some(AdminPermissions::FULL),
            created_at: Utc::now().timestamp(),
        };

        match gateway.create_user_if_absent(&user).await {
            Ok(true) => {
                created += 1;
                if generated {
                    tracing::warn!(
                        "Created built-in admin '{}' with generated password: {}",
                        admin.username,
                        password
                    );
                } else {
                    tracing::info!("Created built-in admin '{}'", admin.username);
                }
            }
            Ok(false) => tracing::debug!("Built-in admin '{}' already exists", admin.username),
            Err(e) => tracing::error!("Failed to initialize built-in admin '{}': {}", admin.username, e),
        }
    }

    created
}
