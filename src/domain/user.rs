/// User records
///
/// `User` is the persisted shape owned by the store; `UserResponse` is the
/// API-facing projection, which also carries the permission list resolved
/// from the user's role. The `detail` blob is schemaless and only crosses
/// the boundary untouched; the auth core never inspects it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::domain::permission::PermissionSet;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Role name, resolved against the permission store
    pub role: String,
    /// Opaque profile payload
    pub detail: Option<serde_json::Value>,
}

impl User {
    /// Create a user with a freshly hashed password.
    pub fn new(name: String, email: String, password: &str, role: String) -> Result<Self, AppError> {
        let password_hash = hash_password(password)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            detail: None,
        })
    }
}

/// API projection of a user, with the role's permissions attached
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl UserResponse {
    pub fn from_user(user: &User, permission_set: Option<&PermissionSet>) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            permissions: permission_set
                .map(|p| p.permissions.clone())
                .unwrap_or_default(),
        }
    }
}
