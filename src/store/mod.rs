/// Persistence collaborators
///
/// The auth core talks to these traits only; the concrete document/row
/// mechanics live behind them. `postgres` is the production backend,
/// `memory` backs tests and local runs.

mod memory;
mod postgres;

pub use memory::MemoryPermissionStore;
pub use memory::MemoryResetStore;
pub use memory::MemoryUserStore;
pub use postgres::PgPermissionStore;
pub use postgres::PgResetStore;
pub use postgres::PgUserStore;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PermissionSet, ResetCredential, User};
use crate::error::AppError;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Load the permission set for a role. `None` when the role has no
    /// record; callers treat that as an empty set.
    async fn find_by_role(&self, role: &str) -> Result<Option<PermissionSet>, AppError>;
}

#[async_trait]
pub trait ResetStore: Send + Sync {
    async fn insert(&self, credential: &ResetCredential) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResetCredential>, AppError>;

    /// Atomically flip `used` from false to true.
    ///
    /// The update must match on `used = false`; if the credential was already
    /// consumed the call fails with `AlreadyConsumed`, which is what makes
    /// concurrent consumption exactly-once. `NotFound` if the id is absent.
    async fn mark_used(&self, id: Uuid) -> Result<(), AppError>;
}

/// The store handles a running application hands around.
#[derive(Clone)]
pub struct AppStores {
    pub users: Arc<dyn UserStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub resets: Arc<dyn ResetStore>,
}

impl AppStores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            permissions: Arc::new(PgPermissionStore::new(pool.clone())),
            resets: Arc::new(PgResetStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            permissions: Arc::new(MemoryPermissionStore::new()),
            resets: Arc::new(MemoryResetStore::new()),
        }
    }
}
