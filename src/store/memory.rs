/// In-memory stores
///
/// Map-backed implementations used by the integration tests and for running
/// the service without a database. `mark_used` performs its compare-and-set
/// under the map lock, so it honors the same exactly-once contract as the
/// Postgres backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PermissionSet, ResetCredential, User};
use crate::error::AppError;
use crate::store::{PermissionStore, ResetStore, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> AppError {
    AppError::Internal("store lock poisoned".to_string())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Database("email already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().map_err(|_| lock_poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(AppError::NotFound("user".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.lock().map_err(|_| lock_poisoned())?;
        match users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("user".to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryPermissionStore {
    sets: Mutex<HashMap<String, PermissionSet>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a role's permission set (administration is out of scope for the
    /// service itself, so this only exists on the in-memory backend).
    pub fn put(&self, set: PermissionSet) {
        self.sets
            .lock()
            .expect("permission store lock poisoned")
            .insert(set.name.clone(), set);
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn find_by_role(&self, role: &str) -> Result<Option<PermissionSet>, AppError> {
        let sets = self.sets.lock().map_err(|_| lock_poisoned())?;
        Ok(sets.get(role).cloned())
    }
}

#[derive(Default)]
pub struct MemoryResetStore {
    credentials: Mutex<HashMap<Uuid, ResetCredential>>,
}

impl MemoryResetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResetStore for MemoryResetStore {
    async fn insert(&self, credential: &ResetCredential) -> Result<(), AppError> {
        let mut credentials = self.credentials.lock().map_err(|_| lock_poisoned())?;
        credentials.insert(credential.id, credential.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResetCredential>, AppError> {
        let credentials = self.credentials.lock().map_err(|_| lock_poisoned())?;
        Ok(credentials.get(&id).cloned())
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError> {
        // Compare-and-set under the lock: exactly one caller wins.
        let mut credentials = self.credentials.lock().map_err(|_| lock_poisoned())?;
        match credentials.get_mut(&id) {
            None => Err(AppError::NotFound("reset credential".to_string())),
            Some(credential) if credential.used => Err(AppError::AlreadyConsumed),
            Some(credential) => {
                credential.used = true;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_user_round_trip() {
        let store = MemoryUserStore::new();
        let user = User::new(
            "Ursula".to_string(),
            "ursula@example.com".to_string(),
            "left hand of darkness",
            "viewer".to_string(),
        )
        .unwrap();

        store.insert(&user).await.unwrap();
        let found = store.find_by_email("ursula@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        store.delete(user.id).await.unwrap();
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryUserStore::new();
        let a = User::new(
            "A".to_string(),
            "same@example.com".to_string(),
            "password-one",
            "viewer".to_string(),
        )
        .unwrap();
        let b = User::new(
            "B".to_string(),
            "same@example.com".to_string(),
            "password-two",
            "viewer".to_string(),
        )
        .unwrap();

        store.insert(&a).await.unwrap();
        assert!(store.insert(&b).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_used_is_exactly_once() {
        let store = MemoryResetStore::new();
        let credential = ResetCredential::new("user@example.com".to_string());
        store.insert(&credential).await.unwrap();

        assert!(store.mark_used(credential.id).await.is_ok());
        match store.mark_used(credential.id).await {
            Err(AppError::AlreadyConsumed) => (),
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mark_used_concurrent_single_winner() {
        let store = Arc::new(MemoryResetStore::new());
        let credential = ResetCredential::new("user@example.com".to_string());
        store.insert(&credential).await.unwrap();

        let a = tokio::spawn({
            let store = store.clone();
            let id = credential.id;
            async move { store.mark_used(id).await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            let id = credential.id;
            async move { store.mark_used(id).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one concurrent consumer may win");
    }

    #[tokio::test]
    async fn test_unknown_role_yields_no_permission_set() {
        let store = MemoryPermissionStore::new();
        store.put(PermissionSet::new("admin", vec!["delete-user".to_string()]));
        assert!(store.find_by_role("ghost").await.unwrap().is_none());
        assert!(store.find_by_role("admin").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mark_used_missing_credential() {
        let store = MemoryResetStore::new();
        match store.mark_used(Uuid::new_v4()).await {
            Err(AppError::NotFound(_)) => (),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
