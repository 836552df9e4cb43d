/// Reset-token workflow
///
/// Drives a persisted reset credential through its lifecycle:
///
/// * `begin` persists a fresh credential and wraps its id in a bearer token
///   delivered out-of-band,
/// * `authorize` turns a presented bearer token back into a usable
///   credential,
/// * `consume` claims the credential exactly-once and installs the new
///   password.

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{hash_password, TokenService};
use crate::domain::{ResetCredential, User};
use crate::email::ResetNotifier;
use crate::error::AppError;
use crate::store::{ResetStore, UserStore};

pub const CLAIM_TOKEN_ID: &str = "token_id";
pub const CLAIM_USERNAME: &str = "username";

#[derive(Clone)]
pub struct ResetWorkflow {
    token_service: Arc<TokenService>,
    resets: Arc<dyn ResetStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn ResetNotifier>,
}

impl ResetWorkflow {
    pub fn new(
        token_service: Arc<TokenService>,
        resets: Arc<dyn ResetStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            token_service,
            resets,
            users,
            notifier,
        }
    }

    /// Create and persist a reset credential for `user`, then issue a bearer
    /// token carrying its id, with a ttl matching the credential's validity.
    ///
    /// Delivery is fire-and-forget: a notifier failure is logged and the
    /// token is still returned, since the persisted credential stays valid
    /// regardless. A persistence failure does surface to the caller.
    pub async fn begin(&self, user: &User) -> Result<String, AppError> {
        let credential = ResetCredential::new(user.email.clone());
        self.resets.insert(&credential).await?;

        let mut claims = HashMap::new();
        claims.insert(CLAIM_TOKEN_ID.to_string(), credential.id.to_string());
        claims.insert(CLAIM_USERNAME.to_string(), credential.username.clone());
        let token = self
            .token_service
            .issue(claims, credential.remaining_ttl_seconds())?;

        if let Err(e) = self.notifier.send_reset(&credential.username, &token).await {
            tracing::error!(
                username = %credential.username,
                error = %e,
                "reset notification failed; credential remains valid"
            );
        } else {
            tracing::info!(username = %credential.username, "reset notification sent");
        }

        Ok(token)
    }

    /// Verify a presented bearer token and load the credential it names.
    pub async fn authorize(&self, bearer_token: &str) -> Result<ResetCredential, AppError> {
        let claims = self.token_service.verify(bearer_token)?;
        let token_id = claims.get(CLAIM_TOKEN_ID).ok_or(AppError::Unauthorized)?;
        let id = uuid::Uuid::parse_str(token_id).map_err(|_| AppError::Unauthorized)?;

        self.authorize_id(id).await
    }

    /// Load and classify a credential by id (the claim the reset middleware
    /// already verified).
    pub async fn authorize_id(&self, id: uuid::Uuid) -> Result<ResetCredential, AppError> {
        let credential = self
            .resets
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("reset credential".to_string()))?;

        credential.validate()?;
        Ok(credential)
    }

    /// Consume a credential and install the new password for its user.
    ///
    /// The store's compare-and-set claims the credential first, so of two
    /// concurrent consumers exactly one proceeds; the loser sees
    /// `AlreadyConsumed`. Once claimed the credential is spent even if the
    /// password update then fails.
    pub async fn consume(
        &self,
        credential: &ResetCredential,
        new_password: &str,
    ) -> Result<(), AppError> {
        credential.validate()?;

        let user = self
            .users
            .find_by_email(&credential.username)
            .await?
            .ok_or_else(|| AppError::NotFound("user".to_string()))?;

        let password_hash = hash_password(new_password)?;

        self.resets.mark_used(credential.id).await?;

        self.users
            .update_password(user.id, &password_hash)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "password update failed after credential was claimed"
                );
                AppError::Internal("password update failed".to_string())
            })?;

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::email::RecordingNotifier;
    use crate::store::{MemoryResetStore, MemoryUserStore, UserStore};

    fn fixture() -> (ResetWorkflow, Arc<MemoryUserStore>, Arc<RecordingNotifier>) {
        let token_service = Arc::new(TokenService::new("workflow-test-secret"));
        let resets = Arc::new(MemoryResetStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let workflow = ResetWorkflow::new(token_service, resets, users.clone(), notifier.clone());
        (workflow, users, notifier)
    }

    async fn seeded_user(users: &Arc<MemoryUserStore>) -> User {
        let user = User::new(
            "Ursula".to_string(),
            "ursula@example.com".to_string(),
            "old password 1",
            "viewer".to_string(),
        )
        .unwrap();
        users.insert(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_begin_then_authorize_returns_unused_credential() {
        let (workflow, users, notifier) = fixture();
        let user = seeded_user(&users).await;

        let token = workflow.begin(&user).await.unwrap();
        let credential = workflow.authorize(&token).await.unwrap();

        assert!(!credential.used);
        assert_eq!(credential.username, user.email);
        // the delivered token is the one that authorizes
        assert_eq!(notifier.deliveries(), vec![(user.email, token)]);
    }

    #[tokio::test]
    async fn test_consume_changes_password_and_burns_credential() {
        let (workflow, users, _) = fixture();
        let user = seeded_user(&users).await;

        let token = workflow.begin(&user).await.unwrap();
        let credential = workflow.authorize(&token).await.unwrap();
        workflow.consume(&credential, "brand new password").await.unwrap();

        let updated = users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("brand new password", &updated.password_hash).unwrap());
        assert!(!verify_password("old password 1", &updated.password_hash).unwrap());

        match workflow.authorize(&token).await {
            Err(AppError::AlreadyConsumed) => (),
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_double_consume_single_winner() {
        let (workflow, users, _) = fixture();
        let user = seeded_user(&users).await;

        let token = workflow.begin(&user).await.unwrap();
        let credential = workflow.authorize(&token).await.unwrap();

        let first = workflow.consume(&credential, "first new password").await;
        let second = workflow.consume(&credential, "second new password").await;

        assert!(first.is_ok());
        match second {
            Err(AppError::AlreadyConsumed) => (),
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let (workflow, users, _) = fixture();
        let user = seeded_user(&users).await;

        let token = workflow.begin(&user).await.unwrap();
        match workflow.authorize(&format!("{}x", token)).await {
            Err(AppError::Unauthorized) => (),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_credential_id_is_not_found() {
        let (workflow, _, _) = fixture();
        match workflow.authorize_id(uuid::Uuid::new_v4()).await {
            Err(AppError::NotFound(_)) => (),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_begin_survives_notifier_failure() {
        struct FailingNotifier;

        #[async_trait::async_trait]
        impl crate::email::ResetNotifier for FailingNotifier {
            async fn send_reset(&self, _: &str, _: &str) -> Result<(), AppError> {
                Err(AppError::Email("relay down".to_string()))
            }
        }

        let token_service = Arc::new(TokenService::new("workflow-test-secret"));
        let users = Arc::new(MemoryUserStore::new());
        let workflow = ResetWorkflow::new(
            token_service,
            Arc::new(MemoryResetStore::new()),
            users.clone(),
            Arc::new(FailingNotifier),
        );
        let user = seeded_user(&users).await;

        // delivery failure does not roll back the credential
        let token = workflow.begin(&user).await.unwrap();
        assert!(workflow.authorize(&token).await.is_ok());
    }
}
