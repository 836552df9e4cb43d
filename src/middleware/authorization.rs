/// Authorization Middleware
///
/// Runs the per-request permission check on every protected route:
///
/// 1. extract the bearer token from the Authorization header
/// 2. verify it
/// 3. extract the `user_id` claim
/// 4. resolve the principal's role via the user store
/// 5. look up the route in the permission registry (fail-closed)
/// 6. check the role's permission set
///
/// Steps 1-4 reject with 401, steps 5-6 with 403; on admit the principal id
/// is injected into request extensions for downstream handlers. One role
/// lookup and one permission-set lookup per request, both read-only.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::auth::{PermissionRegistry, TokenService};
use crate::error::AppError;
use crate::store::{PermissionStore, UserStore};

/// Principal id attached to admitted requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Uuid);

/// Everything the check needs, shared across workers
pub struct AuthState {
    pub token_service: Arc<TokenService>,
    pub registry: PermissionRegistry,
    pub users: Arc<dyn UserStore>,
    pub permissions: Arc<dyn PermissionStore>,
}

pub struct AuthorizationMiddleware {
    state: Arc<AuthState>,
}

impl AuthorizationMiddleware {
    pub fn new(state: Arc<AuthState>) -> Self {
        Self { state }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthorizationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthorizationMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthorizationMiddlewareService {
            service: Rc::new(service),
            state: self.state.clone(),
        }))
    }
}

pub struct AuthorizationMiddlewareService<S> {
    service: Rc<S>,
    state: Arc<AuthState>,
}

impl<S, B> Service<ServiceRequest> for AuthorizationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let state = self.state.clone();
        let service = self.service.clone();

        Box::pin(async move {
            match check_request(&state, &req).await {
                Ok(user_id) => {
                    req.extensions_mut().insert(AuthenticatedUser(user_id));
                    service.call(req).await
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn check_request(state: &AuthState, req: &ServiceRequest) -> Result<Uuid, AppError> {
    let token = bearer_token(req).ok_or(AppError::Unauthorized)?;

    let claims = state.token_service.verify(&token)?;

    let user_id = claims
        .get("user_id")
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or(AppError::Unauthorized)?;

    // Principal must still exist; a deleted user's token is dead.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Fail-closed: a route the registry does not know is denied outright.
    let pattern = req.match_pattern().ok_or(AppError::Forbidden)?;
    let required = state
        .registry
        .required(req.method(), &pattern)
        .ok_or(AppError::Forbidden)?
        .to_string();

    // A role with no record carries an empty permission set, which satisfies
    // only unrestricted ("") routes.
    let permitted = match state.permissions.find_by_role(&user.role).await? {
        Some(set) => set.has_permission(&required),
        None => required.is_empty(),
    };

    if !permitted {
        tracing::warn!(user_id = %user_id, role = %user.role, "permission denied");
        return Err(AppError::Forbidden);
    }

    tracing::debug!(user_id = %user_id, pattern = %pattern, "request admitted");
    Ok(user_id)
}
