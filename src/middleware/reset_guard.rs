/// Reset-token guard
///
/// Protects the reset-password route. Verifies the presented bearer token
/// and injects the verified reset claims (`token_id`, `username`) into
/// request extensions; the handler finishes authorization against the
/// credential store. Any verification failure is a generic 401.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::auth::TokenService;
use crate::error::AppError;
use crate::middleware::authorization::bearer_token;
use crate::reset::{CLAIM_TOKEN_ID, CLAIM_USERNAME};

/// Verified reset claims attached to the request
#[derive(Debug, Clone)]
pub struct ResetClaims {
    pub token_id: Uuid,
    pub username: String,
}

pub struct ResetTokenMiddleware {
    token_service: Arc<TokenService>,
}

impl ResetTokenMiddleware {
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResetTokenMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ResetTokenMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(ResetTokenMiddlewareService {
            service: Rc::new(service),
            token_service: self.token_service.clone(),
        }))
    }
}

pub struct ResetTokenMiddlewareService<S> {
    service: Rc<S>,
    token_service: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for ResetTokenMiddlewareService<S>
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
        let result = verify_reset_token(&self.token_service, &req);
        let service = self.service.clone();

        Box::pin(async move {
            match result {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}

fn verify_reset_token(
    token_service: &TokenService,
    req: &ServiceRequest,
) -> Result<ResetClaims, AppError> {
    let token = bearer_token(req).ok_or(AppError::Unauthorized)?;
    let claims = token_service.verify(&token)?;

    let token_id = claims
        .get(CLAIM_TOKEN_ID)
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or(AppError::Unauthorized)?;
    let username = claims
        .get(CLAIM_USERNAME)
        .ok_or(AppError::Unauthorized)?
        .to_string();

    Ok(ResetClaims { token_id, username })
}
