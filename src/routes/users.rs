/// User Routes
///
/// Registration, login, current-user lookup, password change/delete, and the
/// password-reset pair. Everything here sits behind the guards wired in
/// startup.rs: the permission middleware injects `AuthenticatedUser`, the
/// reset middleware injects `ResetClaims`.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, TokenService};
use crate::configuration::AuthSettings;
use crate::domain::{User, UserResponse};
use crate::error::AppError;
use crate::middleware::{AuthenticatedUser, ResetClaims};
use crate::reset::ResetWorkflow;
use crate::store::AppStores;
use crate::validators::{is_valid_email, is_valid_name};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /users
///
/// Create a user. Guarded by the permission middleware ("" — any
/// authenticated caller).
pub async fn register(
    form: web::Json<RegisterRequest>,
    stores: web::Data<AppStores>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;

    let mut user = User::new(name, email, &form.password, form.role.clone())?;
    user.detail = form.detail.clone();
    stores.users.insert(&user).await?;

    tracing::info!(user_id = %user.id, "user registered");

    let permission_set = stores.permissions.find_by_role(&user.role).await?;
    Ok(HttpResponse::Created().json(UserResponse::from_user(&user, permission_set.as_ref())))
}

/// POST /users/login
///
/// Unknown email and wrong password produce the same `InvalidCredential`
/// response, so callers cannot enumerate accounts.
pub async fn login(
    form: web::Json<LoginRequest>,
    stores: web::Data<AppStores>,
    token_service: web::Data<TokenService>,
    auth_settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let user = stores
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredential)?;

    if !verify_password(&form.password, &user.password_hash)? {
        return Err(AppError::InvalidCredential);
    }

    let mut claims = std::collections::HashMap::new();
    claims.insert("user_id".to_string(), user.id.to_string());
    let token = token_service.issue(claims, auth_settings.session_ttl_seconds)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: auth_settings.session_ttl_seconds,
    }))
}

/// GET /users/me
pub async fn get_current_user(
    principal: web::ReqData<AuthenticatedUser>,
    stores: web::Data<AppStores>,
) -> Result<HttpResponse, AppError> {
    let user = stores
        .users
        .find_by_id(principal.0)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    let permission_set = stores.permissions.find_by_role(&user.role).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from_user(&user, permission_set.as_ref())))
}

/// POST /users/change-password
///
/// The old password must verify before the new one is installed.
pub async fn change_password(
    principal: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChangePasswordRequest>,
    stores: web::Data<AppStores>,
) -> Result<HttpResponse, AppError> {
    let user = stores
        .users
        .find_by_id(principal.0)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    if !verify_password(&form.old_password, &user.password_hash)? {
        return Err(AppError::InvalidCredential);
    }

    let password_hash = hash_password(&form.new_password)?;
    stores.users.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "password changed");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "password changed".to_string(),
    }))
}

/// DELETE /users/{id}
pub async fn delete_user(
    path: web::Path<Uuid>,
    stores: web::Data<AppStores>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    stores.users.delete(id).await?;

    tracing::info!(user_id = %id, "user deleted");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "user deleted".to_string(),
    }))
}

/// POST /users/request-password-reset
///
/// Always answers with the same accepted message: whether the account exists
/// is not observable from the response.
pub async fn request_password_reset(
    form: web::Json<RequestResetRequest>,
    stores: web::Data<AppStores>,
    workflow: web::Data<ResetWorkflow>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    match stores.users.find_by_email(&email).await? {
        Some(user) => {
            workflow.begin(&user).await?;
        }
        None => {
            tracing::warn!("password reset requested for unknown email");
        }
    }

    Ok(HttpResponse::Accepted().json(MessageResponse {
        message: "if the account exists, a reset email has been sent".to_string(),
    }))
}

/// POST /users/reset-password
///
/// Reset-token authenticated: the guard already verified the bearer token
/// and injected its claims; the credential's state is checked here.
pub async fn reset_password(
    claims: web::ReqData<ResetClaims>,
    form: web::Json<ResetPasswordRequest>,
    workflow: web::Data<ResetWorkflow>,
) -> Result<HttpResponse, AppError> {
    let credential = workflow.authorize_id(claims.token_id).await?;
    workflow.consume(&credential, &form.new_password).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "password reset".to_string(),
    }))
}
