use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};

use crate::auth::{PermissionRegistry, TokenService};
use crate::configuration::AuthSettings;
use crate::email::ResetNotifier;
use crate::middleware::{AuthState, AuthorizationMiddleware, ResetTokenMiddleware};
use crate::reset::ResetWorkflow;
use crate::routes::{
    change_password, delete_user, get_current_user, health_check, login, register,
    request_password_reset, reset_password,
};
use crate::store::AppStores;

/// Build and start the server.
///
/// The signing secret is resolved exactly once here and injected into the
/// token service; everything downstream shares that one instance. Three
/// route groups: public, reset-token guarded, and permission guarded.
pub fn run(
    listener: TcpListener,
    stores: AppStores,
    notifier: Arc<dyn ResetNotifier>,
    registry: PermissionRegistry,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let token_service = Arc::new(TokenService::new(&auth_settings.resolve_secret()));

    let workflow = ResetWorkflow::new(
        token_service.clone(),
        stores.resets.clone(),
        stores.users.clone(),
        notifier,
    );

    let auth_state = Arc::new(AuthState {
        token_service: token_service.clone(),
        registry,
        users: stores.users.clone(),
        permissions: stores.permissions.clone(),
    });

    let stores_data = web::Data::new(stores);
    let token_service_data = web::Data::new(token_service.as_ref().clone());
    let workflow_data = web::Data::new(workflow);
    let auth_settings_data = web::Data::new(auth_settings);

    let server = HttpServer::new(move || {
        App::new()
            // Shared state
            .app_data(stores_data.clone())
            .app_data(token_service_data.clone())
            .app_data(workflow_data.clone())
            .app_data(auth_settings_data.clone())
            // Public routes (no authentication)
            .route("/health", web::get().to(health_check))
            .route("/users/login", web::post().to(login))
            .route(
                "/users/request-password-reset",
                web::post().to(request_password_reset),
            )
            // Reset-token guarded route (not permission authenticated)
            .service(
                web::resource("/users/reset-password")
                    .wrap(ResetTokenMiddleware::new(token_service.clone()))
                    .route(web::post().to(reset_password)),
            )
            // Permission guarded routes; /users/me before /users/{id} so the
            // literal segment wins
            .service(
                web::resource("/users/me")
                    .wrap(AuthorizationMiddleware::new(auth_state.clone()))
                    .route(web::get().to(get_current_user)),
            )
            .service(
                web::resource("/users/change-password")
                    .wrap(AuthorizationMiddleware::new(auth_state.clone()))
                    .route(web::post().to(change_password)),
            )
            .service(
                web::resource("/users")
                    .wrap(AuthorizationMiddleware::new(auth_state.clone()))
                    .route(web::post().to(register)),
            )
            .service(
                web::resource("/users/{id}")
                    .wrap(AuthorizationMiddleware::new(auth_state.clone()))
                    .route(web::delete().to(delete_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
