use actix_web::Responder;

/// GET /health — liveness probe, deliberately unauthenticated.
pub async fn health_check() -> impl Responder {
    "OK"
}
