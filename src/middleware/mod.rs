/// Request guards: the permission middleware for protected routes and the
/// reset-token middleware for the reset-password route.

pub mod authorization;
mod reset_guard;

pub use authorization::AuthState;
pub use authorization::AuthenticatedUser;
pub use authorization::AuthorizationMiddleware;
pub use reset_guard::ResetClaims;
pub use reset_guard::ResetTokenMiddleware;
