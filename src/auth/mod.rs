/// Authentication module
///
/// Token issuance/verification, password hashing, and the route permission
/// table consumed by the authorization middleware.

mod claims;
mod password;
mod permissions;
mod token;

pub use claims::Claims;
pub use password::hash_password;
pub use password::verify_password;
pub use permissions::PermissionRegistry;
pub use token::TokenError;
pub use token::TokenService;
