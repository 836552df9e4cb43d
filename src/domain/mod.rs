mod permission;
mod reset;
mod user;

pub use permission::PermissionSet;
pub use reset::ResetCredential;
pub use reset::RESET_VALIDITY_DAYS;
pub use user::User;
pub use user::UserResponse;
