mod health_check;
mod users;

pub use health_check::health_check;
pub use users::change_password;
pub use users::delete_user;
pub use users::get_current_user;
pub use users::login;
pub use users::register;
pub use users::request_password_reset;
pub use users::reset_password;
