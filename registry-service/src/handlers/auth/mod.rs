pub mod password;
pub mod registration;
pub mod session;

pub use password::{change_password, request_password_reset};
pub use registration::{confirm_email_verification, inspect_email_verification, register};
pub use session::{login, refresh};
