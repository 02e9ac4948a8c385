pub mod application;
pub mod identity;
pub mod klink;
pub mod permission;
pub mod registrant;
pub mod verification_token;

pub use application::Application;
pub use identity::Identity;
pub use klink::Klink;
pub use permission::Permission;
pub use registrant::{Registrant, Role};
pub use verification_token::{TokenPurpose, VerificationToken, VERIFICATION_TOKEN_LIFETIME_HOURS};
