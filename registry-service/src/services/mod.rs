//! Business logic and collaborators of the registry.

pub mod access;
pub mod acl;
mod auth;
pub mod bootstrap;
mod database;
pub mod email;
pub mod error;
mod memory;
pub mod session;
pub mod store;

pub use auth::{AuthService, LOGIN_TOKEN_LIFETIME_MINUTES, REFRESH_TOKEN_LIFETIME_MINUTES};
pub use database::PgStore;
pub use email::{DebugMailer, EmailContent, EmailError, Emailer, SmtpMailer};
pub use error::ServiceError;
pub use memory::InMemoryStore;
pub use session::{SessionService, TokenError};
pub use store::{StoreError, Storer};
