//! Storage contract for registry state.
//!
//! Lookups return `Ok(None)` for absent rows. Replacing or deleting an absent
//! row returns [`StoreError::NotFound`].

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Application, Klink, Permission, Registrant, VerificationToken};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Record still referenced: {0}")]
    Referenced(String),

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Distinguishes an absent record from a transient failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

#[async_trait]
pub trait RegistrantStore: Send + Sync {
    /// Insert a registrant; the returned record carries the assigned id.
    async fn create_registrant(&self, registrant: Registrant) -> Result<Registrant, StoreError>;
    async fn list_registrants(&self) -> Result<Vec<Registrant>, StoreError>;
    async fn get_registrant_by_id(&self, id: i64) -> Result<Option<Registrant>, StoreError>;
    async fn get_registrant_by_email(&self, email: &str)
        -> Result<Option<Registrant>, StoreError>;
    async fn replace_registrant(&self, registrant: &Registrant) -> Result<(), StoreError>;
    async fn delete_registrant(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create_application(&self, application: Application)
        -> Result<Application, StoreError>;
    async fn list_applications(&self) -> Result<Vec<Application>, StoreError>;
    async fn get_application_by_id(&self, id: i64) -> Result<Option<Application>, StoreError>;
    async fn get_application_by_domain(
        &self,
        url: &str,
    ) -> Result<Option<Application>, StoreError>;
    async fn replace_application(&self, application: &Application) -> Result<(), StoreError>;
    async fn delete_application(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait KlinkStore: Send + Sync {
    async fn create_klink(&self, klink: Klink) -> Result<Klink, StoreError>;
    async fn list_klinks(&self) -> Result<Vec<Klink>, StoreError>;
    async fn get_klink_by_id(&self, id: i64) -> Result<Option<Klink>, StoreError>;
    async fn get_klink_by_identifier(&self, identifier: &str)
        -> Result<Option<Klink>, StoreError>;
    async fn replace_klink(&self, klink: &Klink) -> Result<(), StoreError>;
    async fn delete_klink(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;
    async fn create_permission(&self, permission: &Permission) -> Result<(), StoreError>;
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn create_verification(&self, token: &VerificationToken) -> Result<(), StoreError>;
    async fn get_verification_by_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, StoreError>;
    async fn delete_verification(&self, token: &str) -> Result<(), StoreError>;
    /// Remove the token and return it in one step. Of two concurrent takes of
    /// the same token exactly one succeeds; the other gets `NotFound`.
    async fn take_verification(&self, token: &str) -> Result<VerificationToken, StoreError>;
}

/// Everything the registry persists.
#[async_trait]
pub trait Storer:
    RegistrantStore + ApplicationStore + KlinkStore + PermissionStore + VerificationStore
{
    async fn health_check(&self) -> Result<(), StoreError>;
}
