//! In-process store used by tests and by `DATABASE_URL=memory`.
//!
//! Mirrors the constraints of the SQL schema: unique emails, application
//! domains, K-Link identifiers and permission names; deleting a registrant
//! removes their applications and tokens but is refused while they manage a
//! K-Link.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::store::{
    ApplicationStore, KlinkStore, PermissionStore, RegistrantStore, StoreError, Storer,
    VerificationStore,
};
use crate::models::{Application, Klink, Permission, Registrant, VerificationToken};

#[derive(Default)]
struct Tables {
    registrants: BTreeMap<i64, Registrant>,
    applications: BTreeMap<i64, Application>,
    klinks: BTreeMap<i64, Klink>,
    permissions: BTreeSet<String>,
    verifications: HashMap<String, VerificationToken>,
    next_registrant_id: i64,
    next_application_id: i64,
    next_klink_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrantStore for InMemoryStore {
    async fn create_registrant(&self, mut registrant: Registrant) -> Result<Registrant, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.registrants.values().any(|r| r.email == registrant.email) {
            return Err(StoreError::Duplicate(format!("email {}", registrant.email)));
        }
        registrant.id = next_id(&mut tables.next_registrant_id);
        tables.registrants.insert(registrant.id, registrant.clone());
        Ok(registrant)
    }

    async fn list_registrants(&self) -> Result<Vec<Registrant>, StoreError> {
        Ok(self.tables.read().await.registrants.values().cloned().collect())
    }

    async fn get_registrant_by_id(&self, id: i64) -> Result<Option<Registrant>, StoreError> {
        Ok(self.tables.read().await.registrants.get(&id).cloned())
    }

    async fn get_registrant_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Registrant>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .registrants
            .values()
            .find(|r| r.email == email)
            .cloned())
    }

    async fn replace_registrant(&self, registrant: &Registrant) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.registrants.contains_key(&registrant.id) {
            return Err(StoreError::NotFound);
        }
        if tables
            .registrants
            .values()
            .any(|r| r.id != registrant.id && r.email == registrant.email)
        {
            return Err(StoreError::Duplicate(format!("email {}", registrant.email)));
        }
        tables.registrants.insert(registrant.id, registrant.clone());
        Ok(())
    }

    async fn delete_registrant(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.registrants.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if tables.klinks.values().any(|k| k.manager_id == id) {
            return Err(StoreError::Referenced(format!("registrant {} manages a K-Link", id)));
        }
        tables.registrants.remove(&id);
        tables.applications.retain(|_, app| app.owner_id != id);
        tables.verifications.retain(|_, v| v.registrant_id != id);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn create_application(
        &self,
        mut application: Application,
    ) -> Result<Application, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.registrants.contains_key(&application.owner_id) {
            return Err(StoreError::Referenced(format!(
                "owner {} does not exist",
                application.owner_id
            )));
        }
        if tables.applications.values().any(|a| a.url == application.url) {
            return Err(StoreError::Duplicate(format!("application {}", application.url)));
        }
        application.id = next_id(&mut tables.next_application_id);
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        Ok(self.tables.read().await.applications.values().cloned().collect())
    }

    async fn get_application_by_id(&self, id: i64) -> Result<Option<Application>, StoreError> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn get_application_by_domain(
        &self,
        url: &str,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .values()
            .find(|a| a.url == url)
            .cloned())
    }

    async fn replace_application(&self, application: &Application) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.applications.contains_key(&application.id) {
            return Err(StoreError::NotFound);
        }
        if !tables.registrants.contains_key(&application.owner_id) {
            return Err(StoreError::Referenced(format!(
                "owner {} does not exist",
                application.owner_id
            )));
        }
        if tables
            .applications
            .values()
            .any(|a| a.id != application.id && a.url == application.url)
        {
            return Err(StoreError::Duplicate(format!("application {}", application.url)));
        }
        tables.applications.insert(application.id, application.clone());
        Ok(())
    }

    async fn delete_application(&self, id: i64) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .applications
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl KlinkStore for InMemoryStore {
    async fn create_klink(&self, mut klink: Klink) -> Result<Klink, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.registrants.contains_key(&klink.manager_id) {
            return Err(StoreError::Referenced(format!(
                "manager {} does not exist",
                klink.manager_id
            )));
        }
        if tables.klinks.values().any(|k| k.identifier == klink.identifier) {
            return Err(StoreError::Duplicate(format!("klink {}", klink.identifier)));
        }
        klink.id = next_id(&mut tables.next_klink_id);
        tables.klinks.insert(klink.id, klink.clone());
        Ok(klink)
    }

    async fn list_klinks(&self) -> Result<Vec<Klink>, StoreError> {
        Ok(self.tables.read().await.klinks.values().cloned().collect())
    }

    async fn get_klink_by_id(&self, id: i64) -> Result<Option<Klink>, StoreError> {
        Ok(self.tables.read().await.klinks.get(&id).cloned())
    }

    async fn get_klink_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Klink>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .klinks
            .values()
            .find(|k| k.identifier == identifier)
            .cloned())
    }

    async fn replace_klink(&self, klink: &Klink) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.klinks.contains_key(&klink.id) {
            return Err(StoreError::NotFound);
        }
        if !tables.registrants.contains_key(&klink.manager_id) {
            return Err(StoreError::Referenced(format!(
                "manager {} does not exist",
                klink.manager_id
            )));
        }
        if tables
            .klinks
            .values()
            .any(|k| k.id != klink.id && k.identifier == klink.identifier)
        {
            return Err(StoreError::Duplicate(format!("klink {}", klink.identifier)));
        }
        tables.klinks.insert(klink.id, klink.clone());
        Ok(())
    }

    async fn delete_klink(&self, id: i64) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .klinks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .permissions
            .iter()
            .map(|name| Permission { name: name.clone() })
            .collect())
    }

    async fn create_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        if self
            .tables
            .write()
            .await
            .permissions
            .insert(permission.name.clone())
        {
            Ok(())
        } else {
            Err(StoreError::Duplicate(format!("permission {}", permission.name)))
        }
    }
}

#[async_trait]
impl VerificationStore for InMemoryStore {
    async fn create_verification(&self, token: &VerificationToken) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.verifications.contains_key(&token.token) {
            return Err(StoreError::Duplicate("verification token".to_string()));
        }
        tables.verifications.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_verification_by_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, StoreError> {
        Ok(self.tables.read().await.verifications.get(token).cloned())
    }

    async fn delete_verification(&self, token: &str) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .verifications
            .remove(token)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn take_verification(&self, token: &str) -> Result<VerificationToken, StoreError> {
        self.tables
            .write()
            .await
            .verifications
            .remove(token)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl Storer for InMemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
