use crate::{
    models::{Registrant, Role},
    services::{error::ServiceError, store::Storer},
    utils::{hash_password, Password},
};

/// Make sure an active owner account exists for `email`.
///
/// Returns `true` when the account was created. An existing registrant with
/// that email is left untouched.
pub async fn ensure_owner(
    store: &dyn Storer,
    email: &str,
    password: &str,
) -> Result<bool, ServiceError> {
    if store.get_registrant_by_email(email).await?.is_some() {
        tracing::info!("Owner account already present");
        return Ok(false);
    }

    let password_hash = hash_password(&Password::new(password.to_string()))
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?
        .into_string();

    let owner = store
        .create_registrant(Registrant {
            id: 0,
            email: email.to_string(),
            password_hash,
            name: "Administrator".to_string(),
            role: Role::Owner,
            active: true,
            last_login: 0,
        })
        .await?;

    tracing::info!(registrant_id = %owner.id, "Owner account created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{memory::InMemoryStore, store::RegistrantStore};

    #[tokio::test]
    async fn test_creates_owner_once() {
        let store = InMemoryStore::new();

        assert!(ensure_owner(&store, "root@example.com", "pw").await.unwrap());
        assert!(!ensure_owner(&store, "root@example.com", "pw").await.unwrap());

        let owner = store
            .get_registrant_by_email("root@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.role, Role::Owner);
        assert!(owner.active);
        assert!(owner.has_password());
    }
}
