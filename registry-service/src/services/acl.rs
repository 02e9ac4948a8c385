//! Application-to-registry authentication for the v1 API.

use subtle::ConstantTimeEq;
use thiserror::Error;

use super::store::{StoreError, Storer};
use crate::models::{Application, Klink};

/// Reasons an application is refused. Callers only ever see a generic denial;
/// the variant is for the logs.
#[derive(Debug, Error)]
pub enum AclError {
    #[error("No application registered for this domain")]
    UnknownApplication,

    #[error("Application secret does not match")]
    InvalidSecret,

    #[error("Application is disabled")]
    Inactive,

    #[error("Permission not granted: {0}")]
    MissingPermission(String),

    #[error("Application owner {0} no longer exists")]
    OwnerMissing(i64),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Application that passed authentication, with its derived read-only data.
#[derive(Debug, Clone)]
pub struct AuthenticatedApplication {
    pub application: Application,
    pub klinks: Vec<Klink>,
    pub owner_email: String,
}

/// Strict containment: one missing permission denies the whole request.
pub fn check_access(application: &Application, requested: &[String]) -> Result<(), AclError> {
    match requested
        .iter()
        .find(|name| !application.permissions.contains(name))
    {
        Some(missing) => Err(AclError::MissingPermission(missing.clone())),
        None => Ok(()),
    }
}

fn secrets_match(stored: &str, supplied: &str) -> bool {
    stored.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Authenticate an application by domain and shared secret and check it holds
/// every requested permission.
pub async fn authenticate_application(
    store: &dyn Storer,
    app_url: &str,
    app_secret: &str,
    requested: &[String],
) -> Result<AuthenticatedApplication, AclError> {
    let application = store
        .get_application_by_domain(app_url)
        .await?
        .ok_or(AclError::UnknownApplication)?;

    if !secrets_match(&application.auth_token, app_secret) {
        return Err(AclError::InvalidSecret);
    }

    if !application.active {
        return Err(AclError::Inactive);
    }

    check_access(&application, requested)?;

    let owner = store
        .get_registrant_by_id(application.owner_id)
        .await?
        .ok_or(AclError::OwnerMissing(application.owner_id))?;

    let klinks = resolve_klinks(store, &application.klinks).await?;

    Ok(AuthenticatedApplication {
        application,
        klinks,
        owner_email: owner.email,
    })
}

/// Unknown and empty identifiers are skipped.
async fn resolve_klinks(store: &dyn Storer, identifiers: &[String]) -> Result<Vec<Klink>, AclError> {
    let mut klinks = Vec::with_capacity(identifiers.len());
    for identifier in identifiers.iter().filter(|id| !id.is_empty()) {
        if let Some(klink) = store.get_klink_by_identifier(identifier).await? {
            klinks.push(klink);
        }
    }
    Ok(klinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(permissions: &[&str]) -> Application {
        Application {
            id: 1,
            owner_id: 1,
            name: "App".to_string(),
            url: "app.example".to_string(),
            auth_token: "secret".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            klinks: vec![],
            active: true,
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_subset_is_granted() {
        let app = application(&["search", "data-read"]);
        assert!(check_access(&app, &names(&["search"])).is_ok());
        assert!(check_access(&app, &names(&["search", "data-read"])).is_ok());
    }

    #[test]
    fn test_empty_request_is_granted() {
        assert!(check_access(&application(&[]), &[]).is_ok());
    }

    #[test]
    fn test_one_missing_permission_denies_all() {
        let app = application(&["search"]);
        let err = check_access(&app, &names(&["search", "data-write"])).unwrap_err();
        assert!(matches!(err, AclError::MissingPermission(p) if p == "data-write"));
    }

    #[test]
    fn test_secret_comparison_is_exact() {
        assert!(secrets_match("secret", "secret"));
        assert!(!secrets_match("secret", "secret "));
        assert!(!secrets_match("secret", "SECRET"));
        assert!(!secrets_match("secret", ""));
    }
}
