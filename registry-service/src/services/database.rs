//! PostgreSQL implementation of the storage contract.

use async_trait::async_trait;
use sqlx::postgres::PgPool;

use super::store::{
    ApplicationStore, KlinkStore, PermissionStore, RegistrantStore, StoreError, Storer,
    VerificationStore,
};
use crate::models::{Application, Klink, Permission, Registrant, VerificationToken};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(db_err.message().to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::Referenced(db_err.message().to_string());
        }
    }
    StoreError::Backend(anyhow::Error::new(err))
}

fn expect_affected(rows: u64) -> Result<(), StoreError> {
    if rows == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

// ==================== Registrant Operations ====================

const REGISTRANT_COLUMNS: &str = "id, email, password_hash, name, role, active, last_login";

#[async_trait]
impl RegistrantStore for PgStore {
    async fn create_registrant(&self, registrant: Registrant) -> Result<Registrant, StoreError> {
        let query = format!(
            r#"
            INSERT INTO registrants (email, password_hash, name, role, active, last_login)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REGISTRANT_COLUMNS
        );
        sqlx::query_as::<_, Registrant>(&query)
            .bind(&registrant.email)
            .bind(&registrant.password_hash)
            .bind(&registrant.name)
            .bind(registrant.role.as_str())
            .bind(registrant.active)
            .bind(registrant.last_login)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_registrants(&self) -> Result<Vec<Registrant>, StoreError> {
        let query = format!("SELECT {} FROM registrants ORDER BY id", REGISTRANT_COLUMNS);
        sqlx::query_as::<_, Registrant>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_registrant_by_id(&self, id: i64) -> Result<Option<Registrant>, StoreError> {
        let query = format!("SELECT {} FROM registrants WHERE id = $1", REGISTRANT_COLUMNS);
        sqlx::query_as::<_, Registrant>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_registrant_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Registrant>, StoreError> {
        let query = format!("SELECT {} FROM registrants WHERE email = $1", REGISTRANT_COLUMNS);
        sqlx::query_as::<_, Registrant>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn replace_registrant(&self, registrant: &Registrant) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE registrants
            SET email = $2, password_hash = $3, name = $4, role = $5, active = $6, last_login = $7
            WHERE id = $1
            "#,
        )
        .bind(registrant.id)
        .bind(&registrant.email)
        .bind(&registrant.password_hash)
        .bind(&registrant.name)
        .bind(registrant.role.as_str())
        .bind(registrant.active)
        .bind(registrant.last_login)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn delete_registrant(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM registrants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}

// ==================== Application Operations ====================

const APPLICATION_COLUMNS: &str = "id, owner_id, name, url, auth_token, permissions, klinks, active";

#[async_trait]
impl ApplicationStore for PgStore {
    async fn create_application(
        &self,
        application: Application,
    ) -> Result<Application, StoreError> {
        let query = format!(
            r#"
            INSERT INTO applications (owner_id, name, url, auth_token, permissions, klinks, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(application.owner_id)
            .bind(&application.name)
            .bind(&application.url)
            .bind(&application.auth_token)
            .bind(&application.permissions)
            .bind(&application.klinks)
            .bind(application.active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let query = format!("SELECT {} FROM applications ORDER BY id", APPLICATION_COLUMNS);
        sqlx::query_as::<_, Application>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_application_by_id(&self, id: i64) -> Result<Option<Application>, StoreError> {
        let query = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_application_by_domain(
        &self,
        url: &str,
    ) -> Result<Option<Application>, StoreError> {
        let query = format!("SELECT {} FROM applications WHERE url = $1", APPLICATION_COLUMNS);
        sqlx::query_as::<_, Application>(&query)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn replace_application(&self, application: &Application) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET owner_id = $2, name = $3, url = $4, auth_token = $5, permissions = $6,
                klinks = $7, active = $8
            WHERE id = $1
            "#,
        )
        .bind(application.id)
        .bind(application.owner_id)
        .bind(&application.name)
        .bind(&application.url)
        .bind(&application.auth_token)
        .bind(&application.permissions)
        .bind(&application.klinks)
        .bind(application.active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn delete_application(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}

// ==================== K-Link Operations ====================

const KLINK_COLUMNS: &str = "id, identifier, manager_id, name, website, description, active";

#[async_trait]
impl KlinkStore for PgStore {
    async fn create_klink(&self, klink: Klink) -> Result<Klink, StoreError> {
        let query = format!(
            r#"
            INSERT INTO klinks (identifier, manager_id, name, website, description, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            KLINK_COLUMNS
        );
        sqlx::query_as::<_, Klink>(&query)
            .bind(&klink.identifier)
            .bind(klink.manager_id)
            .bind(&klink.name)
            .bind(&klink.website)
            .bind(&klink.description)
            .bind(klink.active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_klinks(&self) -> Result<Vec<Klink>, StoreError> {
        let query = format!("SELECT {} FROM klinks ORDER BY id", KLINK_COLUMNS);
        sqlx::query_as::<_, Klink>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_klink_by_id(&self, id: i64) -> Result<Option<Klink>, StoreError> {
        let query = format!("SELECT {} FROM klinks WHERE id = $1", KLINK_COLUMNS);
        sqlx::query_as::<_, Klink>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn get_klink_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Klink>, StoreError> {
        let query = format!("SELECT {} FROM klinks WHERE identifier = $1", KLINK_COLUMNS);
        sqlx::query_as::<_, Klink>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn replace_klink(&self, klink: &Klink) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE klinks
            SET identifier = $2, manager_id = $3, name = $4, website = $5, description = $6,
                active = $7
            WHERE id = $1
            "#,
        )
        .bind(klink.id)
        .bind(&klink.identifier)
        .bind(klink.manager_id)
        .bind(&klink.name)
        .bind(&klink.website)
        .bind(&klink.description)
        .bind(klink.active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn delete_klink(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM klinks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}

// ==================== Permission Operations ====================

#[async_trait]
impl PermissionStore for PgStore {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        sqlx::query_as::<_, Permission>("SELECT name FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO permissions (name) VALUES ($1)")
            .bind(&permission.name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

// ==================== Verification Token Operations ====================

#[async_trait]
impl VerificationStore for PgStore {
    async fn create_verification(&self, token: &VerificationToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (token, registrant_id, email, purpose, issued_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.registrant_id)
        .bind(&token.email)
        .bind(token.purpose.as_str())
        .bind(token.issued_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_verification_by_token(
        &self,
        token: &str,
    ) -> Result<Option<VerificationToken>, StoreError> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT token, registrant_id, email, purpose, issued_at
            FROM verification_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_verification(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn take_verification(&self, token: &str) -> Result<VerificationToken, StoreError> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            DELETE FROM verification_tokens
            WHERE token = $1
            RETURNING token, registrant_id, email, purpose, issued_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl Storer for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                map_sqlx_error(e)
            })?;
        Ok(())
    }
}
