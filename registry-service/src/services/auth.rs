use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{
    config::HttpConfig,
    dtos::auth::{
        ChangePasswordRequest, ConfirmEmailRequest, EmailVerificationResponse, LoginRequest,
        PasswordResetRequest, RegistrationRequest, SessionResponse,
    },
    models::{Identity, Registrant, TokenPurpose, VerificationToken},
    services::{
        email::{EmailContent, Emailer},
        error::ServiceError,
        session::SessionService,
        store::{StoreError, Storer},
    },
    utils::{
        generate_verification_token, hash_password, verify_password, Password,
        PasswordHashString,
    },
};

/// Lifetime of a token issued by password login.
pub const LOGIN_TOKEN_LIFETIME_MINUTES: i64 = 15;

/// Lifetime of a token issued by session refresh.
pub const REFRESH_TOKEN_LIFETIME_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Storer>,
    email: Arc<dyn Emailer>,
    sessions: SessionService,
    http: HttpConfig,
    dummy_hash: PasswordHashString,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Storer>,
        email: Arc<dyn Emailer>,
        sessions: SessionService,
        http: HttpConfig,
    ) -> Self {
        let dummy_hash = hash_password(&Password::new(generate_verification_token()))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to prepare dummy password hash");
                PasswordHashString::new(String::new())
            });

        Self {
            store,
            email,
            sessions,
            http,
            dummy_hash,
        }
    }

    // ==================== Sessions ====================

    /// Password login. Unknown emails and wrong passwords fail identically,
    /// in response and in hashing cost; a disabled account is only reported
    /// once the password checked out.
    pub async fn login(&self, req: LoginRequest) -> Result<SessionResponse, ServiceError> {
        let password = Password::new(req.password);

        let Some(mut registrant) = self
            .store
            .get_registrant_by_email(&req.email)
            .await?
            .filter(Registrant::has_password)
        else {
            let _ = verify_password(&password, &self.dummy_hash);
            return Err(ServiceError::InvalidCredentials);
        };

        verify_password(
            &password,
            &PasswordHashString::new(registrant.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        if !registrant.active {
            tracing::info!(registrant_id = %registrant.id, "Login attempt on disabled account");
            return Err(ServiceError::AccountDisabled);
        }

        let now = Utc::now();
        registrant.last_login = now.timestamp();
        self.store.replace_registrant(&registrant).await?;

        tracing::info!(registrant_id = %registrant.id, "Registrant logged in");

        self.session_for(
            &Identity::from(&registrant),
            now + Duration::minutes(LOGIN_TOKEN_LIFETIME_MINUTES),
        )
    }

    /// Exchange a valid session for a fresh one. The registrant is re-read so
    /// role changes apply and deleted or disabled accounts are cut off.
    pub async fn refresh(&self, identity: &Identity) -> Result<SessionResponse, ServiceError> {
        let registrant = self
            .store
            .get_registrant_by_id(identity.id)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        if !registrant.active {
            return Err(ServiceError::AccountDisabled);
        }

        self.session_for(
            &Identity::from(&registrant),
            Utc::now() + Duration::minutes(REFRESH_TOKEN_LIFETIME_MINUTES),
        )
    }

    fn session_for(
        &self,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionResponse, ServiceError> {
        let token = self.sessions.issue(identity, expires_at)?;
        Ok(SessionResponse {
            user_id: identity.id,
            role: identity.role,
            token,
        })
    }

    // ==================== Registration ====================

    /// Create an inactive registrant without password and mail them a
    /// verification link. Nothing is kept if the email cannot be sent.
    pub async fn register(&self, req: RegistrationRequest) -> Result<(), ServiceError> {
        if !self.http.enable_user_registration {
            return Err(ServiceError::RegistrationDisabled);
        }

        let registrant = match self
            .store
            .create_registrant(Registrant::new_registration(req.email, req.name))
            .await
        {
            Ok(registrant) => registrant,
            Err(StoreError::Duplicate(_)) => return Err(ServiceError::DuplicateRegistrant),
            Err(e) => return Err(e.into()),
        };

        let verification = VerificationToken::new_email_verification(
            registrant.id,
            registrant.email.clone(),
            generate_verification_token(),
        );

        if let Err(e) = self.store.create_verification(&verification).await {
            self.discard_registration(registrant.id).await;
            return Err(e.into());
        }

        let link = self
            .http
            .public_url(&format!("/verify-email/{}", verification.token));
        let content = EmailContent::email_verification(&self.http.network_name, &link);

        if let Err(e) = self.send(&verification.email, &content).await {
            self.discard_registration(registrant.id).await;
            return Err(e);
        }

        tracing::info!(registrant_id = %registrant.id, "Registrant created, verification sent");
        Ok(())
    }

    async fn discard_registration(&self, registrant_id: i64) {
        if let Err(e) = self.store.delete_registrant(registrant_id).await {
            tracing::error!(
                error = %e,
                registrant_id = %registrant_id,
                "Failed to roll back registration"
            );
        }
    }

    // ==================== Email verification ====================

    pub async fn inspect_email_verification(
        &self,
        token: &str,
    ) -> Result<EmailVerificationResponse, ServiceError> {
        let (_, registrant) = self
            .load_verification(token, TokenPurpose::EmailVerification)
            .await?;

        Ok(EmailVerificationResponse {
            require_password: !registrant.has_password(),
            display_name: registrant.name,
        })
    }

    /// Confirm the mailbox: the registrant's email becomes the verified one,
    /// and a first password is set when none exists yet. The token is spent
    /// before anything is written.
    pub async fn confirm_email_verification(
        &self,
        token: &str,
        req: ConfirmEmailRequest,
    ) -> Result<(), ServiceError> {
        let (_, registrant) = self
            .load_verification(token, TokenPurpose::EmailVerification)
            .await?;

        let password_hash = if registrant.has_password() {
            None
        } else {
            let password = req
                .password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ServiceError::Validation("A password is required".to_string()))?;
            Some(hash(password)?)
        };

        let verification = self
            .claim_verification(token, TokenPurpose::EmailVerification)
            .await?;
        let mut registrant = self.claimed_registrant(&verification).await?;

        if let Some(password_hash) = password_hash.filter(|_| !registrant.has_password()) {
            registrant.password_hash = password_hash;
        }
        registrant.email = verification.email.clone();

        if let Err(e) = self.store.replace_registrant(&registrant).await {
            self.restore(&verification).await;
            return Err(match e {
                StoreError::Duplicate(_) => ServiceError::DuplicateRegistrant,
                other => other.into(),
            });
        }

        tracing::info!(registrant_id = %registrant.id, "Email address verified");
        Ok(())
    }

    // ==================== Password reset ====================

    /// Mail a password reset link. Unknown addresses succeed silently.
    pub async fn request_password_reset(
        &self,
        req: PasswordResetRequest,
    ) -> Result<(), ServiceError> {
        let Some(registrant) = self.store.get_registrant_by_email(&req.email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let verification = VerificationToken::new_password_reset(
            registrant.id,
            registrant.email.clone(),
            generate_verification_token(),
        );
        self.store.create_verification(&verification).await?;

        let link = self
            .http
            .public_url(&format!("/change-password/{}", verification.token));
        let content = EmailContent::password_reset(&self.http.network_name, &link);

        if let Err(e) = self.send(&verification.email, &content).await {
            if let Err(delete_err) = self.store.delete_verification(&verification.token).await {
                tracing::error!(
                    error = %delete_err,
                    registrant_id = %registrant.id,
                    "Failed to discard unsent password reset token"
                );
            }
            return Err(e);
        }

        tracing::info!(registrant_id = %registrant.id, "Password reset sent");
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        req: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        if req.password.is_empty() {
            return Err(ServiceError::Validation("A password is required".to_string()));
        }

        self.load_verification(token, TokenPurpose::PasswordReset).await?;
        let password_hash = hash(req.password)?;

        let verification = self
            .claim_verification(token, TokenPurpose::PasswordReset)
            .await?;
        let mut registrant = self.claimed_registrant(&verification).await?;

        registrant.password_hash = password_hash;
        if let Err(e) = self.store.replace_registrant(&registrant).await {
            self.restore(&verification).await;
            return Err(e.into());
        }

        tracing::info!(registrant_id = %registrant.id, "Password changed");
        Ok(())
    }

    // ==================== Helpers ====================

    /// Look up a token for `purpose`. Unknown tokens and tokens of another
    /// purpose are not found; a known token past its window is expired.
    async fn load_verification(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<(VerificationToken, Registrant), ServiceError> {
        let verification = self
            .store
            .get_verification_by_token(token)
            .await?
            .filter(|v| v.purpose == purpose)
            .ok_or(ServiceError::NotFound)?;

        if verification.is_expired() {
            return Err(ServiceError::TokenExpired);
        }

        let registrant = self
            .store
            .get_registrant_by_id(verification.registrant_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    registrant_id = %verification.registrant_id,
                    "Verification token for a registrant that no longer exists"
                );
                ServiceError::NotFound
            })?;

        Ok((verification, registrant))
    }

    /// Atomically remove the token so only one request can spend it. A token
    /// already taken by a concurrent request is not found.
    async fn claim_verification(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<VerificationToken, ServiceError> {
        let verification = match self.store.take_verification(token).await {
            Ok(verification) => verification,
            Err(StoreError::NotFound) => return Err(ServiceError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if verification.purpose != purpose {
            self.restore(&verification).await;
            return Err(ServiceError::NotFound);
        }
        if verification.is_expired() {
            return Err(ServiceError::TokenExpired);
        }
        Ok(verification)
    }

    async fn claimed_registrant(
        &self,
        verification: &VerificationToken,
    ) -> Result<Registrant, ServiceError> {
        match self
            .store
            .get_registrant_by_id(verification.registrant_id)
            .await
        {
            Ok(Some(registrant)) => Ok(registrant),
            Ok(None) => Err(ServiceError::NotFound),
            Err(e) => {
                self.restore(verification).await;
                Err(e.into())
            }
        }
    }

    /// Put a claimed token back after a failure that left the registrant untouched.
    async fn restore(&self, verification: &VerificationToken) {
        if let Err(e) = self.store.create_verification(verification).await {
            tracing::error!(
                error = %e,
                registrant_id = %verification.registrant_id,
                "Failed to restore verification token"
            );
        }
    }

    async fn send(&self, recipient: &str, content: &EmailContent) -> Result<(), ServiceError> {
        self.email
            .email(
                recipient,
                &content.subject,
                &content.html_body,
                &content.text_body,
            )
            .await
            .map_err(ServiceError::from)
    }
}

fn hash(password: String) -> Result<String, ServiceError> {
    hash_password(&Password::new(password))
        .map(PasswordHashString::into_string)
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))
}
