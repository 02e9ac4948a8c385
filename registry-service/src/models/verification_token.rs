use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Verification tokens stay usable for this many hours after issue.
pub const VERIFICATION_TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

impl TryFrom<String> for TokenPurpose {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "email_verification" => Ok(TokenPurpose::EmailVerification),
            "password_reset" => Ok(TokenPurpose::PasswordReset),
            other => Err(format!("Unknown token purpose: {}", other)),
        }
    }
}

/// Single-use token mailed to a registrant.
///
/// Possession of `token` proves control of `email`. Expiry is evaluated when
/// the token is used; storage does not purge old rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct VerificationToken {
    pub token: String,
    pub registrant_id: i64,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub purpose: TokenPurpose,
    pub issued_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new_email_verification(registrant_id: i64, email: String, token: String) -> Self {
        Self {
            token,
            registrant_id,
            email,
            purpose: TokenPurpose::EmailVerification,
            issued_at: Utc::now(),
        }
    }

    pub fn new_password_reset(registrant_id: i64, email: String, token: String) -> Self {
        Self {
            token,
            registrant_id,
            email,
            purpose: TokenPurpose::PasswordReset,
            issued_at: Utc::now(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::hours(VERIFICATION_TOKEN_LIFETIME_HOURS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_issued_at(issued_at: DateTime<Utc>) -> VerificationToken {
        VerificationToken {
            token: "abc".to_string(),
            registrant_id: 1,
            email: "a@b.com".to_string(),
            purpose: TokenPurpose::EmailVerification,
            issued_at,
        }
    }

    #[test]
    fn test_valid_one_second_before_expiry() {
        let issued_at = Utc::now();
        let token = token_issued_at(issued_at);
        let now = issued_at + Duration::hours(24) - Duration::seconds(1);
        assert!(!token.is_expired_at(now));
    }

    #[test]
    fn test_expired_one_second_after_expiry() {
        let issued_at = Utc::now();
        let token = token_issued_at(issued_at);
        let now = issued_at + Duration::hours(24) + Duration::seconds(1);
        assert!(token.is_expired_at(now));
    }

    #[test]
    fn test_still_valid_at_exact_boundary() {
        let issued_at = Utc::now();
        let token = token_issued_at(issued_at);
        assert!(!token.is_expired_at(issued_at + Duration::hours(24)));
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let token = VerificationToken::new_password_reset(7, "x@y.z".into(), "t".into());
        assert!(!token.is_expired());
        assert_eq!(token.purpose, TokenPurpose::PasswordReset);
    }

    #[test]
    fn test_purpose_round_trips_through_storage_text() {
        let purpose = TokenPurpose::try_from("password_reset".to_string()).unwrap();
        assert_eq!(purpose.as_str(), "password_reset");
        assert!(TokenPurpose::try_from("bogus".to_string()).is_err());
    }
}
