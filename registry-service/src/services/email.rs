use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::time::Duration;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EmailError(pub String);

/// Outbound email delivery. Any error fails the request that triggered it.
#[async_trait]
pub trait Emailer: Send + Sync {
    async fn email(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError>;
}

/// Rendered message ready to hand to an [`Emailer`].
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl EmailContent {
    pub fn email_verification(network_name: &str, link: &str) -> Self {
        Self {
            subject: format!("{}: Please verify your email address", network_name),
            html_body: format!(
                r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Welcome to the {network}</h2>
        <p>Please click the link below to verify your email address and set a password:</p>
        <p>
            <a href="{link}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Verify Email
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link will expire in 24 hours. If you didn't request this, please ignore this email.
        </p>
    </body>
</html>
"###,
                network = network_name,
                link = link
            ),
            text_body: format!(
                "Welcome to the {}. Please use this link to verify your email address and set a password:\n\n{}\n\nThis link will expire in 24 hours.",
                network_name, link
            ),
        }
    }

    pub fn password_reset(network_name: &str, link: &str) -> Self {
        Self {
            subject: format!("{}: Reset your password", network_name),
            html_body: format!(
                r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Password Reset Request</h2>
        <p>We received a request to reset your password. Click the link below to set a new password:</p>
        <p>
            <a href="{link}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Reset Password
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link will expire in 24 hours. If you didn't request this, please ignore this email.
        </p>
    </body>
</html>
"###,
                link = link
            ),
            text_body: format!(
                "We received a request to reset your {} password. Please visit the following link to set a new password:\n\n{}\n\nThis link will expire in 24 hours.",
                network_name, link
            ),
        }
    }
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, anyhow::Error> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("SMTP_HOST is not set"))?;

        let builder = if config.allow_insecure {
            tracing::warn!(host = %host, "SMTP transport without TLS");
            SmtpTransport::builder_dangerous(host)
        } else {
            SmtpTransport::starttls_relay(host)
                .map_err(|e| anyhow::anyhow!("Invalid SMTP relay {}: {}", host, e))?
        };

        let builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)));

        let builder = match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(host = %host, port = config.port, "Email service initialized with SMTP");

        Ok(Self {
            mailer: builder.build(),
            from_email: config.from.clone(),
        })
    }
}

#[async_trait]
impl Emailer for SmtpMailer {
    async fn email(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| EmailError(e.to_string()))?,
            )
            .to(recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| EmailError(e.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| EmailError(e.to_string()))?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| EmailError(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %recipient, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %recipient, "Failed to send email");
                Err(EmailError(e.to_string()))
            }
        }
    }
}

/// Writes messages to the log instead of sending them. Used when no SMTP host
/// is configured.
#[derive(Clone, Default)]
pub struct DebugMailer;

#[async_trait]
impl Emailer for DebugMailer {
    async fn email(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        tracing::info!(
            to = %recipient,
            subject = %subject,
            body = %text_body,
            "Email not sent, no SMTP host configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_mailer_creation() {
        let config = SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            user: Some("registry@example.com".to_string()),
            password: Some("secret".to_string()),
            from: "registry@example.com".to_string(),
            allow_insecure: false,
        };

        assert!(SmtpMailer::new(&config).is_ok());
    }

    #[test]
    fn test_verification_email_contains_link() {
        let content =
            EmailContent::email_verification("K-Link Registry", "http://reg/verify-email/abc");
        assert!(content.subject.starts_with("K-Link Registry"));
        assert!(content.html_body.contains("http://reg/verify-email/abc"));
        assert!(content.text_body.contains("http://reg/verify-email/abc"));
    }

    #[tokio::test]
    async fn test_debug_mailer_accepts_everything() {
        assert!(DebugMailer.email("a@b.com", "s", "<p>h</p>", "t").await.is_ok());
    }
}
