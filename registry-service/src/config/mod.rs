use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

use crate::services::session::MIN_SECRET_BYTES;

/// Value of `DATABASE_URL` selecting the in-process store.
pub const IN_MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub network_name: String,
    /// Host (and port) used when building links sent by email.
    pub domain: String,
    pub base_path: String,
    /// Session signing key. Generated at startup when unset.
    pub secret: Option<String>,
    pub enable_user_registration: bool,
    pub allowed_origins: Vec<String>,
    pub enable_swagger: bool,
}

impl HttpConfig {
    /// Base path without trailing slash; empty when serving from the root.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Absolute URL of a front-end page, e.g. `public_url("/verify-email/abc")`.
    pub fn public_url(&self, path: &str) -> String {
        format!("http://{}{}{}", self.domain, self.normalized_base_path(), path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url == IN_MEMORY_DATABASE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Messages are only logged when unset.
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub allow_insecure: bool,
}

/// Owner account created at startup if missing.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub password_reset_attempts: u32,
    pub password_reset_window_seconds: u64,
    /// Key limits on `X-Forwarded-For` instead of the peer address. Only safe
    /// behind a reverse proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let environment: Environment = vars
            .optional("ENVIRONMENT")
            .unwrap_or_else(|| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = RegistryConfig {
            common,
            environment: environment.clone(),
            service_name: vars.get("SERVICE_NAME", Some("registry-service"), is_prod)?,
            service_version: vars.get(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: vars.get("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: vars.optional("OTLP_ENDPOINT"),
            http: HttpConfig {
                network_name: vars.get("NETWORK_NAME", Some("K-Link Registry"), is_prod)?,
                domain: vars.get("HTTP_DOMAIN", Some("localhost:8080"), is_prod)?,
                base_path: vars.get("HTTP_BASE_PATH", Some("/"), is_prod)?,
                secret: vars.optional("HTTP_SECRET"),
                enable_user_registration: vars.parse(
                    "ENABLE_USER_REGISTRATION",
                    Some("true"),
                    is_prod,
                )?,
                allowed_origins: vars
                    .get("ALLOWED_ORIGINS", Some("*"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                enable_swagger: vars.parse("ENABLE_SWAGGER", Some("true"), is_prod)?,
            },
            database: DatabaseConfig {
                url: vars.get("DATABASE_URL", Some(IN_MEMORY_DATABASE), is_prod)?,
                max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: vars.parse("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: vars.optional("SMTP_HOST"),
                port: vars.parse("SMTP_PORT", Some("587"), false)?,
                user: vars.optional("SMTP_USER"),
                password: vars.optional("SMTP_PASSWORD"),
                from: vars.get("SMTP_FROM", Some("registry@localhost"), false)?,
                allow_insecure: vars.parse("SMTP_ALLOW_INSECURE", Some("false"), false)?,
            },
            admin: AdminConfig {
                email: vars.optional("ADMIN_EMAIL"),
                password: vars.optional("ADMIN_PASSWORD"),
            },
            rate_limit: RateLimitConfig {
                login_attempts: vars.parse("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), false)?,
                login_window_seconds: vars.parse(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    false,
                )?,
                register_attempts: vars.parse("RATE_LIMIT_REGISTER_ATTEMPTS", Some("3"), false)?,
                register_window_seconds: vars.parse(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    Some("3600"),
                    false,
                )?,
                password_reset_attempts: vars.parse(
                    "RATE_LIMIT_PASSWORD_RESET_ATTEMPTS",
                    Some("3"),
                    false,
                )?,
                password_reset_window_seconds: vars.parse(
                    "RATE_LIMIT_PASSWORD_RESET_WINDOW_SECONDS",
                    Some("3600"),
                    false,
                )?,
                trust_forwarded_for: vars.parse(
                    "RATE_LIMIT_TRUST_FORWARDED_FOR",
                    Some("false"),
                    false,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.smtp.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SMTP_PORT must be between 1 and 65535"
            )));
        }

        if let Some(secret) = &self.http.secret {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "HTTP_SECRET must be at least {} bytes",
                    MIN_SECRET_BYTES
                )));
            }
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.admin.email.is_some() != self.admin.password.is_some() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ADMIN_EMAIL and ADMIN_PASSWORD must be set together"
            )));
        }

        // In production, ensure stricter validation
        if self.environment == Environment::Prod {
            if self.http.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.database.is_in_memory() {
                tracing::error!("In-memory store configured in production, data will not survive a restart");
            }
        }

        Ok(())
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn get(&self, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
        match self.optional(key) {
            Some(val) => Ok(val),
            None => {
                if is_prod {
                    Err(AppError::ConfigError(anyhow::anyhow!(
                        "{} is required in production but not set",
                        key
                    )))
                } else if let Some(def) = default {
                    Ok(def.to_string())
                } else {
                    Err(AppError::ConfigError(anyhow::anyhow!(
                        "{} is required but not set",
                        key
                    )))
                }
            }
        }
    }

    fn parse<T>(&self, key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.get(key, default, is_prod)?;
        raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
