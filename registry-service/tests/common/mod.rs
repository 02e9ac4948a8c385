//! Shared setup for the registry-service integration tests.
//!
//! Every test gets its own router over an [`InMemoryStore`] and a mailer that
//! records what would have been sent.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use registry_service::{
    build_router,
    config::RegistryConfig,
    models::{Application, Identity, Permission, Registrant, Role},
    services::{
        store::{ApplicationStore, PermissionStore, RegistrantStore},
        EmailError, Emailer, InMemoryStore, SessionService, Storer,
    },
    utils::{hash_password, Password},
    AppState,
};
use serde_json::Value;
use service_core::config::Config;
use std::{collections::HashMap, sync::Arc, sync::Mutex};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "an-http-secret-that-is-long-enough-for-tests";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Token at the end of the last link containing `marker`, e.g. `/verify-email/`.
    pub fn last_token(&self, marker: &str) -> Option<String> {
        self.sent().iter().rev().find_map(|email| {
            let start = email.text_body.find(marker)? + marker.len();
            let token: String = email.text_body[start..]
                .chars()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect();
            (!token.is_empty()).then_some(token)
        })
    }
}

#[async_trait]
impl Emailer for RecordingMailer {
    async fn email(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError("SMTP server unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            text_body: text_body.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Storer>,
    pub mailer: Arc<RecordingMailer>,
    pub sessions: SessionService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_vars(&[], RecordingMailer::default())
    }

    pub fn with_vars(vars: &[(&str, &str)], mailer: RecordingMailer) -> Self {
        let mut env: HashMap<String, String> = [
            ("HTTP_SECRET", TEST_SECRET),
            ("HTTP_DOMAIN", "registry.test"),
            ("NETWORK_NAME", "Test Network"),
            ("LOG_LEVEL", "error"),
            ("RATE_LIMIT_LOGIN_ATTEMPTS", "1000"),
            ("RATE_LIMIT_REGISTER_ATTEMPTS", "1000"),
            ("RATE_LIMIT_PASSWORD_RESET_ATTEMPTS", "1000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in vars {
            env.insert(key.to_string(), value.to_string());
        }

        let config = RegistryConfig::from_lookup(Config::default(), |key| env.get(key).cloned())
            .expect("test configuration");

        let store: Arc<dyn Storer> = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(mailer);
        let sessions = SessionService::new(TEST_SECRET.as_bytes());

        let state = AppState::new(config, store.clone(), mailer.clone(), sessions.clone());
        let router = build_router(state).expect("router");

        Self {
            router,
            store,
            mailer,
            sessions,
        }
    }

    /// Insert an active registrant whose password is [`TEST_PASSWORD`].
    pub async fn registrant(&self, email: &str, role: Role) -> Registrant {
        let password_hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("hash")
            .into_string();
        self.store
            .create_registrant(Registrant {
                id: 0,
                email: email.to_string(),
                password_hash,
                name: email.split('@').next().unwrap_or(email).to_string(),
                role,
                active: true,
                last_login: 0,
            })
            .await
            .expect("create registrant")
    }

    pub async fn application(
        &self,
        owner: &Registrant,
        url: &str,
        permissions: &[&str],
    ) -> Application {
        for name in permissions {
            let _ = self
                .store
                .create_permission(&Permission {
                    name: name.to_string(),
                })
                .await;
        }
        self.store
            .create_application(Application {
                id: 0,
                owner_id: owner.id,
                name: format!("{} app", owner.name),
                url: url.to_string(),
                auth_token: "s3cr3t".to_string(),
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
                klinks: Vec::new(),
                active: true,
            })
            .await
            .expect("create application")
    }

    /// Session token for `registrant`, minted directly.
    pub fn token_for(&self, registrant: &Registrant) -> String {
        self.sessions
            .issue(
                &Identity::from(registrant),
                Utc::now() + Duration::minutes(15),
            )
            .expect("issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        into_json(response).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        into_json(response).await
    }
}

pub async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
