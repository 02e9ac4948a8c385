use registry_service::{
    build_router,
    config::RegistryConfig,
    db,
    services::{
        bootstrap, DebugMailer, Emailer, InMemoryStore, PgStore, SessionService, SmtpMailer,
        Storer,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = RegistryConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting registry service"
    );

    let store: Arc<dyn Storer> = if config.database.is_in_memory() {
        tracing::warn!("Using the in-memory store, data is lost on restart");
        Arc::new(InMemoryStore::new())
    } else {
        tracing::info!("Connecting to PostgreSQL");
        let pool = db::create_pool(&config.database)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
        db::run_migrations(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
        tracing::info!("Database initialized successfully");
        Arc::new(PgStore::new(pool))
    };

    let email: Arc<dyn Emailer> = match &config.smtp.host {
        Some(host) => {
            tracing::info!(smtp_host = %host, "SMTP mailer initialized");
            Arc::new(SmtpMailer::new(&config.smtp)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, emails will only be logged");
            Arc::new(DebugMailer)
        }
    };

    let sessions = match &config.http.secret {
        Some(secret) => SessionService::new(secret.as_bytes()),
        None => {
            tracing::warn!("HTTP_SECRET not set, sessions will not survive a restart");
            SessionService::with_random_secret()
        }
    };

    if let (Some(admin_email), Some(admin_password)) =
        (&config.admin.email, &config.admin.password)
    {
        bootstrap::ensure_owner(store.as_ref(), admin_email, admin_password).await?;
    }

    let addr = config.common.socket_addr();
    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );

    let state = AppState::new(config, store, email, sessions);
    let app = build_router(state)?;

    let _guard = service_span.enter();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
