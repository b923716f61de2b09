use auth_service::{
    build_router,
    config::AuthConfig,
    services::{
        AdminService, AuthService, JwtService, PgStore, RedisBlacklist, ResetTokenGenerator,
        SmtpEmailService,
    },
    AppState,
};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    let store = PgStore::connect(&config.database.url, config.database.max_connections).await?;
    store.run_migrations().await?;
    let store = Arc::new(store);

    let blacklist = Arc::new(RedisBlacklist::connect(&config.redis.url).await?);
    tracing::info!("Token blacklist initialized");

    let email = Arc::new(SmtpEmailService::new(&config.smtp, &config.reset)?);

    let jwt = JwtService::new(&config.jwt)?;
    let reset = ResetTokenGenerator::new(&config.jwt.secret, &config.reset);

    let auth_service = AuthService::new(
        store.clone(),
        email.clone(),
        jwt.clone(),
        blacklist.clone(),
        reset,
    );
    let admin_service = AdminService::new(store.clone());

    let state = AppState {
        config: config.clone(),
        store,
        email,
        jwt,
        blacklist,
        auth_service,
        admin_service,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
