use std::net::SocketAddr;
use std::sync::Arc;

use service_core::observability::logging::init_tracing;
use tokio::signal;
use upload_service::auth::chain::AuthenticationChain;
use upload_service::config::UploadConfig;
use upload_service::oidc::GithubOidcVerifier;
use upload_service::store::InMemoryStore;
use upload_service::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = UploadConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting upload authentication service"
    );

    // Standalone credential store. Deployments with a real backend swap
    // in their own CredentialStore implementation here.
    let store = Arc::new(InMemoryStore::new());

    let oidc = Arc::new(GithubOidcVerifier::new(&config.oidc, store.clone())?);
    tracing::info!("OIDC verifier initialized");

    let chain = Arc::new(AuthenticationChain::standard(
        store,
        oidc,
        config.global_upload_tokens.clone(),
    ));
    tracing::info!(
        global_tokens = config.global_upload_tokens.len(),
        "Authentication chain initialized"
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        chain,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
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
