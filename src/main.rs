mod config;
mod dto;
mod handler;
mod service;
mod template;
mod transport;

use tracing_subscriber::EnvFilter;

use std::{net::SocketAddr, sync::Arc};

use handler::ApiKey;
use service::EmailService;
use transport::SmtpTransportFactory;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Record every panic. Request panics are turned into 500s by the router,
    // a panic on this bootstrap path unwinds out of main and exits non-zero.
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Uncaught exception: {info}");
    }));

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load email service config: {e}");
        panic!("failed to load config: {e}");
    });
    tracing::info!("Successfully loaded email service config");

    if cfg.uses_default_api_key() {
        tracing::warn!("API_KEY is not set, falling back to the default key");
    }
    if cfg.email_tls_accept_invalid_certs {
        tracing::warn!("SMTP certificate validation is disabled");
    }

    // Setup service
    let factory = Arc::new(SmtpTransportFactory::new(&cfg));
    let service = Arc::new(EmailService::new(&cfg, factory));

    // Setup router
    let router = handler::router(service, ApiKey::new(cfg.api_key.clone()));

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Failed to read local address");

    tracing::info!("Server running on {}", addr);

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to run server: {e}");
    }

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
