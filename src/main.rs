use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use subscription_webhooks::adapters::{
    webhook_router, HttpNotifier, HttpNotifierConfig, InMemorySubscriptionStore, LoggingNotifier,
    WebhookAppState,
};
use subscription_webhooks::config::AppConfig;
use subscription_webhooks::domain::subscription::WebhookVerifier;
use subscription_webhooks::ports::Notifier;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server terminated with error");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn Error>> {
    info!(
        environment = ?config.server.environment,
        signature_header = %config.webhook.signature_header,
        "Starting subscription webhook service"
    );

    if !config.webhook.has_secret() {
        tracing::error!("Webhook secret not configured; every delivery will be answered 500");
    }

    let notifier: Arc<dyn Notifier> = match &config.notification.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Using HTTP notifier");
            Arc::new(HttpNotifier::new(HttpNotifierConfig {
                endpoint: endpoint.clone(),
                admin_email: config.notification.admin_email.clone(),
                timeout: config.notification.timeout(),
            })?)
        }
        None => {
            info!("No notification endpoint configured; notifications will be logged");
            Arc::new(LoggingNotifier::new().with_admin_email(&config.notification.admin_email))
        }
    };

    let state = WebhookAppState {
        store: Arc::new(InMemorySubscriptionStore::new()),
        notifier,
        verifier: WebhookVerifier::new(config.webhook.secret.clone()),
        signature_header: config.webhook.signature_header_name()?,
        dispatch_timeout: config.webhook.dispatch_timeout(),
        app_url: config.notification.app_url.clone(),
    };

    let app = webhook_router(config.webhook.max_body_bytes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Error setting up signal handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Error setting up SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received shutdown signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
