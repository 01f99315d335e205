use std::sync::Arc;

use chat_relay::{
    config::{ALLOWED_ORIGINS, Config},
    routes,
    state::AppState,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let key_status = if config.openai_api_key.is_empty() {
        "MISSING"
    } else {
        "FOUND"
    };
    info!("OpenAI key: {key_status}");
    for name in config.missing_settings() {
        warn!("{name} is not set");
    }

    let state = Arc::new(AppState::from_config(&config));
    let app = routes::create_router(ALLOWED_ORIGINS).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("chat relay running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
