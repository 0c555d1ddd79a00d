//! Companion Web 服务
//!
//! 启动: cargo run
//! 浏览器访问 http://127.0.0.1:5000

use std::sync::Arc;

use companion::config::{load_config, AppConfig};
use companion::observability;
use companion::web::{router, spawn_session_reaper, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = load_config(None);
    let cfg = loaded.as_ref().cloned().unwrap_or_else(|_| AppConfig::default());
    observability::init(&cfg.app.log_level);
    if let Err(e) = &loaded {
        tracing::warn!("failed to load config, using defaults: {}", e);
    }

    let state = Arc::new(AppState::from_config(&cfg));
    spawn_session_reaper(Arc::clone(&state));

    let app = router(Arc::clone(&state));

    let addr = format!("{}:{}", cfg.web.host, cfg.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "{} listening on http://{}",
        cfg.app.name.as_deref().unwrap_or("companion"),
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, shutting down...");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
