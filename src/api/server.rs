//! Listener setup and graceful shutdown.

use anyhow::{Context, Result};
use axum::Router;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Bind the configured address, e.g. `localhost:8080` or `0.0.0.0:0`.
pub async fn bind(host: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(host)
        .await
        .with_context(|| format!("binding {}", host))?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serve `app` until `shutdown` resolves.
///
/// Once `shutdown` fires, new connections are refused and in-flight requests
/// get `timeout` to finish before the server is dropped.
pub async fn run_server<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    timeout: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let triggered = Arc::new(Notify::new());
    let trigger = Arc::clone(&triggered);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("HTTP server shutting down");
            trigger.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            triggered.notified().await;
            tokio::time::sleep(timeout).await;
        } => {
            warn!(timeout_secs = timeout.as_secs(), "in-flight requests did not finish in time");
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
