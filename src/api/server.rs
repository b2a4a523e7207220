//! Axum server setup.
//!
//! - Localhost-only CORS unless `cors_permissive` is set
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::config::Settings;
use crate::error::Result;
use crate::services::PagingLimits;
use crate::storage::DocumentStore;

/// Shared application state.
///
/// SQLite connections are not `Sync`, so the store sits behind a mutex and
/// every unit of work runs on the blocking pool.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<DocumentStore>>,
    pub limits: PagingLimits,
    pub max_tags: usize,
    /// Acting user for requests without an `X-User-Id` header.
    pub default_user: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(store: DocumentStore, settings: &Settings) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            limits: PagingLimits::from(settings),
            max_tags: settings.max_tags,
            default_user: settings.current_user.clone(),
        }
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn run<F, R>(&self, f: F) -> std::result::Result<R, ApiError>
    where
        F: FnOnce(&mut DocumentStore) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|_| ApiError::internal("document store lock poisoned"))?;
            f(&mut guard).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))?
    }
}

/// Build the application router.
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:4200"),
                HeaderValue::from_static("http://localhost:5000"),
                HeaderValue::from_static("http://127.0.0.1:4200"),
                HeaderValue::from_static("http://127.0.0.1:5000"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::backlog_items::router())
        .merge(routes::users::router())
        .merge(routes::custom_fields::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server(store: DocumentStore, settings: &Settings) -> Result<()> {
    let app = build_router(AppState::new(store, settings), settings.cors_permissive);
    serve(app, settings.bind).await
}

async fn serve(app: Router, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
