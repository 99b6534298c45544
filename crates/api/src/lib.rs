pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use common::{Error, Result};

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    /// Number of scheduled subscriptions.
    pub subscriptions: usize,
}

impl AppState {
    pub fn new(subscriptions: usize) -> Self {
        Self {
            started_at: Utc::now(),
            subscriptions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the keep-alive server until `shutdown` flips to true.
pub async fn serve(state: AppState, port: u16, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "Keep-alive server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
        })
        .await?;
    info!("Keep-alive server stopped");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn root_reports_alive() {
        let resp = router(AppState::new(2))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"SigBot is alive!");
    }

    #[tokio::test]
    async fn healthz_reports_subscriptions() {
        let resp = router(AppState::new(2))
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["subscriptions"], 2);
        assert!(json["uptime_secs"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let resp = router(AppState::new(0))
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
