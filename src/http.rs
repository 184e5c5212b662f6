use axum::routing::get;
use axum::Router;

async fn health() -> &'static str {
    "ok"
}

/// Liveness surface only: a constant response proving the process is up.
/// Deliberately knows nothing about the broker or the store; unmatched paths
/// get axum's default 404.
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}
