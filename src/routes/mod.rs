pub mod bancho;
mod health;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The whole HTTP surface: the packet-exchange endpoint the game client
/// POSTs to, plus an index and a liveness probe.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(bancho::index).post(bancho::exchange))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
