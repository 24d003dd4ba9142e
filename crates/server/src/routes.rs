//! Router setup and the server loop.

use std::io;

use axum::Router;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Path of the relay endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Creates the router serving the relay endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            CHAT_PATH,
            post(handlers::chat).fallback(handlers::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the relay endpoint on `listener` until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on http://{addr}{CHAT_PATH}");
    }
    axum::serve(listener, create_router(state)).await
}
