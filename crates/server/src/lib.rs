//! The MathBot relay endpoint.
//!
//! One route, `POST /api/chat`, forwards a chat history to the model and
//! answers with a provider-shaped envelope. The server holds no state
//! between calls besides its configuration.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{create_router, serve};
pub use state::AppState;
