//! Core logic of MathBot: the system prompt, the reply extractor, the
//! relay between chat clients and the model, and the chat client state
//! machine.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod chat;
mod extract;
mod model_client;
pub mod prompt;
pub mod relay;

pub use chat::{ChatSession, ChatSessionBuilder};
pub use extract::{NO_EXPLANATION, StructuredReply};
pub use relay::{Relay, RelayError, RelayErrorKind};
