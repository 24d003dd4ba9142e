//! The MathBot chat client.
//!
//! The crate includes a CLI tool for chatting in the terminal. It can also
//! be used as a library to reach a relay endpoint over HTTP from other
//! hosts.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

#[cfg(feature = "cli")]
pub mod cli;
mod http_transport;

pub use http_transport::{DEFAULT_RELAY_URL, HttpRelayTransport};

/// Re-exports of [`mathbot_core`] crate.
pub mod core {
    pub use mathbot_core::*;
}
