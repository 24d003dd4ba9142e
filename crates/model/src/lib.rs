//! An abstraction layer for the hosted chat models behind the relay.
//!
//! This crate establishes the protocol that the relay uses to talk to a
//! model provider, so that the relay can switch between the hosted
//! provider and an in-process fake without touching its own code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
