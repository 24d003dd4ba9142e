use std::error::Error as StdError;
use std::fmt::{self, Display};

use async_trait::async_trait;

use crate::relay::{Relay, RelayRequest, RelayResponse};

/// Error returned when the relay could not be reached at all.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for TransportError {}

/// The way a chat session reaches the relay endpoint.
///
/// An error envelope from the relay is a successful transport call; only
/// a relay that cannot be reached (or answers garbage) is a
/// [`TransportError`].
#[async_trait]
pub trait RelayTransport: Send + Sync + 'static {
    /// Sends one relay call and waits for its answer.
    async fn send(
        &self,
        request: RelayRequest,
    ) -> Result<RelayResponse, TransportError>;
}

/// Calls the relay in-process, without HTTP in between.
#[async_trait]
impl RelayTransport for Relay {
    async fn send(
        &self,
        request: RelayRequest,
    ) -> Result<RelayResponse, TransportError> {
        Ok(match self.complete(request).await {
            Ok(success) => RelayResponse::Success(success),
            Err(err) => RelayResponse::Failure(err.to_failure()),
        })
    }
}
