use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider rejected the credential.
    Unauthorized,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider answered, but the payload has no usable content.
    MalformedResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::MalformedResponse => write!(f, "Malformed response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
