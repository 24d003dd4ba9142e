use mathbot_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// How a scripted request should fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The credential was rejected.
    Unauthorized,
    /// The provider is rate limited.
    RateLimited,
    /// The provider answered without any message content.
    MissingContent,
    /// The transport failed.
    Transport,
}

impl PresetFailure {
    #[inline]
    pub(crate) fn kind(self) -> ErrorKind {
        match self {
            PresetFailure::Unauthorized => ErrorKind::Unauthorized,
            PresetFailure::RateLimited => ErrorKind::RateLimitExceeded,
            PresetFailure::MissingContent => ErrorKind::MalformedResponse,
            PresetFailure::Transport => ErrorKind::Other,
        }
    }
}

/// The preset reply for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// The model answers with this text.
    #[serde(rename = "text")]
    Text {
        /// Raw model output.
        content: String,
        /// Finish reason reported with the text.
        finish_reason: Option<String>,
    },
    /// The request fails.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

impl PresetReply {
    /// Creates a reply that finishes with `"stop"`.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        PresetReply::Text {
            content: content.into(),
            finish_reason: Some("stop".to_owned()),
        }
    }

    /// Creates a failing reply.
    #[inline]
    pub fn failure(failure: PresetFailure) -> Self {
        PresetReply::Failure(failure)
    }
}
