//! The relay between chat clients and the upstream model.
//!
//! A relay call is stateless: the prompt, the optional carried note and
//! the client history are assembled into one upstream request, the model
//! text is reshaped by [`StructuredReply::extract`], and the result is
//! wrapped in a provider-shaped envelope.

mod envelope;

use std::error::Error as StdError;
use std::fmt::{self, Display};

use mathbot_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
};

pub use envelope::*;

use crate::model_client::ModelClient;
use crate::{StructuredReply, prompt};

/// The kind of a relay failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayErrorKind {
    /// No upstream credential is configured.
    MissingCredential,
    /// The upstream call failed.
    Upstream,
    /// The upstream answered without usable message content.
    MalformedUpstream,
}

/// A relay failure, carrying a message that is safe to show to clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelayError {
    kind: RelayErrorKind,
    message: &'static str,
}

impl RelayError {
    /// The error for a relay that has no upstream credential.
    #[inline]
    pub fn missing_credential() -> Self {
        Self {
            kind: RelayErrorKind::MissingCredential,
            message: "API key is required",
        }
    }

    fn from_provider(err: &dyn ModelProviderError) -> Self {
        let (kind, message) = match err.kind() {
            ErrorKind::MalformedResponse => (
                RelayErrorKind::MalformedUpstream,
                "Invalid response from the math assistant",
            ),
            ErrorKind::Unauthorized => (
                RelayErrorKind::Upstream,
                "The math assistant rejected the server credential",
            ),
            ErrorKind::RateLimitExceeded => (
                RelayErrorKind::Upstream,
                "The math assistant is busy, please try again later",
            ),
            ErrorKind::Other => (
                RelayErrorKind::Upstream,
                "The math assistant could not be reached",
            ),
        };
        Self { kind, message }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> RelayErrorKind {
        self.kind
    }

    /// Returns the client-facing message.
    #[inline]
    pub fn message(&self) -> &str {
        self.message
    }

    /// Converts the error into its wire envelope.
    #[inline]
    pub fn to_failure(&self) -> RelayFailure {
        RelayFailure {
            error: self.message.to_owned(),
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for RelayError {}

/// Builds the upstream request for one relay call.
///
/// The result is, in order: the system prompt, the carried note (if the
/// request has a usable one), then the client history verbatim.
pub fn build_model_request(request: &RelayRequest) -> ModelRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 2);
    messages.push(ModelMessage::System(prompt::system_prompt().to_owned()));
    if let Some(note) = request.carried_context() {
        messages.push(ModelMessage::System(prompt::context_turn(note)));
    }
    messages.extend(request.messages.iter().map(|msg| match msg.role {
        Role::User => ModelMessage::User(msg.content.clone()),
        Role::Assistant => ModelMessage::Assistant(msg.content.clone()),
    }));
    ModelRequest { messages }
}

/// Relays chat turns to a model provider.
///
/// The relay keeps no state between calls, so one instance can serve any
/// number of concurrent sessions.
#[derive(Clone)]
pub struct Relay {
    model_client: ModelClient,
}

impl Relay {
    /// Creates a relay over the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
        }
    }

    /// Runs one relay call: a single upstream request, no retry.
    pub async fn complete(
        &self,
        request: RelayRequest,
    ) -> Result<RelaySuccess, RelayError> {
        let model_request = build_model_request(&request);
        debug!(
            "relaying {} history turns (carried context: {})",
            request.messages.len(),
            request.carried_context().is_some()
        );

        let completion = self
            .model_client
            .send_request(model_request)
            .await
            .map_err(|err| {
                let relay_err = RelayError::from_provider(err.as_ref());
                warn!("upstream call failed: {err} ({:?})", err.kind());
                relay_err
            })?;

        let reply = StructuredReply::extract(&completion.content);
        if !reply.has_explanation() {
            info!("model reply carried no explanation");
        }
        Ok(RelaySuccess::from_reply(&reply, completion.finish_reason))
    }
}

#[cfg(test)]
mod tests {
    use mathbot_test_model::{PresetFailure, PresetReply, TestModelProvider};

    use super::*;
    use crate::NO_EXPLANATION;

    fn history() -> Vec<RelayMessage> {
        vec![
            RelayMessage {
                role: Role::User,
                content: "2 + 2".to_owned(),
            },
            RelayMessage {
                role: Role::Assistant,
                content: "4".to_owned(),
            },
            RelayMessage {
                role: Role::User,
                content: "8 fois 7".to_owned(),
            },
        ]
    }

    #[test]
    fn test_build_model_request() {
        let model_request =
            build_model_request(&RelayRequest::new(history()));
        assert_eq!(
            model_request.messages,
            vec![
                ModelMessage::System(prompt::system_prompt().to_owned()),
                ModelMessage::User("2 + 2".to_owned()),
                ModelMessage::Assistant("4".to_owned()),
                ModelMessage::User("8 fois 7".to_owned()),
            ]
        );
    }

    #[test]
    fn test_build_model_request_with_note() {
        let request =
            RelayRequest::new(history()).with_carried_note("tables de 7");
        let model_request = build_model_request(&request);
        assert_eq!(model_request.messages.len(), 5);
        assert_eq!(
            model_request.messages[1],
            ModelMessage::System(
                "Context from previous discussion: tables de 7".to_owned()
            )
        );
        assert_eq!(
            model_request.messages[2],
            ModelMessage::User("2 + 2".to_owned())
        );
    }

    #[tokio::test]
    async fn test_empty_history_still_sends_prompt() {
        let provider = TestModelProvider::with_replies([PresetReply::text(
            "Bonjour !",
        )]);
        let observer = provider.clone();
        let relay = Relay::new(provider);

        relay.complete(RelayRequest::default()).await.unwrap();

        let requests = observer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![ModelMessage::System(prompt::system_prompt().to_owned())]
        );
    }

    #[tokio::test]
    async fn test_complete() {
        let provider = TestModelProvider::with_replies([
            PresetReply::text(
                "```json\n{\"quickrep\": \"8 × 7 = 56\", \"explication\": \"Étape 1: ...\"}\n```",
            ),
            PresetReply::text("Je pense que c'est 56."),
        ]);
        let relay = Relay::new(provider);

        let success =
            relay.complete(RelayRequest::new(history())).await.unwrap();
        assert_eq!(success.choices.len(), 1);
        assert_eq!(success.choices[0].index, 0);
        assert_eq!(success.choices[0].message.role, Role::Assistant);
        assert_eq!(success.choices[0].finish_reason.as_deref(), Some("stop"));
        let reply = success.reply().unwrap();
        assert_eq!(reply.quick_answer, "8 × 7 = 56");
        assert_eq!(reply.explanation, "Étape 1: ...");

        let success =
            relay.complete(RelayRequest::new(history())).await.unwrap();
        let reply = success.reply().unwrap();
        assert_eq!(reply.quick_answer, "Je pense que c'est 56.");
        assert_eq!(reply.explanation, NO_EXPLANATION);
    }

    #[tokio::test]
    async fn test_upstream_failures() {
        let provider = TestModelProvider::with_replies([
            PresetReply::failure(PresetFailure::MissingContent),
            PresetReply::failure(PresetFailure::RateLimited),
            PresetReply::failure(PresetFailure::Transport),
        ]);
        let observer = provider.clone();
        let relay = Relay::new(provider);

        let err = relay.complete(RelayRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), RelayErrorKind::MalformedUpstream);

        let err = relay.complete(RelayRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), RelayErrorKind::Upstream);
        assert!(err.message().contains("try again"));

        let err = relay.complete(RelayRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), RelayErrorKind::Upstream);
        assert_eq!(err.to_failure().error, err.message());

        // One upstream call per relay call, never retried.
        assert_eq!(observer.request_count(), 3);
    }
}
