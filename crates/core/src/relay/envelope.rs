//! Wire types exchanged between the chat client and the relay endpoint.

use serde::{Deserialize, Serialize};

use crate::StructuredReply;

/// Phase name under which a carried note is forwarded upstream.
pub const DETAILED_PHASE: &str = "detailed";

/// The author of a conversation turn.
///
/// System turns are injected by the relay only, so a client can never
/// send one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The child asking a question.
    User,
    /// The model (or the client speaking on its behalf).
    Assistant,
}

/// One turn of the history sent to the relay.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Who wrote the turn.
    pub role: Role,
    /// The turn text.
    pub content: String,
}

/// The body of a relay call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// The conversation so far, oldest first.
    pub messages: Vec<RelayMessage>,
    /// Whether a carried note from a previous phase may be used.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_consultant_mode: bool,
    /// The previous phase and its note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultant_state: Option<ConsultantState>,
}

/// State carried over from a previous interaction phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantState {
    /// The phase the client is in.
    #[serde(default)]
    pub phase: Option<String>,
    /// The summary produced by the previous phase.
    #[serde(default)]
    pub last_proposal: Option<String>,
}

impl RelayRequest {
    /// Creates a request with only a history.
    #[inline]
    pub fn new(messages: Vec<RelayMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Attaches a note that the relay forwards as extra context.
    #[inline]
    pub fn with_carried_note<S: Into<String>>(mut self, note: S) -> Self {
        self.is_consultant_mode = true;
        self.consultant_state = Some(ConsultantState {
            phase: Some(DETAILED_PHASE.to_owned()),
            last_proposal: Some(note.into()),
        });
        self
    }

    /// Returns the note to forward upstream, if this request carries a
    /// usable one.
    pub fn carried_context(&self) -> Option<&str> {
        if !self.is_consultant_mode {
            return None;
        }
        let state = self.consultant_state.as_ref()?;
        if state.phase.as_deref() != Some(DETAILED_PHASE) {
            return None;
        }
        state
            .last_proposal
            .as_deref()
            .filter(|note| !note.trim().is_empty())
    }
}

/// A successful relay answer, shaped like a provider completion.
///
/// The message content is itself a JSON string of `{quickrep,
/// explication}`, see [`StructuredReply::to_wire_content`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelaySuccess {
    /// Always exactly one choice when produced by the relay.
    pub choices: Vec<RelayChoice>,
}

/// A choice of a [`RelaySuccess`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayChoice {
    /// The assistant message.
    pub message: RelayChoiceMessage,
    /// Position of the choice, `0` for the relay.
    pub index: u32,
    /// The finish reason reported by the upstream provider.
    pub finish_reason: Option<String>,
}

/// The message of a [`RelayChoice`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayChoiceMessage {
    /// Always [`Role::Assistant`] when produced by the relay.
    pub role: Role,
    /// The encoded structured reply.
    pub content: String,
}

impl RelaySuccess {
    /// Wraps a structured reply in the envelope.
    pub fn from_reply(
        reply: &StructuredReply,
        finish_reason: Option<String>,
    ) -> Self {
        Self {
            choices: vec![RelayChoice {
                message: RelayChoiceMessage {
                    role: Role::Assistant,
                    content: reply.to_wire_content(),
                },
                index: 0,
                finish_reason,
            }],
        }
    }

    /// Decodes the reply of the first choice.
    pub fn reply(&self) -> Option<StructuredReply> {
        let choice = self.choices.first()?;
        Some(StructuredReply::from_wire_content(&choice.message.content))
    }
}

/// A failed relay call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayFailure {
    /// Human-readable reason.
    pub error: String,
}

/// Anything the relay endpoint may answer with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResponse {
    /// HTTP 200.
    Success(RelaySuccess),
    /// Any error status.
    Failure(RelayFailure),
}
