use crate::relay::Role;

/// First message of every chat log.
pub const GREETING: &str = "Bonjour ! Je suis MathBot, ton assistant en \
                            mathématiques. Comment puis-je t'aider \
                            aujourd'hui ?";

/// Shown in place of an answer when a relay call fails.
pub const APOLOGY: &str =
    "Désolé, j'ai rencontré une erreur. Peux-tu réessayer ?";

/// A message of the chat log. Messages never change once appended.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatMessage {
    id: String,
    role: Role,
    text: String,
    detail: String,
    local: bool,
}

impl ChatMessage {
    #[inline]
    pub(crate) fn new(
        id: String,
        role: Role,
        text: String,
        detail: String,
        local: bool,
    ) -> Self {
        Self {
            id,
            role,
            text,
            detail,
            local,
        }
    }

    /// Returns the opaque identifier of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns who wrote this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the displayed text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the detailed explanation, empty when there is none.
    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Whether the message has an explanation to reveal.
    #[inline]
    pub fn has_detail(&self) -> bool {
        !self.detail.is_empty()
    }

    /// Local messages (the greeting, apologies) are displayed but never
    /// sent upstream as history.
    #[inline]
    pub fn is_local(&self) -> bool {
        self.local
    }
}
