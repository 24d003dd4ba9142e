use std::sync::Arc;

use tokio::sync::mpsc;

use super::speech::{NoSpeech, SpeechCapability, SpeechStyle};
use super::state::ChatState;
use super::transport::RelayTransport;
use super::{ChatMessage, ChatSession, IdleCallback, MessageCallback, SessionTask};

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    transport: Arc<dyn RelayTransport>,
    speech: Arc<dyn SpeechCapability>,
    speech_style: SpeechStyle,
    carried_note: Option<String>,
    on_message: Option<MessageCallback>,
    on_idle: Option<IdleCallback>,
}

impl ChatSessionBuilder {
    /// Creates a new builder that reaches the relay through `transport`.
    #[inline]
    pub fn with_transport<T: RelayTransport>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            speech: Arc::new(NoSpeech),
            speech_style: SpeechStyle::default(),
            carried_note: None,
            on_message: None,
            on_idle: None,
        }
    }

    /// Sets the speech capability of the host. Without one, voice capture
    /// and playback do nothing.
    #[inline]
    pub fn with_speech<S: SpeechCapability>(mut self, speech: S) -> Self {
        self.speech = Arc::new(speech);
        self
    }

    /// Sets the voice used to read explanations aloud.
    #[inline]
    pub fn with_speech_style(mut self, style: SpeechStyle) -> Self {
        self.speech_style = style;
        self
    }

    /// Sets a note from a previous phase, sent along with every turn.
    #[inline]
    pub fn with_carried_note<S: Into<String>>(mut self, note: S) -> Self {
        self.carried_note = Some(note.into());
        self
    }

    /// Attaches a callback to be invoked for every message appended to
    /// the log after the greeting.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&ChatMessage) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback to be invoked when a turn is resolved.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the session and spawns its task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> ChatSession {
        let Self {
            transport,
            speech,
            speech_style,
            carried_note,
            on_message,
            on_idle,
        } = self;

        let state = match carried_note {
            Some(note) => ChatState::new().with_carried_note(note),
            None => ChatState::new(),
        };
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = SessionTask {
            state,
            transport,
            speech,
            speech_style,
            cmd_tx: cmd_tx.downgrade(),
            on_message,
            on_idle,
        };
        ChatSession::spawn(task, cmd_rx);
        ChatSession { cmd_tx }
    }
}
