//! The chat client: message log, turn state machine and speech toggles.
//!
//! [`ChatState`] records what happened in a session. [`ChatSession`]
//! owns a state on a background task and drives the relay transport and
//! the speech capability from the commands it receives, one at a time.

mod builder;
mod message;
mod speech;
mod state;
mod transport;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

pub use builder::ChatSessionBuilder;
pub use message::{APOLOGY, ChatMessage, GREETING};
pub use speech::{NoSpeech, OnEnd, OnTranscript, SpeechCapability, SpeechStyle};
pub use state::{ChatState, TurnStage};
pub use transport::{RelayTransport, TransportError};

use crate::relay::RelayResponse;

type MessageCallback = Box<dyn Fn(&ChatMessage) + Send + Sync>;
type IdleCallback = Box<dyn Fn() + Send + Sync>;

enum Command {
    SetInput(String),
    Submit,
    TurnFinished(Result<RelayResponse, TransportError>),
    OpenExplanation(String),
    CloseExplanation,
    ToggleCapture,
    CaptureTranscript(String),
    CaptureEnded,
    ToggleSpeech,
    SpeechEnded,
    Snapshot(oneshot::Sender<ChatState>),
}

/// A running chat session.
///
/// Methods only enqueue commands, they never block. The session task
/// stops once every handle is dropped and no relay call is in flight.
#[derive(Clone)]
pub struct ChatSession {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl ChatSession {
    /// Replaces the text of the input box.
    #[inline]
    pub fn set_input<S: Into<String>>(&self, input: S) {
        self.send(Command::SetInput(input.into()));
    }

    /// Submits the input box. Blank input and submissions made while a
    /// reply is awaited are ignored.
    #[inline]
    pub fn submit(&self) {
        self.send(Command::Submit);
    }

    /// Opens the explanation panel on a message.
    #[inline]
    pub fn open_explanation<S: Into<String>>(&self, message_id: S) {
        self.send(Command::OpenExplanation(message_id.into()));
    }

    /// Closes the explanation panel.
    #[inline]
    pub fn close_explanation(&self) {
        self.send(Command::CloseExplanation);
    }

    /// Starts a voice capture, or stops the running one.
    #[inline]
    pub fn toggle_voice_capture(&self) {
        self.send(Command::ToggleCapture);
    }

    /// Reads the open explanation aloud, or stops reading it.
    #[inline]
    pub fn toggle_speech(&self) {
        self.send(Command::ToggleSpeech);
    }

    /// Returns a copy of the state once every command sent before this
    /// call has been handled.
    pub async fn snapshot(&self) -> Option<ChatState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.ok()
    }

    #[inline]
    fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!("chat session task has stopped");
        }
    }

    fn spawn(task: SessionTask, cmd_rx: mpsc::UnboundedReceiver<Command>) {
        tokio::spawn(
            run_session(task, cmd_rx).instrument(trace_span!("chat session")),
        );
    }
}

struct SessionTask {
    state: ChatState,
    transport: Arc<dyn RelayTransport>,
    speech: Arc<dyn SpeechCapability>,
    speech_style: SpeechStyle,
    cmd_tx: mpsc::WeakUnboundedSender<Command>,
    on_message: Option<MessageCallback>,
    on_idle: Option<IdleCallback>,
}

async fn run_session(
    mut task: SessionTask,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("started");
    while let Some(cmd) = cmd_rx.recv().await {
        task.handle(cmd);
    }
    debug!("will terminate");
}

impl SessionTask {
    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SetInput(input) => self.state.set_input(input),
            Command::Submit => self.submit(),
            Command::TurnFinished(outcome) => {
                let msg = self.state.finish_turn(outcome);
                if let Some(on_message) = &self.on_message {
                    on_message(msg);
                }
                if let Some(on_idle) = &self.on_idle {
                    on_idle();
                }
            }
            Command::OpenExplanation(id) => {
                if self.state.open_explanation(&id).is_none() {
                    debug!("message {id} has no explanation to open");
                }
            }
            Command::CloseExplanation => self.state.close_explanation(),
            Command::ToggleCapture => self.toggle_capture(),
            Command::CaptureTranscript(transcript) => {
                self.state.set_input(transcript);
            }
            Command::CaptureEnded => self.state.set_listening(false),
            Command::ToggleSpeech => self.toggle_speech(),
            Command::SpeechEnded => self.state.set_speaking(false),
            Command::Snapshot(tx) => {
                tx.send(self.state.clone()).ok();
            }
        }
    }

    fn submit(&mut self) {
        let Some(request) = self.state.begin_turn() else {
            return;
        };
        if let (Some(on_message), Some(msg)) =
            (&self.on_message, self.state.messages().last())
        {
            on_message(msg);
        }

        // Holding a strong sender keeps the session alive until the turn
        // is resolved, so the state never stays stuck awaiting a reply.
        let Some(cmd_tx) = self.cmd_tx.upgrade() else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        tokio::spawn(
            async move {
                let outcome = transport.send(request).await;
                cmd_tx.send(Command::TurnFinished(outcome)).ok();
            }
            .instrument(trace_span!("relay call")),
        );
    }

    fn toggle_capture(&mut self) {
        if self.state.is_listening() {
            self.speech.stop_capture();
            self.state.set_listening(false);
            return;
        }
        if self.state.stage() != TurnStage::Idle {
            return;
        }

        let on_transcript = {
            let cmd_tx = self.cmd_tx.clone();
            Box::new(move |transcript: String| {
                if let Some(cmd_tx) = cmd_tx.upgrade() {
                    cmd_tx.send(Command::CaptureTranscript(transcript)).ok();
                }
            })
        };
        let on_end = {
            let cmd_tx = self.cmd_tx.clone();
            Box::new(move || {
                if let Some(cmd_tx) = cmd_tx.upgrade() {
                    cmd_tx.send(Command::CaptureEnded).ok();
                }
            })
        };
        let started = self.speech.start_capture(on_transcript, on_end);
        if !started {
            debug!("voice capture is unavailable");
        }
        self.state.set_listening(started);
    }

    fn toggle_speech(&mut self) {
        if self.state.is_speaking() {
            self.speech.cancel_speech();
            self.state.set_speaking(false);
            return;
        }
        let Some(text) = self.state.explanation() else {
            return;
        };

        let on_end = {
            let cmd_tx = self.cmd_tx.clone();
            Box::new(move || {
                if let Some(cmd_tx) = cmd_tx.upgrade() {
                    cmd_tx.send(Command::SpeechEnded).ok();
                }
            })
        };
        let started = self.speech.speak(text, &self.speech_style, on_end);
        if !started {
            debug!("speech synthesis is unavailable");
        }
        self.state.set_speaking(started);
    }
}
