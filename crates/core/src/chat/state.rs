use super::message::{APOLOGY, ChatMessage, GREETING};
use super::transport::TransportError;
use crate::StructuredReply;
use crate::relay::{RelayMessage, RelayRequest, RelayResponse, Role};

/// Where the session is in the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnStage {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A relay call is in flight; submissions are ignored.
    AwaitingReply,
}

/// The whole client-side state of one chat session.
///
/// This type only records what happened. Issuing the relay call and
/// driving the speech capability is the job of
/// [`ChatSession`](super::ChatSession).
#[derive(Clone, Debug)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
    input: String,
    stage: TurnStage,
    next_id: u64,
    explanation: Option<String>,
    carried_note: Option<String>,
    listening: bool,
    speaking: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    /// Creates a state whose log holds the greeting only.
    pub fn new() -> Self {
        let mut state = Self {
            messages: vec![],
            input: String::new(),
            stage: TurnStage::Idle,
            next_id: 0,
            explanation: None,
            carried_note: None,
            listening: false,
            speaking: false,
        };
        state.push(Role::Assistant, GREETING.to_owned(), String::new(), true);
        state
    }

    /// Sets a note from a previous phase, sent along with every turn.
    #[inline]
    pub fn with_carried_note<S: Into<String>>(mut self, note: S) -> Self {
        self.carried_note = Some(note.into());
        self
    }

    /// Replaces the text of the input box.
    #[inline]
    pub fn set_input<S: Into<String>>(&mut self, input: S) {
        self.input = input.into();
    }

    /// Starts a turn with the current input.
    ///
    /// Returns the relay request to send, or `None` when the submission
    /// is ignored: the input is blank, or a reply is still awaited. An
    /// ignored submission leaves the input untouched.
    pub fn begin_turn(&mut self) -> Option<RelayRequest> {
        if self.stage != TurnStage::Idle {
            debug!("a reply is still awaited, submission ignored");
            return None;
        }
        if self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.push(Role::User, text, String::new(), false);
        self.stage = TurnStage::AwaitingReply;

        let request = RelayRequest::new(self.history());
        Some(match &self.carried_note {
            Some(note) => request.with_carried_note(note.clone()),
            None => request,
        })
    }

    /// Ends the current turn with the outcome of the relay call, and
    /// returns the appended assistant message.
    pub fn finish_turn(
        &mut self,
        outcome: Result<RelayResponse, TransportError>,
    ) -> &ChatMessage {
        if self.stage != TurnStage::AwaitingReply {
            warn!("got a relay outcome while no reply was awaited");
        }
        self.stage = TurnStage::Idle;

        let reply = match outcome {
            Ok(RelayResponse::Success(success)) => success.reply(),
            Ok(RelayResponse::Failure(failure)) => {
                warn!("relay answered with an error: {}", failure.error);
                None
            }
            Err(err) => {
                warn!("relay is unreachable: {err}");
                None
            }
        };

        match reply.and_then(displayable) {
            Some((text, detail)) => {
                self.push(Role::Assistant, text, detail, false)
            }
            None => self.push(
                Role::Assistant,
                APOLOGY.to_owned(),
                String::new(),
                true,
            ),
        }
    }

    /// Opens the explanation panel on the message with the given id.
    ///
    /// Returns the revealed explanation, or `None` (and leaves the panel
    /// as it was) if the message doesn't exist or has no explanation.
    pub fn open_explanation(&mut self, message_id: &str) -> Option<&str> {
        let detail = self
            .messages
            .iter()
            .find(|msg| msg.id() == message_id && msg.has_detail())?
            .detail()
            .to_owned();
        self.explanation = Some(detail);
        self.explanation.as_deref()
    }

    /// Closes the explanation panel.
    #[inline]
    pub fn close_explanation(&mut self) {
        self.explanation = None;
    }

    /// Returns the explanation shown in the panel, if it is open.
    #[inline]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns the latest message that has an explanation to reveal.
    #[inline]
    pub fn latest_explained(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|msg| msg.has_detail())
    }

    /// Returns the chat log, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the text of the input box.
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the current turn stage.
    #[inline]
    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    /// Whether a voice capture is running.
    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Whether an explanation is being read aloud.
    #[inline]
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    #[inline]
    pub(crate) fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    #[inline]
    pub(crate) fn set_speaking(&mut self, speaking: bool) {
        self.speaking = speaking;
    }

    fn history(&self) -> Vec<RelayMessage> {
        self.messages
            .iter()
            .filter(|msg| !msg.is_local())
            .map(|msg| RelayMessage {
                role: msg.role(),
                content: msg.text().to_owned(),
            })
            .collect()
    }

    fn push(
        &mut self,
        role: Role,
        text: String,
        detail: String,
        local: bool,
    ) -> &ChatMessage {
        let id = format!("msg:{}", self.next_id);
        self.next_id += 1;
        self.messages
            .push(ChatMessage::new(id, role, text, detail, local));
        &self.messages[self.messages.len() - 1]
    }
}

/// Splits a reply into the message text and detail. A reply with a blank
/// answer shows its explanation as the text instead.
fn displayable(reply: StructuredReply) -> Option<(String, String)> {
    let detail = if reply.has_explanation() {
        reply.explanation
    } else {
        String::new()
    };
    if !reply.quick_answer.trim().is_empty() {
        return Some((reply.quick_answer, detail));
    }
    if !detail.is_empty() {
        return Some((detail, String::new()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_EXPLANATION;
    use crate::relay::{RelayFailure, RelaySuccess};

    fn success(quick_answer: &str, explanation: &str) -> RelayResponse {
        RelayResponse::Success(RelaySuccess::from_reply(
            &StructuredReply {
                quick_answer: quick_answer.to_owned(),
                explanation: explanation.to_owned(),
            },
            Some("stop".to_owned()),
        ))
    }

    #[test]
    fn test_greeting() {
        let state = ChatState::new();
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].text(), GREETING);
        assert!(state.messages()[0].is_local());
        assert_eq!(state.stage(), TurnStage::Idle);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut state = ChatState::new();
        for input in ["", "   ", "\n\t"] {
            state.set_input(input);
            assert!(state.begin_turn().is_none());
            assert_eq!(state.messages().len(), 1);
            assert_eq!(state.stage(), TurnStage::Idle);
        }
    }

    #[test]
    fn test_turn() {
        let mut state = ChatState::new();
        state.set_input("8 fois 7");
        let request = state.begin_turn().unwrap();
        assert_eq!(
            request.messages,
            vec![RelayMessage {
                role: Role::User,
                content: "8 fois 7".to_owned(),
            }]
        );
        assert_eq!(request.carried_context(), None);
        assert_eq!(state.input(), "");
        assert_eq!(state.stage(), TurnStage::AwaitingReply);
        assert_eq!(state.messages()[1].role(), Role::User);

        let msg = state
            .finish_turn(Ok(success("8 × 7 = 56", "Étape 1: ...")))
            .clone();
        assert_eq!(msg.role(), Role::Assistant);
        assert_eq!(msg.text(), "8 × 7 = 56");
        assert_eq!(msg.detail(), "Étape 1: ...");
        assert_eq!(state.stage(), TurnStage::Idle);

        assert_eq!(state.open_explanation(msg.id()), Some("Étape 1: ..."));
        assert_eq!(state.explanation(), Some("Étape 1: ..."));
        state.close_explanation();
        assert_eq!(state.explanation(), None);
    }

    #[test]
    fn test_submission_while_awaiting_is_ignored() {
        let mut state = ChatState::new();
        state.set_input("2 + 2");
        assert!(state.begin_turn().is_some());

        state.set_input("3 + 3");
        assert!(state.begin_turn().is_none());
        assert_eq!(state.input(), "3 + 3");
        assert_eq!(state.messages().len(), 2);

        state.finish_turn(Ok(success("4", "")));
        let request = state.begin_turn().unwrap();
        let contents: Vec<_> =
            request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["2 + 2", "4", "3 + 3"]);
    }

    #[test]
    fn test_failures_append_apology() {
        let mut state = ChatState::new();

        state.set_input("1 + 1");
        state.begin_turn().unwrap();
        let msg = state.finish_turn(Err(TransportError::new("refused")));
        assert_eq!(msg.text(), APOLOGY);
        assert!(!msg.has_detail());

        state.set_input("1 + 2");
        state.begin_turn().unwrap();
        let msg = state.finish_turn(Ok(RelayResponse::Failure(RelayFailure {
            error: "API key is required".to_owned(),
        })));
        assert_eq!(msg.text(), APOLOGY);
        assert_eq!(state.stage(), TurnStage::Idle);

        // Apologies are not part of the history sent upstream.
        state.set_input("1 + 3");
        let request = state.begin_turn().unwrap();
        assert!(request.messages.iter().all(|m| m.role == Role::User));
        assert_eq!(request.messages.len(), 3);
    }

    #[test]
    fn test_reply_without_explanation() {
        let mut state = ChatState::new();
        state.set_input("Bonjour");
        state.begin_turn().unwrap();
        let msg = state
            .finish_turn(Ok(success("Bonjour !", NO_EXPLANATION)))
            .clone();
        assert_eq!(msg.text(), "Bonjour !");
        assert_eq!(msg.detail(), "");
        assert_eq!(state.open_explanation(msg.id()), None);
        assert_eq!(state.explanation(), None);
    }

    #[test]
    fn test_blank_answer_shows_explanation() {
        let mut state = ChatState::new();
        state.set_input("?");
        state.begin_turn().unwrap();
        let msg = state.finish_turn(Ok(success(" ", "Tout est là.")));
        assert_eq!(msg.text(), "Tout est là.");
        assert!(!msg.has_detail());

        state.set_input("??");
        state.begin_turn().unwrap();
        let msg = state.finish_turn(Ok(success("", "")));
        assert_eq!(msg.text(), APOLOGY);
    }

    #[test]
    fn test_carried_note() {
        let mut state = ChatState::new().with_carried_note("tables de 7");
        state.set_input("et 7 fois 9 ?");
        let request = state.begin_turn().unwrap();
        assert_eq!(request.carried_context(), Some("tables de 7"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut state = ChatState::new();
        for i in 0..3 {
            state.set_input(format!("{i} + {i}"));
            state.begin_turn().unwrap();
            state.finish_turn(Ok(success("ok", "")));
        }
        let mut ids: Vec<_> =
            state.messages().iter().map(|m| m.id().to_owned()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), state.messages().len());
    }
}
