//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mathbot_model::{
    ErrorKind, ModelCompletion, ModelProvider, ModelProviderError,
    ModelRequest,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    requests: Vec<ModelRequest>,
    next_id: u64,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to queue the replies, which are
/// consumed one per request in order. If there are no queued replies left,
/// an error will be returned.
///
/// Clones share the same script, so a test can keep one clone to inspect
/// the recorded requests after handing the other one to the code under
/// test.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Creates a provider that answers every request in `replies` order.
    pub fn with_replies(replies: impl IntoIterator<Item = PresetReply>) -> Self {
        let provider = Self::default();
        for reply in replies {
            provider.add_reply(reply);
        }
        provider
    }

    #[inline]
    pub fn add_reply(&self, reply: PresetReply) {
        self.script().replies.push_back(reply);
    }

    /// Delays every reply by `duration`.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, oldest first.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.script().requests.clone()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.script().requests.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the recorded requests.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelCompletion, Self::Error>> + Send + 'static
    {
        let (reply, id) = {
            let mut script = self.script();
            script.requests.push(req.clone());
            script.next_id += 1;
            (script.replies.pop_front(), script.next_id)
        };
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            match reply {
                Some(PresetReply::Text {
                    content,
                    finish_reason,
                }) => Ok(ModelCompletion {
                    id: Some(format!("test:{id}")),
                    content,
                    finish_reason,
                }),
                Some(PresetReply::Failure(failure)) => Err(Error {
                    message: "preset failure",
                    kind: failure.kind(),
                }),
                None => Err(Error {
                    message: "no enough replies",
                    kind: ErrorKind::Other,
                }),
            }
        }
    }
}
