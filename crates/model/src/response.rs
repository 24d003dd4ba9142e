use serde::{Deserialize, Serialize};

/// A completely received answer from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelCompletion {
    /// The provider-assigned identifier of the completion, if any.
    pub id: Option<String>,
    /// The generated text. Providers must report a missing text as an
    /// error of kind [`crate::ErrorKind::MalformedResponse`] instead of
    /// returning an empty completion.
    pub content: String,
    /// The finish reason as reported by the provider (e.g. `"stop"`).
    pub finish_reason: Option<String>,
}
