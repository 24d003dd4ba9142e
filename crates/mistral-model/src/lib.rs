//! A model provider for the Mistral chat completion API.
//!
//! The API is OpenAI-compatible, so any server speaking the same
//! `/chat/completions` dialect can be targeted with a custom base URL.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mathbot_model::{
    ErrorKind, ModelCompletion, ModelProvider, ModelProviderError,
    ModelRequest,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{MistralConfig, MistralConfigBuilder};
use proto::ChatCompletion;

/// Error type for [`MistralProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Mistral chat completion provider.
#[derive(Clone, Debug)]
pub struct MistralProvider {
    client: Client,
    config: Arc<MistralConfig>,
}

impl MistralProvider {
    /// Creates a new `MistralProvider` with the given configuration.
    #[inline]
    pub fn new(config: MistralConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &MistralConfig {
        &self.config
    }
}

impl ModelProvider for MistralProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelCompletion, Self::Error>> + Send + 'static
    {
        let mistral_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::ACCEPT, "application/json")
            .json(&mistral_req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                debug!("upstream answered with {status}");
                return Err(Error::new(
                    format!("Unexpected status: {status}"),
                    classify_status(status),
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            if !is_json_content_type(content_type) {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::MalformedResponse,
                ));
            }

            // Here we got a successful response.
            let completion = resp.json::<ChatCompletion>().await.map_err(
                |err| Error::new(format!("{err}"), ErrorKind::MalformedResponse),
            )?;
            trace!("got completion: {completion:?}");
            proto::into_model_completion(completion).ok_or_else(|| {
                Error::new(
                    "Completion has no message content",
                    ErrorKind::MalformedResponse,
                )
            })
        }
    }
}

fn classify_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::Unauthorized
        }
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::Other,
    }
}

/// A missing header is tolerated, the body decoder has the final say.
fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    content_type
        .parse()
        .map(|m: Mime| m.subtype() == mime::JSON)
        .unwrap_or(false)
}
