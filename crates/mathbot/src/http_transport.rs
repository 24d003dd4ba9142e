use std::env;

use async_trait::async_trait;
use mathbot_core::chat::{RelayTransport, TransportError};
use mathbot_core::relay::{RelayRequest, RelayResponse};
use reqwest::{Client, header};

/// Relay endpoint used when `MATHBOT_RELAY_URL` is not set.
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000/api/chat";

/// Reaches a relay endpoint over HTTP.
#[derive(Clone, Debug)]
pub struct HttpRelayTransport {
    client: Client,
    url: String,
}

impl HttpRelayTransport {
    /// Creates a transport posting to `url`.
    #[inline]
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Creates a transport posting to `MATHBOT_RELAY_URL`, or to
    /// [`DEFAULT_RELAY_URL`] when it is not set.
    pub fn from_env() -> Self {
        let url = env::var("MATHBOT_RELAY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_owned());
        Self::new(url)
    }

    /// Returns the relay endpoint URL.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn send(
        &self,
        request: RelayRequest,
    ) -> Result<RelayResponse, TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                TransportError::new(format!("relay is unreachable: {err}"))
            })?;

        // Error envelopes come with an error status, they still decode.
        let status = resp.status();
        let response = resp.json::<RelayResponse>().await.map_err(|err| {
            TransportError::new(format!(
                "unexpected relay answer ({status}): {err}"
            ))
        })?;
        trace!("relay answered with {status}");
        Ok(response)
    }
}
