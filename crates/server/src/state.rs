//! Application state shared across request handlers.

use mathbot_core::Relay;
use mathbot_mistral_model::MistralProvider;

use crate::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The relay to the model, `None` when no credential is configured.
    pub relay: Option<Relay>,
}

impl AppState {
    /// Creates a state around an already built relay.
    #[inline]
    pub fn new(relay: Option<Relay>) -> Self {
        Self { relay }
    }

    /// Creates a state relaying to Mistral as configured.
    pub fn from_config(config: &ServerConfig) -> Self {
        let relay = match config.mistral() {
            Some(mistral) => {
                info!(
                    "relaying to {} at {}",
                    mistral.model(),
                    mistral.base_url()
                );
                Some(Relay::new(MistralProvider::new(mistral.clone())))
            }
            None => {
                warn!(
                    "MISTRAL_API_KEY is not set, every relay call will fail"
                );
                None
            }
        };
        Self { relay }
    }
}
