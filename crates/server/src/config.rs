//! Server configuration read from the process environment.

use std::env;

use mathbot_mistral_model::{MistralConfig, MistralConfigBuilder};

/// Default address the server listens on.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

/// Runtime configuration of the relay server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    listen: String,
    mistral: Option<MistralConfig>,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    ///
    /// A missing or blank `MISTRAL_API_KEY` is not an error here: the
    /// server still starts, and every relay call fails until it is set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mistral = var("MISTRAL_API_KEY").map(|api_key| {
            let mut builder = MistralConfigBuilder::with_api_key(api_key);
            if let Some(model) = var("MISTRAL_MODEL") {
                builder = builder.with_model(model);
            }
            if let Some(base_url) = var("MISTRAL_BASE_URL") {
                builder = builder.with_base_url(base_url);
            }
            if let Some(temperature) = var("MISTRAL_TEMPERATURE") {
                match temperature.trim().parse::<f32>() {
                    Ok(temperature) if temperature.is_finite() => {
                        builder = builder.with_temperature(temperature);
                    }
                    _ => warn!(
                        "ignoring invalid MISTRAL_TEMPERATURE: {temperature}"
                    ),
                }
            }
            builder.build()
        });

        Self {
            listen: var("MATHBOT_LISTEN")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_owned()),
            mistral,
        }
    }

    /// Returns the address to listen on.
    #[inline]
    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Returns the upstream configuration, or `None` when no credential
    /// is configured.
    #[inline]
    pub fn mistral(&self) -> Option<&MistralConfig> {
        self.mistral.as_ref()
    }
}
