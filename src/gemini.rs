use reqwest::blocking::{Client, RequestBuilder};

use crate::api::{Check, MODELS_PATH};
use crate::config::SmokeConfig;

/// Lists models through the Gemini-style `v1beta` surface.
pub struct ModelListCheck {
    pub url: String,
    pub api_key: String,
}

impl ModelListCheck {
    pub fn new(config: &SmokeConfig) -> Self {
        Self {
            url: config.url_for(MODELS_PATH),
            api_key: config.api_key.clone(),
        }
    }
}

impl Check for ModelListCheck {
    fn subject(&self) -> &'static str {
        "Gemini API"
    }

    fn label(&self) -> &'static str {
        "Gemini API Test"
    }

    fn build_request(&self, client: &Client) -> RequestBuilder {
        client.get(&self.url).bearer_auth(&self.api_key)
    }
}
