use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;

use crate::api::{Check, CHAT_COMPLETIONS_PATH};
use crate::config::SmokeConfig;
use crate::types::ChatCompletionRequest;

pub struct ChatCompletionCheck {
    pub url: String,
    pub api_key: String,
    pub request: ChatCompletionRequest,
}

impl ChatCompletionCheck {
    pub fn new(config: &SmokeConfig) -> Self {
        Self {
            url: config.url_for(CHAT_COMPLETIONS_PATH),
            api_key: config.api_key.clone(),
            request: ChatCompletionRequest::new(
                config.model.clone(),
                &config.system_prompt,
                &config.user_prompt,
            ),
        }
    }
}

impl Check for ChatCompletionCheck {
    fn subject(&self) -> &'static str {
        "OpenAI API"
    }

    fn label(&self) -> &'static str {
        "OpenAI API Test"
    }

    /// POST the two-message conversation with an explicit JSON content type
    /// and bearer auth.
    fn build_request(&self, client: &Client) -> RequestBuilder {
        client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&self.request)
    }

    fn echo_response_text(&self) -> bool {
        true
    }
}
