use reqwest::blocking::{Client, RequestBuilder};

use crate::network::{self, CheckError, CheckSuccess};

pub const HEALTH_PATH: &str = "/health";
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const MODELS_PATH: &str = "/v1beta/models";

pub trait Check {
    /// Shown in the heading, as in `--- Testing <subject> ---`.
    fn subject(&self) -> &'static str;

    /// Prefix of the success and failure lines.
    fn label(&self) -> &'static str;

    fn build_request(&self, client: &Client) -> RequestBuilder;

    /// Whether a failure report should also print the raw response body.
    fn echo_response_text(&self) -> bool {
        false
    }

    fn run(&self, client: &Client) -> Result<CheckSuccess, CheckError> {
        network::execute(self.build_request(client))
    }
}
