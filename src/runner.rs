use std::io::{self, Write};

use reqwest::blocking::Client;

use crate::api::Check;
use crate::config::SmokeConfig;
use crate::gemini::ModelListCheck;
use crate::health::HealthCheck;
use crate::network::{self, CheckError, CheckSuccess};
use crate::openai::ChatCompletionCheck;

pub const START_BANNER: &str = "Starting API endpoint tests...";
pub const FINISH_BANNER: &str = "All tests finished.";
const SEPARATOR_WIDTH: usize = 30;

#[derive(Debug)]
pub struct CheckReport {
    pub label: &'static str,
    pub outcome: Result<CheckSuccess, CheckError>,
}

impl CheckReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Health, chat completion, then model listing. Always in that order.
pub fn default_checks(config: &SmokeConfig) -> Vec<Box<dyn Check>> {
    vec![
        Box::new(HealthCheck::new(config)),
        Box::new(ChatCompletionCheck::new(config)),
        Box::new(ModelListCheck::new(config)),
    ]
}

pub struct Runner {
    client: Client,
    checks: Vec<Box<dyn Check>>,
}

impl Runner {
    pub fn new(config: &SmokeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_checks(
            network::build_client(config)?,
            default_checks(config),
        ))
    }

    pub fn with_checks(client: Client, checks: Vec<Box<dyn Check>>) -> Self {
        Self { client, checks }
    }

    pub fn checks(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.iter().map(|check| &**check)
    }

    /// Run every check and write a human-readable report to `out`.
    ///
    /// Check failures never stop the run; they are written to `out` and
    /// returned in the reports. Only a failed write is an error.
    pub fn run<W: Write>(&self, out: &mut W) -> io::Result<Vec<CheckReport>> {
        writeln!(out, "{}", START_BANNER)?;

        let mut reports = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            writeln!(out, "--- Testing {} ---", check.subject())?;

            let outcome = check.run(&self.client);
            if let Err(err) = &outcome {
                tracing::warn!(check = check.label(), error = %err, "check failed");
            }

            write_outcome(out, &**check, &outcome)?;
            write_separator(out)?;

            reports.push(CheckReport {
                label: check.label(),
                outcome,
            });
        }

        writeln!(out, "{}", FINISH_BANNER)?;
        out.flush()?;

        Ok(reports)
    }
}

fn write_outcome<W: Write>(
    out: &mut W,
    check: &dyn Check,
    outcome: &Result<CheckSuccess, CheckError>,
) -> io::Result<()> {
    match outcome {
        Ok(success) => {
            writeln!(
                out,
                "{} successful: Status Code {}",
                check.label(),
                success.status
            )?;
            writeln!(out, "Response: {}", success.body)
        }
        Err(err) => {
            writeln!(out, "{} failed: {}", check.label(), err.describe())?;
            match err.response_text() {
                Some(text) if check.echo_response_text() => {
                    writeln!(out, "Response content: {}", text)
                }
                _ => Ok(()),
            }
        }
    }
}

fn write_separator<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    struct Fixed {
        echo: bool,
    }

    impl Check for Fixed {
        fn subject(&self) -> &'static str {
            "Fixed"
        }

        fn label(&self) -> &'static str {
            "Fixed Test"
        }

        fn build_request(&self, client: &Client) -> reqwest::blocking::RequestBuilder {
            client.get("http://127.0.0.1:9/unused")
        }

        fn echo_response_text(&self) -> bool {
            self.echo
        }
    }

    fn render(check: &dyn Check, outcome: &Result<CheckSuccess, CheckError>) -> String {
        let mut out = Vec::new();
        write_outcome(&mut out, check, outcome).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn status_error(body: &str) -> CheckError {
        CheckError::Status {
            status: StatusCode::BAD_GATEWAY,
            url: "http://localhost:8888/v1/chat/completions".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn success_prints_status_and_compact_json() {
        let outcome = Ok(CheckSuccess {
            status: 200,
            body: serde_json::json!({ "status": "ok" }),
        });

        assert_eq!(
            render(&Fixed { echo: false }, &outcome),
            "Fixed Test successful: Status Code 200\nResponse: {\"status\":\"ok\"}\n"
        );
    }

    #[test]
    fn failure_echoes_body_only_when_check_asks() {
        let outcome = Err(status_error("upstream exploded"));

        let echoed = render(&Fixed { echo: true }, &outcome);
        assert!(echoed.starts_with(
            "Fixed Test failed: 502 Server Error: Bad Gateway for url: http://localhost:8888/v1/chat/completions\n"
        ));
        assert!(echoed.ends_with("Response content: upstream exploded\n"));

        let quiet = render(&Fixed { echo: false }, &outcome);
        assert!(!quiet.contains("upstream exploded"));
    }

    #[test]
    fn separator_is_thirty_equals_between_blank_lines() {
        let mut out = Vec::new();
        write_separator(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("\n{}\n\n", "=".repeat(30)));
    }

    #[test]
    fn default_checks_are_health_chat_models() {
        let labels: Vec<_> = default_checks(&SmokeConfig::default())
            .iter()
            .map(|check| check.label())
            .collect();

        assert_eq!(labels, ["Health Check", "OpenAI API Test", "Gemini API Test"]);
    }
}
