mod network;

pub mod types;

pub mod api;
pub mod cli;
pub mod config;
pub mod gemini;
pub mod health;
pub mod mock;
pub mod openai;
pub mod runner;
pub mod telemetry;

use std::io::Write;

use crate::config::SmokeConfig;
use crate::runner::{CheckReport, Runner};

pub use network::{build_client, CheckError, CheckSuccess};

/// Run the health, chat completion and model listing checks against
/// `config`, writing the report to `out`.
///
/// # Errors
/// Returns an error when the HTTP client cannot be built or `out` cannot be
/// written. Failing checks are reported, never returned as errors.
pub fn run<W: Write>(
    config: &SmokeConfig,
    out: &mut W,
) -> Result<Vec<CheckReport>, Box<dyn std::error::Error>> {
    let runner = Runner::new(config)?;
    Ok(runner.run(out)?)
}
