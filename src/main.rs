use clap::Parser;

use endpoint_smoke::cli::Args;
use endpoint_smoke::telemetry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    telemetry::init_subscriber(&args.log_level, std::io::stderr)?;

    let config = args.into_config()?;
    tracing::debug!(base_url = %config.endpoint.origin(), model = %config.model, "starting run");

    let mut stdout = std::io::stdout().lock();
    endpoint_smoke::run(&config, &mut stdout)?;

    Ok(())
}
