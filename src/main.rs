use std::process::ExitCode;

use anyhow::Context;
use rates_conformance::{Cli, ConfigManager, ConformanceSuite, Output, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init_logger(config.output.verbose, config.output.quiet);

    match run(&cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli, config: &rates_conformance::Config) -> anyhow::Result<ExitCode> {
    let suite = ConformanceSuite::new(config).context("failed to set up the suite")?;
    let output = Output::new(config.output.format, config.output.verbosity());

    if cli.list {
        print!("{}", output.format_catalogue(&suite.select(&cli.checks)));
        return Ok(ExitCode::SUCCESS);
    }

    let report = suite.run(&cli.checks).await;
    println!("{}", output.format_report(&report));

    Ok(ExitCode::from(report.exit_code()))
}
