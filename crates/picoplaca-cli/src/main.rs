mod cli;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use picoplaca_core::{Param, RestrictionConfig, RestrictionEvaluator};

use cli::Cli;

/// Exit status when the inputs or rules are rejected.
const EXIT_INVALID: u8 = 2;

/// What a run printed and whether the prediction went through.
struct Report {
    rendered: String,
    accepted: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(report) => {
            println!("{}", report.rendered);
            if report.accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INVALID)
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset or unparsable.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "picoplaca=debug,picoplaca_core=debug"
    } else {
        "picoplaca=info,picoplaca_core=info"
    }
}

/// Build the log filter. A valid `RUST_LOG` value wins over `-v`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref(), verbose);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<Report> {
    let mut config = match &cli.rules {
        Some(path) => RestrictionConfig::from_file(path)
            .with_context(|| format!("failed to load rules from {}", path.display()))?,
        None => RestrictionConfig::default(),
    };

    if let Some(timezone) = cli.timezone {
        config.timezone = timezone;
    }

    debug!(timezone = %config.timezone, rules = ?cli.rules, "rules loaded");

    let now = Utc::now().with_timezone(&config.timezone);
    let mut evaluator = RestrictionEvaluator::from_config(&config);
    evaluator.set(
        Param::Date,
        cli.date.unwrap_or_else(|| now.format("%Y/%m/%d").to_string()),
    );
    evaluator.set(
        Param::Time,
        cli.time.unwrap_or_else(|| now.format("%H:%M").to_string()),
    );
    if let Some(plate) = cli.plate {
        evaluator.set(Param::Plate, plate);
    }
    for (name, value) in cli.params {
        evaluator.set_param(&name, value);
    }

    let result = evaluator.predict();
    match &result {
        Ok(prediction) => info!(
            plate = %prediction.plate,
            restricted = prediction.restricted,
            "prediction complete"
        ),
        Err(error) => info!(error = error.code(), "prediction refused"),
    }

    Ok(Report {
        rendered: output::render(&result, cli.format)?,
        accepted: result.is_ok(),
    })
}
