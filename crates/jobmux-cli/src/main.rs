//! The `jobmux` binary: runs a batch of compiler jobs in parallel and multiplexes their
//! diagnostics into one ordered report on stderr.

mod settings;

use jobmux_compiler::ProcessCompiler;
use jobmux_orchestrator::{Orchestrator, RunConfiguration, RunOutcome};
use settings::{LogFormat, Settings};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let config = match RunConfiguration::from_args(args) {
        Ok(config) => config,
        Err(invalid) => {
            eprint!("{invalid}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let settings = Settings::load()?;
    init_logging(settings.logging.format);

    let compiler = ProcessCompiler::new(&settings.compiler.command)?;
    let mut orchestrator = Orchestrator::new(compiler);
    let outcome = orchestrator.run(&config, std::io::stderr()).await;

    if let RunOutcome::Aborted(e) = &outcome {
        error!(error = %e, "Run aborted");
    }
    Ok(ExitCode::from(exit_status(&outcome, settings.run.strict_exit)))
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// A completed drain succeeds unless `strict` is set and some job failed.
fn exit_status(outcome: &RunOutcome, strict: bool) -> u8 {
    match outcome {
        RunOutcome::Completed(summary) if strict && summary.any_job_failed() => 1,
        RunOutcome::Completed(_) => 0,
        RunOutcome::Aborted(_) => 1,
    }
}
