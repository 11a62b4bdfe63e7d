mod cli;
mod command;
mod engine;
mod error;
mod face;
mod model;
mod orchestrator;
mod position;
mod status;
mod storage;
#[cfg(test)]
mod testing;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::Cli::parse();

    // Logs go to stderr so the console's stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // The stdin reader runs on a blocking thread that would otherwise hold
    // the runtime open on the way out, so exit explicitly either way.
    let outcome = cli::run(args).await;
    std::process::exit(cli::exit_code(outcome, &mut std::io::stderr()));
}
