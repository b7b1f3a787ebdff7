use clap::Parser;
use sitebackup_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, logging to stderr: {:#}", e);
    }

    // Secrets leave the environment while this is still the only thread.
    let cli = Cli::parse();
    cli::scrub_secret_env();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start runtime: {}", e);
            eprintln!("sitebackup error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(cli.run()) {
        tracing::error!("backup failed: {:#}", err);
        eprintln!("sitebackup error: {:#}", err);
        std::process::exit(1);
    }
}
