mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use listing_platform::AppPaths;
use log::{error, warn};

use crate::cli::Cli;
use crate::commands::Context;
use crate::error::AppError;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<String, AppError> {
    let paths = AppPaths::new()?;
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| paths.settings_file());
    let loaded = Settings::load_from(&settings_path);
    let mut settings = loaded.as_ref().cloned().unwrap_or_default();
    settings.apply_env(|name| std::env::var(name).ok());

    logging::init_logging(
        &paths.log_file(),
        cli.verbose || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    if let Err(err) = &loaded {
        warn!("Using default settings: {err}");
    }
    if cli.command.mutates_document()
        && let Err(err) = paths.ensure_dirs()
    {
        warn!("Could not create application directories: {err}");
    }

    let context = Context {
        settings,
        settings_path,
        paths,
        document: cli.document,
    };
    commands::run(cli.command, &context).await
}
