use clap::Parser;
use maverick::cli::{self, output, Cli};
use maverick::config::AppConfig;
use std::process::ExitCode;
use tracing::error;

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple, open_store};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            output::print_error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load_from(&cli.config_dir)?;
    if let Some(url) = &cli.database {
        config.database.url = url.clone();
    }
    if let Err(errors) = config.validate() {
        anyhow::bail!("invalid configuration: {}", errors.join("; "));
    }

    let mode = output::OutputMode::from_json_flag(cli.json);

    if !cli.command.uses_database() {
        init_logging_simple();
        return cli::run_offline(&cli.command, &config, mode);
    }

    init_logging(&config.logging);
    cli::ensure_database_dir(&config.database.url)?;
    let store = open_store(&config).await?;
    cli::run(cli.command, &store, &config, mode).await
}
