mod app;
mod cli;
mod config;
mod effects;
mod input;
mod logging;
mod render;

use clap::Parser;
use engine_logging::engine_info;

use cli::{Cli, Command};
use config::ClientConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Watch);
    logging::initialize(&cli.global, &command);

    let config = ClientConfig::resolve(&cli.global);
    engine_info!(
        "backend {} polled every {:?}",
        config.base_url,
        config.poll_interval()
    );
    app::run(command, &config)
}
