use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{error, LevelFilter};

use prudentia::cli::shell::Shell;
use prudentia::cli::{Cli, Commands};
use prudentia::config::Config;
use prudentia::provider::LocalProvider;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // init logger
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info))
        .init();

    let config_path = cli
        .config
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let mut config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Some(data_dir) = cli.data_dir {
        config.shell.data_dir = Some(data_dir);
    }

    let provider = match LocalProvider::new(&config) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to start provider: {:#}", e);
            std::process::exit(1);
        }
    };

    let history = config
        .shell
        .history
        .then(|| config.data_dir().join("history"));
    let mut shell = Shell::new(provider, history);

    let result = match cli.command {
        None | Some(Commands::Shell) => shell.run().await,
        Some(Commands::Run { lines }) => shell.run_lines(&lines).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
