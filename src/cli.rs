/// CLI interface and shell.

/// Shell line parsing.
pub mod command;

/// Common functions for CLI.
pub mod common;

/// Tab completion for the shell.
pub mod completion;

/// Interactive shell and command dispatch.
pub mod shell;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prudentia")]
#[command(about = "📦 Provisioning shell - register boxes and run Ansible playbooks on them")]
pub struct Cli {
    /// Config file, defaults to ~/.prudentia/config.toml
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding boxes and history, overrides the config
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🐚 Start the interactive shell (default)
    Shell,
    /// ▶️  Run shell lines and exit, stopping at the first failure
    Run {
        /// Shell lines, e.g. "provision web" "facts web ansible_os_family"
        #[arg(required = true, num_args = 1..)]
        lines: Vec<String>,
    },
}
