use std::{
    fmt,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use tokio::process::Command;

use super::{options::PlaybookOptions, play::Play};
use crate::utils::format_minutes;

/// A run cut short by Ctrl-C. Never worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interrupted by user")
    }
}

impl std::error::Error for Interrupted {}

/// Spawns the playbook entry point with inherited stdio.
#[derive(Debug, Clone)]
pub struct PlaybookRunner {
    program: String,
}

impl PlaybookRunner {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Locate the program, on PATH unless it is already a path.
    pub fn resolve(&self) -> Result<PathBuf> {
        which::which(&self.program).with_context(|| {
            format!(
                "'{}' not found, install Ansible or set ansible.playbook_bin",
                self.program
            )
        })
    }

    pub fn build_args(
        playbook: &Path,
        inventory: &Path,
        options: &PlaybookOptions,
        extra_vars: Option<&Path>,
    ) -> Vec<String> {
        let mut args = vec![
            "--inventory".to_string(),
            inventory.display().to_string(),
        ];
        args.extend(options.to_args());
        if let Some(extra_vars) = extra_vars {
            args.push("--extra-vars".to_string());
            args.push(format!("@{}", extra_vars.display()));
        }
        args.push(playbook.display().to_string());
        args
    }

    /// Run a playbook, true when every host succeeded.
    pub async fn run_playbook(
        &self,
        playbook: &Path,
        inventory: &Path,
        options: &PlaybookOptions,
        extra_vars: Option<&Path>,
    ) -> Result<bool> {
        let args = Self::build_args(playbook, inventory, options, extra_vars);

        let start = Instant::now();
        let success = self.spawn(&args, &options.env()).await?;
        println!(
            "Play run took {} minutes\n",
            format_minutes(start.elapsed())
        );

        Ok(success)
    }

    /// Run an ad-hoc play with terse output. Failures are logged and reported as false.
    pub async fn run_play(
        &self,
        play: &Play,
        inventory: &Path,
        options: &PlaybookOptions,
        extra_vars: Option<&Path>,
    ) -> bool {
        let result: Result<bool> = async {
            let play_file = play.write_temp()?;
            let args = Self::build_args(play_file.path(), inventory, options, extra_vars);

            let mut env = options.env();
            env.push(("ANSIBLE_STDOUT_CALLBACK".to_string(), "minimal".to_string()));

            self.spawn(&args, &env).await
        }
        .await;

        match result {
            Ok(success) => success,
            Err(e) => {
                log::error!("cannot run play: {:#}", e);
                false
            }
        }
    }

    async fn spawn(&self, args: &[String], env: &[(String, String)]) -> Result<bool> {
        let program = self.resolve()?;
        log::debug!("Running {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .spawn()
            .with_context(|| format!("Failed to run '{}'", program.display()))?;

        // The child shares the terminal's process group and gets the same SIGINT,
        // the shell only waits for it to wind down.
        let finished = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::signal::ctrl_c() => None,
        };
        let status = match finished {
            Some(status) => status,
            None => {
                let status = child.wait().await;
                log::warn!("'{}' interrupted ({:?})", self.program, status);
                return Err(Interrupted.into());
            }
        }
        .with_context(|| format!("Failed to wait for '{}'", program.display()))?;

        if !status.success() {
            log::info!("'{}' exited with {}", self.program, status);
        }

        Ok(status.success())
    }
}
