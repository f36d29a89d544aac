use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use rustyline::{error::ReadlineError, history::DefaultHistory, Editor};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::{Handle, RuntimeFlavor},
};

use crate::{
    cli::{
        command::{parse_line, ShellCommand},
        common,
        completion::ShellHelper,
    },
    provider::LocalProvider,
    utils::{expand_home, truncate_error_message},
};

const PROMPT: &str = "(Prudentia > Local) ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    provider: LocalProvider,
    history: Option<PathBuf>,
}

impl Shell {
    pub fn new(provider: LocalProvider, history: Option<PathBuf>) -> Self {
        Self { provider, history }
    }

    pub fn provider(&self) -> &LocalProvider {
        &self.provider
    }

    /// Read lines until exit: with line editing on a terminal, plain lines otherwise.
    pub async fn run(&mut self) -> Result<()> {
        if std::io::stdin().is_terminal() {
            self.run_interactive().await
        } else {
            self.run_piped().await
        }
    }

    /// Execute `lines` in order, stopping at the first failing one.
    pub async fn run_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            match self
                .handle_line(line)
                .await
                .with_context(|| format!("'{}' failed", line))?
            {
                Flow::Exit => break,
                Flow::Continue => {}
            }
        }
        Ok(())
    }

    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ShellHelper::new(self.provider.box_names())));

        if let Some(ref path) = self.history {
            let _ = rl.load_history(path);
        }

        println!("📦 Prudentia shell, type 'help' for the command list");

        loop {
            if let Some(helper) = rl.helper_mut() {
                helper.set_box_names(self.provider.box_names());
            }

            match blocking(|| rl.readline(PROMPT)) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    match self.handle_line(&line).await {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => print_error(&e),
                    }
                }
                // Ctrl-C drops the current line
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(ref path) = self.history {
            if let Err(e) = save_history(&mut rl, path) {
                log::warn!("History not saved: {:#}", e);
            }
        }

        Ok(())
    }

    pub async fn run_piped(&mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break, // EOF
                Ok(_) => match self.handle_line(&line).await {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => print_error(&e),
                },
                Err(e) => {
                    println!("Input error: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        match parse_line(line)? {
            Some(command) => self.execute(command).await,
            None => Ok(Flow::Continue),
        }
    }

    pub async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Help => common::print_help(),
            ShellCommand::List => common::list_boxes(self.provider.store().boxes()),
            ShellCommand::Exit => return Ok(Flow::Exit),
            ShellCommand::Register(b) => {
                let name = b.name.clone();
                match self.provider.register(b)? {
                    Some(_) => println!("✅ Box '{}' updated", name),
                    None => println!("✅ Box '{}' registered", name),
                }
            }
            ShellCommand::Unregister(name) => {
                self.provider.unregister(&name)?;
                println!("✅ Box '{}' unregistered", name);
            }
            ShellCommand::Password(name) => {
                self.provider.store().require(&name)?;
                let prompt = format!("🔐 SSH password for '{}' (empty for key auth): ", name);
                let password = blocking(|| rpassword::prompt_password(prompt))
                    .context("Failed to read password")?;
                self.provider.set_password(&name, Some(password))?;
                println!("✅ Password of '{}' updated", name);
            }
            ShellCommand::Provision { name, tags } => {
                self.provider.provision(&name, &tags).await?;
                println!("✅ {} - Provisioned", name);
            }
            ShellCommand::Tags(name) => {
                let tags = self.provider.playbook_tags(&name)?;
                common::list_tags(&name, &tags);
            }
            ShellCommand::Facts { name, filter } => {
                if !self.provider.facts(&name, &filter).await? {
                    return Err(anyhow!("Gathering facts of '{}' failed", name));
                }
            }
            ShellCommand::CreateUser(name) => {
                if !self.provider.create_user(&name).await? {
                    return Err(anyhow!("Creating user on '{}' failed", name));
                }
                println!("✅ {} - User created", name);
            }
            ShellCommand::Set { name, value } => {
                log::debug!("Setting extra var '{}'", name);
                self.provider.extra_vars_mut().set(&name, &value);
            }
            ShellCommand::Unset(name) => {
                if self.provider.extra_vars_mut().unset(&name).is_none() {
                    println!("📝 Variable '{}' was not set", name);
                }
            }
            ShellCommand::Vars(None) => common::list_vars(self.provider.extra_vars()),
            ShellCommand::Vars(Some(file)) => {
                let loaded = self
                    .provider
                    .extra_vars_mut()
                    .load_file(expand_home(&file))?;
                println!("✅ Loaded {} variables from '{}'", loaded, file);
            }
            ShellCommand::Verbose(None) => {
                println!("Verbosity is {}", self.provider.verbosity())
            }
            ShellCommand::Verbose(Some(level)) => {
                self.provider.set_verbosity(level)?;
                println!("Verbosity set to {}", level);
            }
        }

        Ok(Flow::Continue)
    }
}

/// Run a terminal read from async code. On a multi-thread runtime the worker
/// hands its other tasks off while blocked.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn save_history(rl: &mut Editor<ShellHelper, DefaultHistory>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    rl.save_history(path)?;
    Ok(())
}

fn print_error(e: &anyhow::Error) {
    println!("❌ {}", truncate_error_message(&format!("{:#}", e), 5));
}
