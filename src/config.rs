/// Configuration serialization and deserialization.
use std::{
    fs::{self},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::expand_home;

pub const DEFAULT_PLAYBOOK_BIN: &str = "ansible-playbook";
pub const DEFAULT_FORKS: u32 = 5;
pub const DEFAULT_BECOME_METHOD: &str = "sudo";
pub const DEFAULT_BECOME_USER: &str = "root";
pub const MAX_VERBOSITY: u8 = 4;

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub ansible: AnsibleConfig,
}

impl Config {
    /// Load config from a TOML file, a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("Config '{}' not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))?;

        if config.shell.verbosity > MAX_VERBOSITY {
            return Err(anyhow!(
                "Invalid config '{}': shell.verbosity must be between 0 and {}, got {}",
                path.display(),
                MAX_VERBOSITY,
                config.shell.verbosity
            ));
        }

        Ok(config)
    }

    /// Default config location: ~/.prudentia/config.toml
    pub fn default_path() -> PathBuf {
        default_data_dir().join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        match self.shell.data_dir {
            Some(ref dir) => expand_home(dir),
            None => default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".prudentia")
}

// config like:
// [shell]
// data_dir = "~/.prudentia"
// verbosity = 1
// history = true
// max_retry = 2
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShellConfig {
    pub data_dir: Option<String>,
    #[serde(default)]
    pub verbosity: u8,
    #[serde(default = "default_true")]
    pub history: bool,
    #[serde(default)]
    pub max_retry: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            verbosity: 0,
            history: true,
            max_retry: 0,
        }
    }
}

// config like:
// [ansible]
// playbook_bin = "/usr/local/bin/ansible-playbook"
// forks = 10
// private_key_file = "~/.ssh/id_ed25519"
// become = true
// vault_identity_list = ["dev@~/.vault/dev"]
// vault_password_files = ["~/.vault/default"]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AnsibleConfig {
    pub playbook_bin: String,
    pub forks: u32,
    pub private_key_file: Option<String>,
    pub ssh_common_args: String,
    pub ssh_extra_args: String,
    pub sftp_extra_args: Option<String>,
    pub scp_extra_args: Option<String>,
    pub r#become: bool,
    pub become_method: String,
    pub become_user: String,
    pub module_path: Option<String>,
    pub check: bool,
    pub diff: bool,
    pub vault_identity_list: Vec<String>,
    pub vault_password_files: Vec<String>,
    pub vault_id_match: bool,
}

impl Default for AnsibleConfig {
    fn default() -> Self {
        Self {
            playbook_bin: DEFAULT_PLAYBOOK_BIN.to_string(),
            forks: DEFAULT_FORKS,
            private_key_file: None,
            ssh_common_args: String::new(),
            ssh_extra_args: String::new(),
            sftp_extra_args: None,
            scp_extra_args: None,
            r#become: false,
            become_method: DEFAULT_BECOME_METHOD.to_string(),
            become_user: DEFAULT_BECOME_USER.to_string(),
            module_path: None,
            check: false,
            diff: false,
            vault_identity_list: vec![],
            vault_password_files: vec![],
            vault_id_match: false,
        }
    }
}

fn default_true() -> bool {
    true
}
