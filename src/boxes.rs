/// Box records, the named provisioning targets.
use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REMOTE_USER: &str = "root";

/// Connection plugin the engine uses to reach a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Paramiko,
    Local,
    Docker,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Ssh => "ssh",
            Transport::Paramiko => "paramiko",
            Transport::Local => "local",
            Transport::Docker => "docker",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ssh" | "smart" => Ok(Transport::Ssh),
            "paramiko" => Ok(Transport::Paramiko),
            "local" => Ok(Transport::Local),
            "docker" => Ok(Transport::Docker),
            other => Err(anyhow!(
                "Unknown transport '{}' (expected ssh, paramiko, local or docker)",
                other
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BoxConfig {
    pub name: String,
    pub playbook: String,
    pub hostname: String,
    /// Address of the host, or a path to an existing inventory file.
    pub ip: String,
    pub port: Option<u16>,
    pub remote_user: String,
    pub remote_pwd: Option<String>,
    #[serde(default)]
    pub transport: Transport,
}

impl BoxConfig {
    pub fn new(name: &str, playbook: &str, hostname: &str, ip: &str) -> Self {
        Self {
            name: name.to_string(),
            playbook: playbook.to_string(),
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            port: None,
            remote_user: DEFAULT_REMOTE_USER.to_string(),
            remote_pwd: None,
            transport: Transport::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("Box name cannot be empty"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(anyhow!("Box name '{}' cannot contain spaces", self.name));
        }
        if self.playbook.trim().is_empty() {
            return Err(anyhow!("Box '{}' has no playbook", self.name));
        }
        if self.hostname.trim().is_empty() {
            return Err(anyhow!("Box '{}' has no hostname", self.name));
        }
        if self.ip.trim().is_empty() {
            return Err(anyhow!("Box '{}' has no ip", self.name));
        }
        if self.remote_user.trim().is_empty() {
            return Err(anyhow!("Box '{}' has no remote user", self.name));
        }
        Ok(())
    }

    /// True when `ip` points at an inventory file instead of an address.
    pub fn uses_inventory_file(&self) -> bool {
        self.ip.starts_with("./") || self.ip.starts_with('/')
    }

    /// INI inventory with the box as a single-host group.
    pub fn inventory(&self) -> String {
        let mut host_line = format!("{} ansible_host={}", self.hostname, self.ip);
        if let Some(port) = self.port {
            host_line.push_str(&format!(" ansible_port={}", port));
        }
        host_line.push_str(&format!(
            " ansible_user={} ansible_connection={}",
            self.remote_user, self.transport
        ));

        format!("[{}]\n{}\n", self.name, host_line)
    }
}

impl fmt::Display for BoxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.remote_user, self.hostname)?;
        if !self.uses_inventory_file() {
            write!(f, " ({}", self.ip)?;
            if let Some(port) = self.port {
                write!(f, ":{}", port)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
