/// Vault identity resolution. Secrets are only located here, the engine decrypts.
use std::{env, fs::File, path::PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::utils::expand_home;

pub const DEFAULT_VAULT_IDENTITY: &str = "default";
/// Source the engine resolves by asking on the terminal.
pub const PROMPT_SOURCE: &str = "prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSecret {
    pub id: String,
    pub source: PathBuf,
}

impl VaultSecret {
    /// `id@source`, the form accepted by `--vault-id`.
    pub fn slug(&self) -> String {
        format!("{}@{}", self.id, self.source.display())
    }
}

/// Identity used for password files given without a label.
pub fn default_identity() -> String {
    env::var("ANSIBLE_VAULT_IDENTITY")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VAULT_IDENTITY.to_string())
}

/// Identity list configured through the environment.
pub fn default_identity_list() -> Vec<String> {
    env::var("ANSIBLE_VAULT_IDENTITY_LIST")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

pub fn default_password_file() -> Option<String> {
    env::var("ANSIBLE_VAULT_PASSWORD_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// Split `label@source`. Without `@` the whole slug is the source.
pub fn split_vault_id(slug: &str) -> (Option<&str>, &str) {
    match slug.split_once('@') {
        Some((label, source)) => (Some(label), source),
        None => (None, slug),
    }
}

/// Turn password files into `identity@file` slugs appended to `vault_ids`.
pub fn build_vault_ids(
    mut vault_ids: Vec<String>,
    password_files: &[String],
    identity: &str,
) -> Vec<String> {
    for password_file in password_files {
        vault_ids.push(format!("{}@{}", identity, password_file));
    }
    vault_ids
}

/// Resolve every vault id to a readable password source.
///
/// The environment password file is appended to `password_files`. An unreadable
/// source fails the whole resolution.
pub fn load_vault_secrets(
    vault_ids: Vec<String>,
    password_files: &[String],
    identity: &str,
) -> Result<Vec<VaultSecret>> {
    let mut password_files = password_files.to_vec();
    if let Some(file) = default_password_file() {
        password_files.push(file);
    }

    let slugs = build_vault_ids(vault_ids, &password_files, identity);

    let mut secrets = vec![];
    for slug in slugs.iter() {
        let (label, source) = split_vault_id(slug);
        let id = label.unwrap_or(identity).to_string();

        if source == PROMPT_SOURCE {
            secrets.push(VaultSecret {
                id,
                source: PathBuf::from(source),
            });
            continue;
        }

        log::debug!("Reading vault password file: {}", source);
        let source = expand_home(source);
        if let Err(e) = check_password_source(&source) {
            log::warn!("Error in vault password file loading ({}): {:#}", id, e);
            return Err(e);
        }

        if !secrets
            .iter()
            .any(|s: &VaultSecret| s.id == id && s.source == source)
        {
            secrets.push(VaultSecret { id, source });
        }
    }

    Ok(secrets)
}

fn check_password_source(source: &PathBuf) -> Result<()> {
    if !source.is_file() {
        return Err(anyhow!(
            "Vault password file '{}' does not exist",
            source.display()
        ));
    }
    File::open(source)
        .map(|_| ())
        .with_context(|| format!("Vault password file '{}' is not readable", source.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_vault_id() {
        assert_eq!(split_vault_id("/etc/vault"), (None, "/etc/vault"));
        assert_eq!(split_vault_id("dev@/etc/vault"), (Some("dev"), "/etc/vault"));
        assert_eq!(split_vault_id("dev@a@b"), (Some("dev"), "a@b"));
        assert_eq!(split_vault_id("dev@prompt"), (Some("dev"), "prompt"));
    }

    #[test]
    fn test_build_vault_ids() {
        let ids = build_vault_ids(
            vec!["prod@/etc/prod".to_string()],
            &["/etc/a".to_string(), "/etc/b".to_string()],
            "default",
        );
        assert_eq!(
            ids,
            vec!["prod@/etc/prod", "default@/etc/a", "default@/etc/b"]
        );

        assert!(build_vault_ids(vec![], &[], "default").is_empty());
    }

    #[test]
    fn test_load_vault_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let labeled = dir.path().join("dev.pass");
        let plain = dir.path().join("plain.pass");
        std::fs::write(&labeled, "dev").unwrap();
        std::fs::write(&plain, "plain").unwrap();

        let secrets = load_vault_secrets(
            vec![
                format!("dev@{}", labeled.display()),
                plain.display().to_string(),
                "ops@prompt".to_string(),
            ],
            &[],
            "default",
        )
        .unwrap();

        let expected_head = vec![
            VaultSecret {
                id: "dev".to_string(),
                source: labeled.clone(),
            },
            VaultSecret {
                id: "default".to_string(),
                source: plain.clone(),
            },
            VaultSecret {
                id: "ops".to_string(),
                source: PathBuf::from("prompt"),
            },
        ];
        // ANSIBLE_VAULT_PASSWORD_FILE may add one more entry
        assert_eq!(secrets[..3], expected_head[..]);
        assert_eq!(secrets[0].slug(), format!("dev@{}", labeled.display()));
    }

    #[test]
    fn test_missing_password_file_fails() {
        let result = load_vault_secrets(
            vec![],
            &["/definitely/not/a/vault/file".to_string()],
            "default",
        );
        assert!(result.is_err());
    }
}
