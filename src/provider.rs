/// The local provider: boxes that already exist and are reachable by the engine.
use std::collections::BTreeSet;

use anyhow::{anyhow, Result};

use crate::{
    ansible::{generate_inventory, playbook_tags, Interrupted, PlaybookOptions, PlaybookRunner},
    boxes::BoxConfig,
    config::{AnsibleConfig, Config, MAX_VERBOSITY},
    provisioning::{self, connection_vars, PlayContext},
    retry_operation,
    store::BoxStore,
    utils::expand_home,
    vars::ExtraVars,
    vault::{self, VaultSecret},
};

pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug)]
pub struct LocalProvider {
    store: BoxStore,
    extra_vars: ExtraVars,
    verbosity: u8,
    max_retry: u32,
    settings: AnsibleConfig,
    runner: PlaybookRunner,
}

impl LocalProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let store = BoxStore::open(config.data_dir(), LOCAL_PROVIDER)?;
        Self::with_store(store, config)
    }

    pub fn with_store(store: BoxStore, config: &Config) -> Result<Self> {
        let mut provider = Self {
            store,
            extra_vars: ExtraVars::new(),
            verbosity: 0,
            max_retry: config.shell.max_retry,
            settings: config.ansible.clone(),
            runner: PlaybookRunner::new(&config.ansible.playbook_bin),
        };
        provider.set_verbosity(config.shell.verbosity)?;
        Ok(provider)
    }

    pub fn store(&self) -> &BoxStore {
        &self.store
    }

    pub fn box_names(&self) -> Vec<String> {
        self.store.names()
    }

    pub fn extra_vars(&self) -> &ExtraVars {
        &self.extra_vars
    }

    pub fn extra_vars_mut(&mut self) -> &mut ExtraVars {
        &mut self.extra_vars
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: u8) -> Result<()> {
        if verbosity > MAX_VERBOSITY {
            return Err(anyhow!(
                "Verbosity must be between 0 and {}, got {}",
                MAX_VERBOSITY,
                verbosity
            ));
        }
        self.verbosity = verbosity;
        Ok(())
    }

    /// Register a box, returning the box it replaced.
    pub fn register(&mut self, b: BoxConfig) -> Result<Option<BoxConfig>> {
        let previous = self.store.add(b)?;
        Ok(previous)
    }

    pub fn unregister(&mut self, name: &str) -> Result<BoxConfig> {
        self.store.remove(name)
    }

    /// Store the box connection password, None or empty switches back to key auth.
    pub fn set_password(&mut self, name: &str, password: Option<String>) -> Result<()> {
        let b = self
            .store
            .get_mut(name)
            .ok_or_else(|| anyhow!("Box '{}' not found", name))?;
        b.remote_pwd = password.filter(|p| !p.is_empty());
        self.store.save()
    }

    pub fn playbook_tags(&self, name: &str) -> Result<BTreeSet<String>> {
        let b = self.store.require(name)?;
        playbook_tags(expand_home(&b.playbook))
    }

    /// Run the box playbook, restricted to `tags` when given.
    pub async fn provision(&self, name: &str, tags: &[String]) -> Result<()> {
        let b = self.store.require(name)?;

        let playbook = expand_home(&b.playbook);
        if !playbook.is_file() {
            return Err(anyhow!(
                "Playbook '{}' of box '{}' not found",
                playbook.display(),
                b.name
            ));
        }

        let inventory = generate_inventory(b)?;
        let mut options = PlaybookOptions::default_options(
            &self.settings,
            &b.remote_user,
            b.transport,
            tags,
            self.verbosity,
        );
        options.vault_ids = self.vault_secrets()?;
        let extra_file = self.extra_vars.write_temp(&connection_vars(b, &b.remote_user))?;

        log::info!(
            "Provisioning box '{}' ({}) with '{}'",
            b.name,
            b,
            playbook.display()
        );

        let log_prefix = format!("Provisioning '{}'", b.name);
        retry_operation!(
            self.max_retry,
            async {
                let success = self
                    .runner
                    .run_playbook(&playbook, inventory.path(), &options, Some(extra_file.path()))
                    .await?;
                if success {
                    Ok(())
                } else {
                    Err(anyhow!("Playbook '{}' failed", playbook.display()))
                }
            }
            .await,
            log_prefix,
            |e: &anyhow::Error| e.downcast_ref::<Interrupted>().is_none()
        )
    }

    pub async fn facts(&self, name: &str, filter: &str) -> Result<bool> {
        let b = self.store.require(name)?;
        provisioning::gather_facts(b, filter, self.play_context()).await
    }

    pub async fn create_user(&self, name: &str) -> Result<bool> {
        let b = self.store.require(name)?;
        provisioning::create_user(b, self.play_context()).await
    }

    fn play_context(&self) -> PlayContext<'_> {
        PlayContext {
            runner: &self.runner,
            settings: &self.settings,
            verbosity: self.verbosity,
        }
    }

    fn vault_secrets(&self) -> Result<Vec<VaultSecret>> {
        let mut vault_ids = vault::default_identity_list();
        vault_ids.extend(self.settings.vault_identity_list.iter().cloned());

        vault::load_vault_secrets(
            vault_ids,
            &self.settings.vault_password_files,
            &vault::default_identity(),
        )
    }
}
