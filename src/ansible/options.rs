use crate::{
    boxes::Transport, config::AnsibleConfig, utils::expand_home, vault::VaultSecret,
};

/// Options for one playbook run, rendered as `ansible-playbook` flags.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookOptions {
    pub remote_user: Option<String>,
    pub connection: Transport,
    pub tags: Vec<String>,
    pub list_hosts: bool,
    pub list_tasks: bool,
    pub list_tags: bool,
    pub syntax: bool,
    pub private_key_file: Option<String>,
    pub ssh_common_args: String,
    pub sftp_extra_args: Option<String>,
    pub scp_extra_args: Option<String>,
    pub ssh_extra_args: String,
    pub r#become: bool,
    pub become_method: String,
    pub become_user: String,
    pub verbosity: u8,
    pub check: bool,
    pub diff: bool,
    pub module_path: Option<String>,
    pub forks: u32,
    pub vault_ids: Vec<VaultSecret>,
    pub vault_id_match: bool,
}

impl PlaybookOptions {
    pub fn default_options(
        settings: &AnsibleConfig,
        remote_user: &str,
        transport: Transport,
        tags: &[String],
        verbosity: u8,
    ) -> Self {
        Self {
            remote_user: Some(remote_user.to_string()).filter(|u| !u.is_empty()),
            connection: transport,
            tags: tags.to_vec(),
            list_hosts: false,
            list_tasks: false,
            list_tags: false,
            syntax: false,
            private_key_file: settings.private_key_file.clone(),
            ssh_common_args: settings.ssh_common_args.clone(),
            sftp_extra_args: settings.sftp_extra_args.clone(),
            scp_extra_args: settings.scp_extra_args.clone(),
            ssh_extra_args: settings.ssh_extra_args.clone(),
            r#become: settings.r#become,
            become_method: settings.become_method.clone(),
            become_user: settings.become_user.clone(),
            verbosity,
            check: settings.check,
            diff: settings.diff,
            module_path: settings.module_path.clone(),
            forks: settings.forks,
            vault_ids: vec![],
            vault_id_match: settings.vault_id_match,
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![];

        if let Some(ref user) = self.remote_user {
            args.push("--user".to_string());
            args.push(user.clone());
        }
        args.push("--connection".to_string());
        args.push(self.connection.to_string());

        if !self.tags.is_empty() {
            args.push("--tags".to_string());
            args.push(self.tags.join(","));
        }

        for (enabled, flag) in [
            (self.list_hosts, "--list-hosts"),
            (self.list_tasks, "--list-tasks"),
            (self.list_tags, "--list-tags"),
            (self.syntax, "--syntax-check"),
        ] {
            if enabled {
                args.push(flag.to_string());
            }
        }

        if let Some(ref key) = self.private_key_file {
            args.push("--private-key".to_string());
            args.push(expand_home(key).display().to_string());
        }

        push_non_empty(&mut args, "--ssh-common-args", Some(&self.ssh_common_args));
        push_non_empty(&mut args, "--sftp-extra-args", self.sftp_extra_args.as_ref());
        push_non_empty(&mut args, "--scp-extra-args", self.scp_extra_args.as_ref());
        push_non_empty(&mut args, "--ssh-extra-args", Some(&self.ssh_extra_args));

        if self.r#become {
            args.push("--become".to_string());
        }
        push_non_empty(&mut args, "--become-method", Some(&self.become_method));
        push_non_empty(&mut args, "--become-user", Some(&self.become_user));

        if self.verbosity > 0 {
            args.push(format!("-{}", "v".repeat(self.verbosity as usize)));
        }
        if self.check {
            args.push("--check".to_string());
        }
        if self.diff {
            args.push("--diff".to_string());
        }

        if let Some(ref module_path) = self.module_path {
            args.push("--module-path".to_string());
            args.push(expand_home(module_path).display().to_string());
        }

        args.push("--forks".to_string());
        args.push(self.forks.to_string());

        for secret in self.vault_ids.iter() {
            args.push("--vault-id".to_string());
            args.push(secret.slug());
        }

        args
    }

    /// Settings without a command line flag.
    pub fn env(&self) -> Vec<(String, String)> {
        let mut env = vec![];
        if self.vault_id_match {
            env.push(("ANSIBLE_VAULT_ID_MATCH".to_string(), "True".to_string()));
        }
        env
    }
}

fn push_non_empty(args: &mut Vec<String>, flag: &str, value: Option<&String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            args.push(flag.to_string());
            args.push(value.clone());
        }
    }
}
