/// Ad-hoc provisioning plays run against a single box.
use anyhow::Result;
use serde_yaml::Value;

use crate::{
    ansible::{generate_inventory, Play, PlaybookOptions, PlaybookRunner},
    boxes::BoxConfig,
    config::AnsibleConfig,
    vars::ExtraVars,
};

/// Tasks creating a passwordless sudo user from the root account.
pub const ADD_SUDO_USER_TASKS: &str = include_str!("../tasks/add-sudo-user.yml");

const SEED_USER: &str = "root";

/// Shared inputs of every ad-hoc play.
#[derive(Debug, Clone, Copy)]
pub struct PlayContext<'a> {
    pub runner: &'a PlaybookRunner,
    pub settings: &'a AnsibleConfig,
    pub verbosity: u8,
}

pub fn user_home(user: &str) -> String {
    if user.contains("jenkins") {
        "/var/lib/jenkins".to_string()
    } else {
        format!("/home/{}", user)
    }
}

/// Play and variables creating the box's remote user, None for root users.
pub fn create_user_play(b: &BoxConfig) -> Result<Option<(Play, ExtraVars)>> {
    let user = &b.remote_user;
    if user.contains("root") {
        return Ok(None);
    }

    let play = Play::new(&b.hostname)
        .with_name(&format!("Create user {}", user))
        .with_tasks(Play::parse_tasks(ADD_SUDO_USER_TASKS)?);

    let mut extra = ExtraVars::new();
    extra.set("ssh_seed_user", SEED_USER);
    extra.set("user", user);
    extra.set("group", user);
    extra.set("home", &user_home(user));

    Ok(Some((play, extra)))
}

pub fn gather_facts_play(b: &BoxConfig, filter: &str) -> Play {
    let mut task = serde_yaml::Mapping::new();
    task.insert(
        Value::from("setup"),
        Value::from(format!("filter={}", filter)),
    );
    Play::new(&b.hostname)
        .with_name(&format!("Gather facts {}", filter))
        .with_tasks(vec![Value::Mapping(task)])
}

/// Create the box's remote user with sudo rights, connecting as root.
pub async fn create_user(b: &BoxConfig, ctx: PlayContext<'_>) -> Result<bool> {
    let Some((play, extra)) = create_user_play(b)? else {
        println!("Root user cannot be created!");
        return Ok(false);
    };

    log::info!("Creating user '{}' on box '{}'", b.remote_user, b.name);
    run_box_play(b, &play, SEED_USER, &extra, ctx).await
}

/// Print the facts of the box matching `filter`.
pub async fn gather_facts(b: &BoxConfig, filter: &str, ctx: PlayContext<'_>) -> Result<bool> {
    let play = gather_facts_play(b, filter);
    run_box_play(b, &play, &b.remote_user, &ExtraVars::new(), ctx).await
}

async fn run_box_play(
    b: &BoxConfig,
    play: &Play,
    remote_user: &str,
    extra: &ExtraVars,
    ctx: PlayContext<'_>,
) -> Result<bool> {
    let inventory = generate_inventory(b)?;
    let options =
        PlaybookOptions::default_options(ctx.settings, remote_user, b.transport, &[], ctx.verbosity);

    let extra_file = extra.write_temp(&connection_vars(b, remote_user))?;

    Ok(ctx
        .runner
        .run_play(
            play,
            inventory.path(),
            &options,
            Some(extra_file.path()),
        )
        .await)
}

/// Connection user and password as extra vars, which outrank the inventory's
/// `ansible_user`. The password never goes on the command line.
pub fn connection_vars(b: &BoxConfig, remote_user: &str) -> Vec<(&'static str, Value)> {
    let mut vars = vec![("ansible_user", Value::String(remote_user.to_string()))];
    if let Some(ref pwd) = b.remote_pwd {
        if !pwd.is_empty() {
            vars.push(("ansible_password", Value::String(pwd.clone())));
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_home() {
        assert_eq!(user_home("deploy"), "/home/deploy");
        assert_eq!(user_home("jenkins"), "/var/lib/jenkins");
        assert_eq!(user_home("jenkins-ci"), "/var/lib/jenkins");
    }

    #[test]
    fn test_create_user_play() {
        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.remote_user = "deploy".to_string();

        let (play, extra) = create_user_play(&b).unwrap().unwrap();
        assert_eq!(play.hosts, "web01");
        assert_eq!(play.name.as_deref(), Some("Create user deploy"));
        assert!(!play.gather_facts);
        assert!(!play.tasks.is_empty());

        assert_eq!(extra.get_str("ssh_seed_user"), Some("root"));
        assert_eq!(extra.get_str("user"), Some("deploy"));
        assert_eq!(extra.get_str("group"), Some("deploy"));
        assert_eq!(extra.get_str("home"), Some("/home/deploy"));
    }

    #[test]
    fn test_root_user_is_refused() {
        let b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        assert!(create_user_play(&b).unwrap().is_none());
    }

    #[test]
    fn test_gather_facts_play() {
        let b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        let play = gather_facts_play(&b, "ansible_eth*");

        assert_eq!(play.hosts, "web01");
        assert_eq!(play.tasks[0]["setup"], Value::from("filter=ansible_eth*"));
    }

    #[test]
    fn test_connection_vars() {
        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.remote_user = "deploy".to_string();
        assert_eq!(
            connection_vars(&b, "deploy"),
            vec![("ansible_user", Value::from("deploy"))]
        );

        b.remote_pwd = Some(String::new());
        assert_eq!(connection_vars(&b, "root").len(), 1);

        b.remote_pwd = Some("pw".to_string());
        assert_eq!(
            connection_vars(&b, "root"),
            vec![
                ("ansible_user", Value::from("root")),
                ("ansible_password", Value::from("pw"))
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_user_connects_as_root() {
        use crate::test_support::{fake_engine, recorded_args, recorded_extra_vars, ENGINE};

        let _engine = ENGINE.lock().await;

        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "exit 0");
        let runner = PlaybookRunner::new(&engine.display().to_string());
        let settings = AnsibleConfig::default();
        let ctx = PlayContext {
            runner: &runner,
            settings: &settings,
            verbosity: 0,
        };

        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.remote_user = "deploy".to_string();
        b.remote_pwd = Some("s3cret".to_string());

        assert!(create_user(&b, ctx).await.unwrap());

        // extra vars outrank the inventory's ansible_user=deploy
        let vars = recorded_extra_vars(dir.path());
        assert_eq!(vars["ansible_user"], Value::from("root"));
        assert_eq!(vars["ansible_password"], Value::from("s3cret"));
        assert_eq!(vars["user"], Value::from("deploy"));
        assert!(recorded_args(dir.path()).contains("--user root"));
        assert!(!recorded_args(dir.path()).contains("s3cret"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gather_facts_connects_as_box_user() {
        use crate::test_support::{fake_engine, recorded_extra_vars, ENGINE};

        let _engine = ENGINE.lock().await;

        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "exit 0");
        let runner = PlaybookRunner::new(&engine.display().to_string());
        let settings = AnsibleConfig::default();
        let ctx = PlayContext {
            runner: &runner,
            settings: &settings,
            verbosity: 0,
        };

        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.remote_user = "deploy".to_string();

        assert!(gather_facts(&b, "*", ctx).await.unwrap());
        let vars = recorded_extra_vars(dir.path());
        assert_eq!(vars["ansible_user"], Value::from("deploy"));
        assert!(vars.get("ansible_password").is_none());
    }
}
