use std::{fs, path::PathBuf};

const RECORDER: &str = r#"#!/bin/sh
echo "$@" > "DIR/args"
for a in "$@"; do
  case "$a" in
    @*) cp "${a#@}" "DIR/extra_vars.yml" ;;
  esac
done
"#;

/// Held by every test running a fake engine, a SIGINT sent by one of them
/// reaches all Ctrl-C listeners of the process.
pub static ENGINE: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Stand-in playbook program that records its arguments and extra vars in `dir`,
/// then runs `body`.
#[cfg(unix)]
pub fn fake_engine(dir: &std::path::Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ansible-playbook");
    let script = format!(
        "{}{}\n",
        RECORDER.replace("DIR", &dir.display().to_string()),
        body
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Extra vars the fake engine received on its last run.
pub fn recorded_extra_vars(dir: &std::path::Path) -> serde_yaml::Value {
    let contents = fs::read_to_string(dir.join("extra_vars.yml")).unwrap();
    serde_yaml::from_str(&contents).unwrap()
}

pub fn recorded_args(dir: &std::path::Path) -> String {
    fs::read_to_string(dir.join("args")).unwrap()
}
