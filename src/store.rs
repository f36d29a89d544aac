/// Persistent box registry, one file per provider.
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::boxes::BoxConfig;

// file like:
// [box.web]
// name = "web"
// playbook = "/srv/playbooks/web.yml"
// hostname = "web01"
// ip = "10.0.0.5"
// remote_user = "deploy"
// transport = "ssh"
#[derive(Debug, Default, Serialize, Deserialize)]
struct BoxFile {
    #[serde(default, rename = "box")]
    boxes: BTreeMap<String, BoxConfig>,
}

#[derive(Debug)]
pub struct BoxStore {
    path: PathBuf,
    boxes: BTreeMap<String, BoxConfig>,
}

impl BoxStore {
    /// Open the registry of `provider` under `data_dir`, creating nothing until the first save.
    pub fn open<P: AsRef<Path>>(data_dir: P, provider: &str) -> Result<Self> {
        let path = data_dir.as_ref().join(format!("{}.boxes", provider));

        let boxes = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read boxes from '{}'", path.display()))?;
            let file: BoxFile = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse boxes from '{}'", path.display()))?;
            file.boxes
        } else {
            BTreeMap::new()
        };

        log::debug!("Loaded {} boxes from '{}'", boxes.len(), path.display());

        Ok(Self { path, boxes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&BoxConfig> {
        self.boxes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BoxConfig> {
        self.boxes.get_mut(name)
    }

    /// Look up a box, failing with a readable message.
    pub fn require(&self, name: &str) -> Result<&BoxConfig> {
        self.get(name)
            .ok_or_else(|| anyhow!("Box '{}' not found", name))
    }

    pub fn names(&self) -> Vec<String> {
        self.boxes.keys().cloned().collect()
    }

    pub fn boxes(&self) -> impl Iterator<Item = &BoxConfig> {
        self.boxes.values()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Add a box, replacing any box with the same name. Returns the replaced box.
    pub fn add(&mut self, b: BoxConfig) -> Result<Option<BoxConfig>> {
        b.validate()?;
        let previous = self.boxes.insert(b.name.clone(), b);
        self.save()?;
        Ok(previous)
    }

    pub fn remove(&mut self, name: &str) -> Result<BoxConfig> {
        let removed = self
            .boxes
            .remove(name)
            .ok_or_else(|| anyhow!("Box '{}' not found", name))?;
        self.save()?;
        Ok(removed)
    }

    /// Rewrite the registry atomically. The file holds box passwords, so it is
    /// only readable by its owner.
    pub fn save(&self) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;

        let file = BoxFile {
            boxes: self.boxes.clone(),
        };
        let contents = toml::to_string_pretty(&file)?;

        // temp files are created with mode 0600
        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create a file in '{}'", parent.display()))?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write boxes to '{}'", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::Transport;

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut store = BoxStore::open(dir.path(), "local").unwrap();
        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.remote_pwd = Some("s3cret".to_string());
        store.add(b).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // a rewrite keeps it private and leaves no stray files behind
        store.remove("web").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_add_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BoxStore::open(dir.path(), "local").unwrap();
        assert!(store.is_empty());

        let mut b = BoxConfig::new("web", "web.yml", "web01", "10.0.0.5");
        b.transport = Transport::Paramiko;
        b.port = Some(2222);
        store.add(b.clone()).unwrap();
        store
            .add(BoxConfig::new("db", "db.yml", "db01", "10.0.0.6"))
            .unwrap();

        assert!(dir.path().join("local.boxes").exists());

        let reopened = BoxStore::open(dir.path(), "local").unwrap();
        assert_eq!(reopened.names(), vec!["db".to_string(), "web".to_string()]);
        assert_eq!(reopened.get("web"), Some(&b));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BoxStore::open(dir.path(), "local").unwrap();

        assert!(store
            .add(BoxConfig::new("web", "web.yml", "web01", "10.0.0.5"))
            .unwrap()
            .is_none());
        let previous = store
            .add(BoxConfig::new("web", "web.yml", "web02", "10.0.0.7"))
            .unwrap();

        assert_eq!(previous.unwrap().hostname, "web01");
        assert_eq!(store.require("web").unwrap().hostname, "web02");
        assert_eq!(store.names().len(), 1);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BoxStore::open(dir.path(), "local").unwrap();
        store
            .add(BoxConfig::new("web", "web.yml", "web01", "10.0.0.5"))
            .unwrap();

        assert_eq!(store.remove("web").unwrap().name, "web");
        assert!(store.remove("web").is_err());
        assert!(BoxStore::open(dir.path(), "local").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_box_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = BoxStore::open(dir.path(), "local").unwrap();

        assert!(store
            .add(BoxConfig::new("bad name", "web.yml", "web01", "10.0.0.5"))
            .is_err());
        assert!(!store.path().exists());
    }
}
