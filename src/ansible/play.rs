use std::{collections::BTreeSet, fs, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_yaml::Value;
use tempfile::NamedTempFile;

/// A single play, run through the playbook entry point.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Play {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub hosts: String,
    pub gather_facts: bool,
    pub tasks: Vec<Value>,
}

impl Play {
    pub fn new(hosts: &str) -> Self {
        Self {
            name: None,
            hosts: hosts.to_string(),
            gather_facts: false,
            tasks: vec![],
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Value>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Parse a YAML task list such as the bundled task files.
    pub fn parse_tasks(source: &str) -> Result<Vec<Value>> {
        let doc: Value = serde_yaml::from_str(source).context("Failed to parse task list")?;
        match doc {
            Value::Sequence(tasks) => Ok(tasks),
            _ => Err(anyhow!("Task list must be a YAML sequence")),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&[self])?)
    }

    pub fn write_temp(&self) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("prudentia-play-")
            .suffix(".yml")
            .tempfile()
            .context("cannot create play file")?;
        file.write_all(self.to_yaml()?.as_bytes())
            .context("cannot write play file")?;
        file.flush()?;
        Ok(file)
    }
}

/// Every tag mentioned anywhere in a playbook: plays, roles, tasks and blocks.
pub fn playbook_tags<P: AsRef<Path>>(path: P) -> Result<BTreeSet<String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read playbook '{}'", path.display()))?;
    let doc: Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse playbook '{}'", path.display()))?;

    let mut tags = BTreeSet::new();
    collect_tags(&doc, &mut tags);
    Ok(tags)
}

fn collect_tags(value: &Value, tags: &mut BTreeSet<String>) {
    match value {
        Value::Sequence(items) => items.iter().for_each(|v| collect_tags(v, tags)),
        Value::Mapping(mapping) => {
            for (key, v) in mapping {
                if key.as_str() == Some("tags") {
                    insert_tags(v, tags);
                } else {
                    collect_tags(v, tags);
                }
            }
        }
        _ => {}
    }
}

// tags: web | tags: "web, db" | tags: [web, db]
fn insert_tags(value: &Value, tags: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => tags.extend(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
        ),
        Value::Number(n) => {
            tags.insert(n.to_string());
        }
        Value::Sequence(items) => items.iter().for_each(|v| insert_tags(v, tags)),
        _ => {}
    }
}
