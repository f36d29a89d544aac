/// Extra variables handed to every playbook run.
use std::{collections::BTreeMap, fs, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use serde_yaml::Value;
use tempfile::NamedTempFile;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtraVars {
    vars: BTreeMap<String, Value>,
}

impl ExtraVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, `value` is kept verbatim including inner spaces.
    pub fn set(&mut self, name: &str, value: &str) {
        self.vars
            .insert(name.to_string(), Value::String(value.to_string()));
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Merge the top-level mapping of a YAML file, overriding existing names.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read vars file '{}'", path.display()))?;
        let doc: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse vars file '{}'", path.display()))?;

        let mapping = match doc {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(0),
            _ => {
                return Err(anyhow!(
                    "Vars file '{}' must contain a mapping of variables",
                    path.display()
                ))
            }
        };

        let mut loaded = 0;
        for (key, value) in mapping {
            let name = scalar_to_string(&key).ok_or_else(|| {
                anyhow!("Vars file '{}' has a non-scalar key", path.display())
            })?;
            self.vars.insert(name, value);
            loaded += 1;
        }

        log::debug!("Loaded {} vars from '{}'", loaded, path.display());
        Ok(loaded)
    }

    /// Write these vars plus `additional` ones to a private temp file.
    pub fn write_temp(&self, additional: &[(&str, Value)]) -> Result<NamedTempFile> {
        let mut all = self.vars.clone();
        for (name, value) in additional {
            all.insert(name.to_string(), value.clone());
        }

        let mut file = tempfile::Builder::new()
            .prefix("prudentia-vars-")
            .suffix(".yml")
            .tempfile()
            .context("Failed to create extra vars file")?;
        let contents = serde_yaml::to_string(&all)?;
        file.write_all(contents.as_bytes())
            .context("Failed to write extra vars file")?;
        file.flush()?;

        Ok(file)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One-line rendering of a variable value for listings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().replace('\n', " "))
            .unwrap_or_default(),
    }
}
