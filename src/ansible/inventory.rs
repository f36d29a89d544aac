use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::boxes::BoxConfig;

/// Inventory handed to the engine. Generated files live as long as this value.
#[derive(Debug)]
pub enum Inventory {
    File(PathBuf),
    Temp(NamedTempFile),
}

impl Inventory {
    pub fn path(&self) -> &Path {
        match self {
            Inventory::File(path) => path,
            Inventory::Temp(file) => file.path(),
        }
    }
}

/// Inventory for `b`: its own inventory file, or a generated one.
pub fn generate_inventory(b: &BoxConfig) -> Result<Inventory> {
    if b.uses_inventory_file() {
        return Ok(Inventory::File(PathBuf::from(&b.ip)));
    }

    let mut file = tempfile::Builder::new()
        .prefix("prudentia-inventory-")
        .tempfile()
        .context("cannot create inventory file")?;
    file.write_all(b.inventory().as_bytes())
        .context("cannot write inventory file")?;
    file.flush()?;

    log::debug!(
        "Inventory for '{}' written to '{}'",
        b.name,
        file.path().display()
    );

    Ok(Inventory::Temp(file))
}
