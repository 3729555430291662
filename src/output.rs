//! Destinations for generated units.

use crate::error::Result;
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Accepts rendered units by relative path. Write failures are fatal.
pub trait OutputSink {
    fn write_unit(&mut self, name: &Path, text: &str) -> Result<()>;
}

/// Writes units below a root directory, creating parent directories as needed.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    fn write_unit(&mut self, name: &Path, text: &str) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;
        debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(())
    }
}

/// Collects units in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub units: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: impl AsRef<Path>) -> Option<&str> {
        self.units.get(name.as_ref()).map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn write_unit(&mut self, name: &Path, text: &str) -> Result<()> {
        self.units.insert(name.to_path_buf(), text.to_string());
        Ok(())
    }
}
