//! Generator configuration.
//!
//! Every field has a default, so an empty file is a valid configuration. Command-line flags
//! are applied on top of the loaded values.

use crate::error::{Error, Result};
use crate::openapi_builder::Info;
use crate::route_model::RouteOptions;
use crate::synthesizer::{SynthOptions, TemplateSet};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the project directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "routes-from-source.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory scanned for controllers, relative to the project directory
    pub source_dir: PathBuf,
    pub routes_dir: PathBuf,
    pub model_dir: PathBuf,
    pub controller_dir: PathBuf,
    /// Crate providing the router, context and validation runtime
    pub runtime_crate: String,
    pub controller_module: String,
    pub middleware_module: String,
    pub middleware_namespace: String,
    pub numeric_sentinel: String,
    /// Type of top-level variables registered as custom validators
    pub validator_type: String,
    pub info: Info,
    /// YAML file with template overrides
    pub templates: Option<PathBuf>,
    /// Catalog snapshot used by model and controller generation
    pub schema_snapshot: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let synth = SynthOptions::default();
        Self {
            source_dir: PathBuf::from("src/controller"),
            routes_dir: PathBuf::from("src/routes"),
            model_dir: PathBuf::from("src/model"),
            controller_dir: PathBuf::from("src/controller"),
            runtime_crate: synth.runtime_crate,
            controller_module: synth.controller_module,
            middleware_module: synth.middleware_module,
            middleware_namespace: synth.middleware_namespace,
            numeric_sentinel: synth.numeric_sentinel,
            validator_type: "validate::CustomValidateFunc".to_string(),
            info: Info::default(),
            templates: None,
            schema_snapshot: None,
        }
    }
}

impl GeneratorConfig {
    /// Loads a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given, else the default file of `project` when it exists, else the
    /// defaults.
    pub fn discover(project: &Path, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let candidate = project.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            numeric_sentinel: self.numeric_sentinel.clone(),
            middleware_namespace: self.middleware_namespace.clone(),
        }
    }

    pub fn synth_options(&self) -> SynthOptions {
        SynthOptions {
            runtime_crate: self.runtime_crate.clone(),
            controller_module: self.controller_module.clone(),
            middleware_module: self.middleware_module.clone(),
            middleware_namespace: self.middleware_namespace.clone(),
            numeric_sentinel: self.numeric_sentinel.clone(),
        }
    }

    /// The canonical templates merged with the override file, if any. A relative override
    /// path is resolved against `project`.
    pub fn template_set(&self, project: &Path) -> Result<TemplateSet> {
        match &self.templates {
            Some(path) => TemplateSet::load(&project.join(path)),
            None => Ok(TemplateSet::canonical()),
        }
    }
}
