//! Optional project configuration (`courselab.yaml`).
//!
//! Every field is optional. A missing file means the built-in policy set and
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::logging::debug;
use crate::policy::{PolicyDefinition, PolicySet, Replacements};

/// Where the project config is looked for by default.
pub const DEFAULT_CONFIG_PATH: &str = "courselab.yaml";
/// Where policy documents are looked for by default.
pub const DEFAULT_POLICY_DIR: &str = "policies";

/// Struct representing the courselab.yaml file.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Replaces the built-in policy set when present.
    #[serde(default)]
    pub policies: Option<Vec<PolicyDefinition>>,
    /// Directory holding the policy documents.
    #[serde(default)]
    pub policy_dir: Option<PathBuf>,
    /// Literal substitutions applied to every document.
    #[serde(default)]
    pub replacements: Replacements,
    /// User to target when neither a user nor a role is given.
    #[serde(default)]
    pub default_user: Option<String>,
}

impl ProjectConfig {
    /// Parse a config file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
        let config_raw = fs::read_to_string(&path).context("Reading file")?;
        Self::from_yaml(&config_raw)
    }

    /// Parse config from yaml text.
    pub fn from_yaml(raw: &str) -> Result<ProjectConfig> {
        let mut config = yaml::from_str::<ProjectConfig>(raw).context("Deserializing config")?;
        let config = config
            .pop()
            .ok_or_else(|| anyhow!["config file contains no yaml document"])?;
        if let Some(policies) = &config.policies {
            if policies.is_empty() {
                return Err(anyhow!["`policies` is empty; remove it to use the defaults"]);
            }
        }
        Ok(config)
    }

    /// Read the config at `path` if it exists, otherwise fall back to the
    /// defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
        let path = path.as_ref();
        if path.exists() {
            debug!("reading config from {}", path.display());
            Self::read_from_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))
        } else {
            debug!("no config at {}; using defaults", path.display());
            Ok(Default::default())
        }
    }

    /// The configured policy set, or the built-in one.
    pub fn policy_set(&self) -> PolicySet {
        self.policies
            .as_ref()
            .map(|p| PolicySet(p.to_owned()))
            .unwrap_or_default()
    }

    /// The policy directory: the override if given, then the configured one,
    /// then `policies`.
    pub fn policy_dir(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.policy_dir.to_owned())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_DIR))
    }

    /// Configured replacements with `extra` layered on top.
    pub fn replacements_with(&self, extra: &[(String, String)]) -> Replacements {
        let mut replacements = self.replacements.clone();
        for (from, to) in extra {
            replacements.insert(from.to_owned(), to.to_owned());
        }
        replacements
    }
}
