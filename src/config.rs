//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/comptree/comptree.toml`
//! 3. Local config: `<model_dir>/.comptree.toml` (next to the model file)
//! 4. Environment variables: `COMPTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::policy::PatternPolicy;
use crate::domain::render::BranchOrder;
use crate::util::expand_env_vars;

/// Which composite features take part in tree composition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicySettings {
    /// Verdict for features no pattern matches
    pub default_closed_world: bool,
    /// Regexes over feature names (`name` or `Owner::name`) treated as open-world
    pub open_world_features: Vec<String>,
    /// Regexes over owner type names whose features are all open-world
    pub open_world_types: Vec<String>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            default_closed_world: true,
            open_world_features: vec![],
            open_world_types: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    /// List flattened ill-formed branches after the tree
    pub show_ill_formed: bool,
    /// Render branches in their total order instead of discovery order
    pub sort_branches: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_ill_formed: true,
            sort_branches: false,
        }
    }
}

impl OutputSettings {
    pub fn branch_order(&self) -> BranchOrder {
        if self.sort_branches {
            BranchOrder::Sorted
        } else {
            BranchOrder::Discovery
        }
    }
}

/// Raw policy config for intermediate parsing (arrays are Option to detect "not specified").
///
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPolicySettings {
    pub default_closed_world: Option<bool>,
    pub open_world_features: Option<Vec<String>>,
    pub open_world_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputSettings {
    pub format: Option<OutputFormat>,
    pub show_ill_formed: Option<bool>,
    pub sort_branches: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub policy: RawPolicySettings,
    pub output: RawOutputSettings,
}

/// Merge arrays with union semantics and negation support.
///
/// Items prefixed with `!` remove the corresponding item; the result is
/// sorted and de-duplicated.
///
/// ```ignore
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();
    for pattern in overlay {
        match pattern.strip_prefix('!') {
            Some(negated) => {
                result.remove(negated);
            }
            None => {
                result.insert(pattern.clone());
            }
        }
    }
    let mut merged: Vec<String> = result.into_iter().collect();
    merged.sort();
    merged
}

impl PolicySettings {
    /// Overlay wins for scalars; arrays union with negation.
    pub fn merge(&self, overlay: &RawPolicySettings) -> Self {
        let union = |base: &[String], over: &Option<Vec<String>>| {
            over.as_ref()
                .map(|o| merge_array(base, o))
                .unwrap_or_else(|| base.to_vec())
        };
        Self {
            default_closed_world: overlay
                .default_closed_world
                .unwrap_or(self.default_closed_world),
            open_world_features: union(&self.open_world_features, &overlay.open_world_features),
            open_world_types: union(&self.open_world_types, &overlay.open_world_types),
        }
    }

    /// Global arrays REPLACE the defaults.
    pub fn apply_global(&self, global: &RawPolicySettings) -> Self {
        Self {
            default_closed_world: global
                .default_closed_world
                .unwrap_or(self.default_closed_world),
            open_world_features: global
                .open_world_features
                .clone()
                .unwrap_or_else(|| self.open_world_features.clone()),
            open_world_types: global
                .open_world_types
                .clone()
                .unwrap_or_else(|| self.open_world_types.clone()),
        }
    }

    /// Compile the patterns into a policy.
    pub fn to_policy(&self) -> Result<PatternPolicy, ApplicationError> {
        PatternPolicy::from_patterns(
            self.default_closed_world,
            &self.open_world_types,
            &self.open_world_features,
        )
        .map_err(|e| ApplicationError::Config {
            message: format!("invalid open-world pattern: {e}"),
        })
    }
}

impl OutputSettings {
    fn merge(&self, overlay: &RawOutputSettings) -> Self {
        Self {
            format: overlay.format.unwrap_or(self.format),
            show_ill_formed: overlay.show_ill_formed.unwrap_or(self.show_ill_formed),
            sort_branches: overlay.sort_branches.unwrap_or(self.sort_branches),
        }
    }
}

/// Unified configuration for comptree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub policy: PolicySettings,
    pub output: OutputSettings,
}

/// Get the XDG config directory for comptree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "comptree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("comptree.toml"))
}

/// Get the path to the local config file next to a model.
pub fn local_config_path(model_dir: &Path) -> PathBuf {
    model_dir.join(".comptree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            policy: self.policy.merge(&overlay.policy),
            output: self.output.merge(&overlay.output),
        }
    }

    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            policy: self.policy.apply_global(&global.policy),
            output: self.output.merge(&global.output),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with `!` negation
    /// - Any → Env vars: REPLACE
    pub fn load(model_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = model_dir {
            let local_path = local_config_path(&PathBuf::from(expand_env_vars(
                dir.to_string_lossy().as_ref(),
            )));
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Load from an explicit file on top of the defaults, skipping the
    /// global file and the environment.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        Ok(Self::default().merge_with(&raw))
    }

    /// Apply COMPTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        Self::apply_env(settings, env_source())
    }

    /// Overlay one environment source; a present but unparsable value is an error.
    fn apply_env(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(&config, "policy.default_closed_world")? {
            settings.policy.default_closed_world = val;
        }
        if let Some(val) = env_value(&config, "policy.open_world_features")? {
            settings.policy.open_world_features = val;
        }
        if let Some(val) = env_value(&config, "policy.open_world_types")? {
            settings.policy.open_world_types = val;
        }
        if let Some(val) = env_value(&config, "output.format")? {
            settings.output.format = val;
        }
        if let Some(val) = env_value(&config, "output.show_ill_formed")? {
            settings.output.show_ill_formed = val;
        }
        if let Some(val) = env_value(&config, "output.sort_branches")? {
            settings.output.sort_branches = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# comptree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/comptree/comptree.toml
#   Local:  <model_dir>/.comptree.toml
#   Env:    COMPTREE_* (e.g. COMPTREE_POLICY__OPEN_WORLD_TYPES="^Ext.*,Legacy")
#
# Local arrays UNION with global ones; "!pattern" removes an inherited item.

[policy]
# default_closed_world = true
# open_world_types = ["^External"]
# open_world_features = ["Vehicle::cache", "^tmp_"]

[output]
# format = "text"          # or "json"
# show_ill_formed = true
# sort_branches = false
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("COMPTREE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("policy.open_world_features")
        .with_list_parse_key("policy.open_world_types")
}

/// `None` when the key is not set.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("environment override {key}: {e}"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
