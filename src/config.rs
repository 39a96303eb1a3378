//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bomdash/bomdash.toml`
//! 3. Local config: `<dir>/.bomdash.toml` (usually the working directory)
//! 4. Environment variables: `BOMDASH_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DEFAULT_CURRENCY, DEFAULT_WEIGHT_UNIT};

/// Tree columns that can be switched on or off.
pub const KNOWN_COLUMNS: [&str; 5] = ["cost", "weight", "tests", "drawings", "supplier"];

/// Tree view configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Metric columns shown next to each part
    pub columns: Vec<String>,
    /// Levels expanded by default; deeper nodes are collapsed
    pub expand_depth: usize,
    /// Colour status badges
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: vec!["cost".into(), "tests".into(), "weight".into()],
            expand_depth: 2,
            color: true,
        }
    }
}

/// Raw display config for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub columns: Option<Vec<String>>,
    pub expand_depth: Option<usize>,
    pub color: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub currency: Option<String>,
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub display: RawDisplayConfig,
}

impl DisplayConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["cost", "weight"], &["tests"])     // → ["cost", "tests", "weight"]
    /// merge_array(&["cost", "weight"], &["!cost"])     // → ["weight"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Arrays: union merge with negation support (if overlay specified)
    pub fn merge(&self, overlay: &RawDisplayConfig) -> Self {
        Self {
            columns: overlay
                .columns
                .as_ref()
                .map(|o| Self::merge_array(&self.columns, o))
                .unwrap_or_else(|| self.columns.clone()),
            expand_depth: overlay.expand_depth.unwrap_or(self.expand_depth),
            color: overlay.color.unwrap_or(self.color),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()` which uses union semantics for arrays, this method
    /// uses REPLACE semantics: if global config specifies an array, it completely
    /// replaces the default array.
    pub fn apply_global(&self, global: &RawDisplayConfig) -> Self {
        Self {
            columns: global
                .columns
                .clone()
                .unwrap_or_else(|| self.columns.clone()),
            expand_depth: global.expand_depth.unwrap_or(self.expand_depth),
            color: global.color.unwrap_or(self.color),
        }
    }

    pub fn shows(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Unified configuration for bomdash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON file holding the part records
    pub data_file: PathBuf,
    /// Currency for aggregated cost totals
    pub currency: String,
    /// Unit for aggregated weight totals
    pub weight_unit: String,
    /// Tree view settings
    pub display: DisplayConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            currency: DEFAULT_CURRENCY.into(),
            weight_unit: DEFAULT_WEIGHT_UNIT.into(),
            display: DisplayConfig::default(),
        }
    }
}

/// Default data file in the platform data directory.
fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "bomdash")
        .map(|dirs| dirs.data_dir().join("bom.json"))
        .unwrap_or_else(|| PathBuf::from("~/.bomdash/bom.json"))
}

/// Get the XDG config directory for bomdash.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bomdash").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bomdash.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".bomdash.toml")
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

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_file.to_string_lossy().as_ref());
        self.data_file = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            currency: overlay
                .currency
                .clone()
                .unwrap_or_else(|| self.currency.clone()),
            weight_unit: overlay
                .weight_unit
                .clone()
                .unwrap_or_else(|| self.weight_unit.clone()),
            display: self.display.merge(&overlay.display),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            data_file: global
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            currency: global
                .currency
                .clone()
                .unwrap_or_else(|| self.currency.clone()),
            weight_unit: global
                .weight_unit
                .clone()
                .unwrap_or_else(|| self.weight_unit.clone()),
            display: self.display.apply_global(&global.display),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.bomdash.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply BOMDASH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("BOMDASH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("display.columns"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("currency") {
            settings.currency = val;
        }
        if let Ok(val) = config.get_string("weight_unit") {
            settings.weight_unit = val;
        }
        if let Ok(val) = config.get::<usize>("display.expand_depth") {
            settings.display.expand_depth = val;
        }
        if let Ok(val) = config.get_bool("display.color") {
            settings.display.color = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("display.columns") {
            settings.display.columns = val;
        }

        Ok(settings)
    }

    /// Reject column names the tree renderer does not know.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if let Some(unknown) = self
            .display
            .columns
            .iter()
            .find(|c| !KNOWN_COLUMNS.contains(&c.as_str()))
        {
            return Err(ApplicationError::Config {
                message: format!(
                    "unknown display column '{}' (known: {})",
                    unknown,
                    KNOWN_COLUMNS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bomdash configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bomdash/bomdash.toml  (defines your baseline)
#   Local:  ./.bomdash.toml                 (per-directory additions)
#   Env:    BOMDASH_* environment variables (explicit overrides,
#           nested keys use "__", e.g. BOMDASH_DISPLAY__EXPAND_DEPTH=3)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item:
#     columns = ["drawings", "!weight"]  # adds drawings, hides weight

# JSON file holding the part records
# data_file = "~/.local/share/bomdash/bom.json"

# Currency and unit used for aggregated totals in `bomdash summary`
# currency = "USD"
# weight_unit = "kg"

[display]
# Columns shown in `bomdash tree`: cost, weight, tests, drawings, supplier
# columns = ["cost", "weight", "tests"]

# Levels expanded by default, deeper parts are collapsed
# expand_depth = 2

# Colour status badges (NO_COLOR is honoured as well)
# color = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
