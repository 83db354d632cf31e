//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/argtree/argtree.toml`
//! 3. Local config: `<schema_dir>/.argtree.toml` (next to the schema file)
//! 4. Environment variables: `ARGTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{ErrorLevel, ResolvedThresholds};

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub display_level: Option<ErrorLevel>,
    pub exit_level: Option<ErrorLevel>,
    pub schema_dir: Option<PathBuf>,
}

/// Unified configuration for argtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Minimum level shown when neither argument nor command sets one
    pub display_level: ErrorLevel,
    /// Minimum level that fails a parse when neither argument nor command sets one
    pub exit_level: ErrorLevel,
    /// Directory searched for schemas given by bare file name
    pub schema_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = ResolvedThresholds::default();
        Self {
            display_level: defaults.display,
            exit_level: defaults.exit,
            schema_dir: None,
        }
    }
}

/// Get the XDG config directory for argtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "argtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("argtree.toml"))
}

/// Get the path to the local config file next to a schema.
pub fn local_config_path(schema_dir: &Path) -> PathBuf {
    schema_dir.join(".argtree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
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
    /// Tree-wide default thresholds.
    pub fn thresholds(&self) -> ResolvedThresholds {
        ResolvedThresholds {
            display: self.display_level,
            exit: self.exit_level,
        }
    }

    /// Resolve a schema argument: existing paths win, bare names are looked
    /// up in `schema_dir`.
    pub fn resolve_schema(&self, schema: &Path) -> PathBuf {
        if schema.exists() {
            return schema.to_path_buf();
        }
        match &self.schema_dir {
            Some(dir) if schema.is_relative() => dir.join(schema),
            _ => schema.to_path_buf(),
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.schema_dir {
            let expanded = expand_env_vars(dir.to_string_lossy().as_ref());
            self.schema_dir = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            display_level: overlay.display_level.unwrap_or(self.display_level),
            exit_level: overlay.exit_level.unwrap_or(self.exit_level),
            schema_dir: overlay
                .schema_dir
                .clone()
                .or_else(|| self.schema_dir.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `schema_dir` - Optional directory of the schema being checked, for local config
    pub fn load(schema_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = schema_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply ARGTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ARGTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("display_level") {
            settings.display_level = parse_level("ARGTREE_DISPLAY_LEVEL", &val)?;
        }
        if let Ok(val) = config.get_string("exit_level") {
            settings.exit_level = parse_level("ARGTREE_EXIT_LEVEL", &val)?;
        }
        if let Ok(val) = config.get_string("schema_dir") {
            settings.schema_dir = Some(PathBuf::from(val));
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
        r#"# argtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/argtree/argtree.toml
#   Local:  <schema_dir>/.argtree.toml
#   Env:    ARGTREE_* environment variables

# Minimum level shown (debug, info, warning, error)
# display_level = "info"

# Minimum level that fails a parse
# exit_level = "error"

# Directory searched for schemas given by bare file name
# schema_dir = "~/.config/argtree/schemas"
"#
        .to_string()
    }
}

fn parse_level(source: &str, value: &str) -> Result<ErrorLevel, ApplicationError> {
    value.parse().map_err(|e| ApplicationError::Config {
        message: format!("{}: {}", source, e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_creating_then_matches_tree_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.thresholds(), ResolvedThresholds::default());
        assert_eq!(settings.schema_dir, None);
    }

    #[test]
    fn given_overlay_when_merging_then_specified_fields_win() {
        let base = Settings::default();
        let overlay = RawSettings {
            display_level: None,
            exit_level: Some(ErrorLevel::Warning),
            schema_dir: Some(PathBuf::from("/schemas")),
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.display_level, ErrorLevel::Info);
        assert_eq!(merged.exit_level, ErrorLevel::Warning);
        assert_eq!(merged.schema_dir, Some(PathBuf::from("/schemas")));
    }

    #[test]
    fn given_tilde_in_schema_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            schema_dir: Some(PathBuf::from("~/schemas")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.schema_dir.unwrap();
        assert!(dir.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_bare_name_and_schema_dir_when_resolving_then_joins() {
        let settings = Settings {
            schema_dir: Some(PathBuf::from("/opt/schemas")),
            ..Settings::default()
        };

        let resolved = settings.resolve_schema(Path::new("does-not-exist.toml"));

        assert_eq!(resolved, PathBuf::from("/opt/schemas/does-not-exist.toml"));
    }

    #[test]
    fn given_settings_when_serializing_then_levels_are_lowercase() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("display_level = \"info\""));
        assert!(text.contains("exit_level = \"error\""));
    }
}
