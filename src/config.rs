//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/currtree/currtree.toml`
//! 3. Local config: `<data_dir>/.currtree.toml` (next to the node files)
//! 4. Environment variables: `CURRTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, Role};

/// Name of the per-curriculum config file.
pub const LOCAL_CONFIG_FILE: &str = ".currtree.toml";

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub expand_levels: Option<usize>,
    pub role: Option<Role>,
    pub state_file: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Unified configuration for currtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Levels expanded by default (1 = roots open)
    pub expand_levels: usize,
    /// Role used when none is given on the command line
    pub role: Role,
    /// Where `toggle` keeps the view state; relative paths are resolved
    /// against the curriculum directory
    pub state_file: PathBuf,
    /// Colored output (NO_COLOR is honoured regardless)
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            expand_levels: 1,
            role: Role::default(),
            state_file: PathBuf::from(".currtree-state.toml"),
            color: true,
        }
    }
}

/// Get the XDG config directory for currtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "currtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("currtree.toml"))
}

/// Get the path to the local config file in a curriculum directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOCAL_CONFIG_FILE)
}

/// Expand `~`, `$VAR` and `${VAR}`; unexpandable input is returned unchanged.
fn expand_env_vars(path: &str) -> String {
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
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.state_file.to_string_lossy().as_ref());
        self.state_file = PathBuf::from(expanded);
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            expand_levels: overlay.expand_levels.unwrap_or(self.expand_levels),
            role: overlay.role.unwrap_or(self.role),
            state_file: overlay
                .state_file
                .clone()
                .unwrap_or_else(|| self.state_file.clone()),
            color: overlay.color.unwrap_or(self.color),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `data_dir` - Optional curriculum directory holding a local config
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the node files
        if let Some(dir) = data_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply CURRTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CURRTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        let mut raw = RawSettings::default();
        if let Ok(val) = config.get::<usize>("expand_levels") {
            raw.expand_levels = Some(val);
        }
        if let Ok(val) = config.get_string("role") {
            let role = val
                .parse::<Role>()
                .map_err(|message| ApplicationError::Config { message })?;
            raw.role = Some(role);
        }
        if let Ok(val) = config.get_string("state_file") {
            raw.state_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_bool("color") {
            raw.color = Some(val);
        }

        Ok(settings.merge_with(&raw))
    }

    /// State file location for a curriculum rooted at `data_dir`.
    pub fn state_path(&self, data_dir: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            self.state_file.clone()
        } else {
            data_dir.join(&self.state_file)
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# currtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/currtree/currtree.toml
#   Local:  <curriculum_dir>/.currtree.toml
#   Env:    CURRTREE_* environment variables

# Levels expanded when a tree is first shown (1 = roots open, 0 = all collapsed)
# expand_levels = 1

# Role used for access checks: admin, teacher or student
# role = "student"

# Saved view state for `currtree toggle` (relative to the curriculum directory)
# state_file = ".currtree-state.toml"

# Colored output
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
