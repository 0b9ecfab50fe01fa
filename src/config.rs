//! Configuration management for pseudoasm.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`PSEUDOASM_STACK_POINTER`, `PSEUDOASM_TRACE_STACK`,
//!    `PSEUDOASM_MAX_CELLS`)
//! 2. Project-local config file (`./pseudoasm.toml`)
//! 3. User config file (`~/.config/pseudoasm/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # pseudoasm.toml
//!
//! # Initial stack pointer (the stack grows downward from here)
//! stack_pointer = 900000
//!
//! # Report subroutine call pushes as memory changes
//! trace_stack = false
//!
//! # Refuse to allocate more than this many memory cells
//! max_cells = 1000000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::interpreter::state::DEFAULT_STACK_POINTER;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// pseudoasm configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Initial stack pointer.
    pub stack_pointer: Option<u32>,

    /// Whether `JSB` pushes show up in memory change reports.
    pub trace_stack: Option<bool>,

    /// Upper bound on stored memory cells.
    /// Writes that would allocate beyond it fail with out-of-memory.
    pub max_cells: Option<usize>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `pseudoasm.toml`
    /// 3. User config `~/.config/pseudoasm/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_from_file(Path::new("pseudoasm.toml")) {
            config.merge(local_config);
        }

        config.apply_env_overrides(|name| std::env::var(name).ok());

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Initial stack pointer, 900000 if unset.
    pub fn stack_pointer(&self) -> u32 {
        self.stack_pointer.unwrap_or(DEFAULT_STACK_POINTER)
    }

    /// Stack tracing, off if unset.
    pub fn trace_stack(&self) -> bool {
        self.trace_stack.unwrap_or(false)
    }

    /// Cell limit, unlimited if unset.
    pub fn max_cells(&self) -> Option<usize> {
        self.max_cells
    }

    /// Load user configuration from ~/.config/pseudoasm/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    pub fn merge(&mut self, other: Self) {
        if other.stack_pointer.is_some() {
            self.stack_pointer = other.stack_pointer;
        }
        if other.trace_stack.is_some() {
            self.trace_stack = other.trace_stack;
        }
        if other.max_cells.is_some() {
            self.max_cells = other.max_cells;
        }
    }

    /// Apply environment variable overrides looked up through `var`.
    ///
    /// Values that do not parse are logged and ignored.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("PSEUDOASM_STACK_POINTER") {
            match value.trim().parse() {
                Ok(sp) => {
                    log::info!("Using PSEUDOASM_STACK_POINTER from environment: {}", sp);
                    self.stack_pointer = Some(sp);
                }
                Err(e) => log::warn!("Ignoring PSEUDOASM_STACK_POINTER={}: {}", value, e),
            }
        }
        if let Some(value) = var("PSEUDOASM_TRACE_STACK") {
            match parse_flag(&value) {
                Some(on) => {
                    log::info!("Using PSEUDOASM_TRACE_STACK from environment: {}", on);
                    self.trace_stack = Some(on);
                }
                None => log::warn!("Ignoring PSEUDOASM_TRACE_STACK={}", value),
            }
        }
        if let Some(value) = var("PSEUDOASM_MAX_CELLS") {
            match value.trim().parse() {
                Ok(limit) => {
                    log::info!("Using PSEUDOASM_MAX_CELLS from environment: {}", limit);
                    self.max_cells = Some(limit);
                }
                Err(e) => log::warn!("Ignoring PSEUDOASM_MAX_CELLS={}: {}", value, e),
            }
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pseudoasm").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# pseudoasm configuration
# Place this file at ~/.config/pseudoasm/config.toml or ./pseudoasm.toml

# Initial stack pointer (defaults to 900000)
stack_pointer = 900000

# Show JSB return address pushes in memory change reports (defaults to false)
trace_stack = false

# Maximum number of memory cells (unlimited when absent)
# max_cells = 1000000
"#
        .to_string()
    }
}

/// Parse a boolean switch: `1/true/on/yes` or `0/false/off/no`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stack_pointer(), 900_000);
        assert!(!config.trace_stack());
        assert_eq!(config.max_cells(), None);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config {
            stack_pointer: Some(1000),
            trace_stack: None,
            max_cells: Some(10),
        };

        let overlay = Config {
            stack_pointer: None,
            trace_stack: Some(true),
            max_cells: Some(20),
        };

        base.merge(overlay);

        // stack_pointer unchanged (overlay was None)
        assert_eq!(base.stack_pointer, Some(1000));
        assert_eq!(base.trace_stack, Some(true));
        assert_eq!(base.max_cells, Some(20));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            "PSEUDOASM_STACK_POINTER" => Some("5000".to_string()),
            "PSEUDOASM_TRACE_STACK" => Some("On".to_string()),
            "PSEUDOASM_MAX_CELLS" => Some("lots".to_string()),
            _ => None,
        });

        assert_eq!(config.stack_pointer(), 5000);
        assert!(config.trace_stack());
        // Unparsable value is ignored
        assert_eq!(config.max_cells, None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = Config::sample_config();
        let config: Config = toml::from_str(&sample).expect("Sample config should parse");
        assert_eq!(config.stack_pointer, Some(900_000));
        assert_eq!(config.trace_stack, Some(false));
        assert_eq!(config.max_cells, None);
    }

    #[test]
    fn test_partial_file_parses() {
        let config: Config = toml::from_str("max_cells = 64\n").unwrap();
        assert_eq!(config.max_cells(), Some(64));
        assert_eq!(config.stack_pointer(), 900_000);
    }
}
