//! Project configuration
//!
//! Read from `<repo>/.tortilla/config.toml`, else the user's
//! `<config-dir>/tortilla/config.toml`, else built-in defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding per-project tortilla files
pub const PROJECT_DIR: &str = ".tortilla";

const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TortillaConfig {
    /// Instruction file directory, relative to the repository root
    pub steps_dir: PathBuf,
    /// Structured files reconciled automatically on rebase conflicts
    pub manifests: Vec<String>,
    /// Manual rendering
    pub manual: ManualConfig,
    /// Logging
    pub log: LogConfig,
}

impl Default for TortillaConfig {
    fn default() -> Self {
        Self {
            steps_dir: PathBuf::from("steps"),
            manifests: vec!["package.json".to_string()],
            manual: ManualConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Templates wrapped around the production manual body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    /// Handlebars template for the header region
    pub header: String,
    /// Handlebars template for the footer region
    pub footer: String,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            header: "# Step {{step}}: {{title}}".to_string(),
            footer: "_End of Step {{step}}_".to_string(),
        }
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TortillaConfig {
    /// Candidate config files, most specific first
    pub fn search_paths(repo_root: &Path) -> Vec<PathBuf> {
        let mut paths = vec![repo_root.join(PROJECT_DIR).join(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tortilla").join(CONFIG_FILE));
        }
        paths
    }

    /// Load the first existing config file, or defaults
    pub fn load(repo_root: &Path) -> Result<Self> {
        for path in Self::search_paths(repo_root) {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Path of the instruction file for super step `number`
    pub fn instruction_path(&self, repo_root: &Path, number: u32) -> PathBuf {
        repo_root
            .join(&self.steps_dir)
            .join(crate::types::instruction_file_name(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TortillaConfig::default();
        assert_eq!(config.steps_dir, PathBuf::from("steps"));
        assert_eq!(config.manifests, vec!["package.json".to_string()]);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(PROJECT_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CONFIG_FILE),
            "steps_dir = \"docs/steps\"\n\n[manual]\nheader = \"## {{title}}\"\n",
        )
        .unwrap();

        let config = TortillaConfig::load(temp.path()).unwrap();
        assert_eq!(config.steps_dir, PathBuf::from("docs/steps"));
        assert_eq!(config.manual.header, "## {{title}}");
        assert_eq!(config.manual.footer, ManualConfig::default().footer);
        assert_eq!(config.manifests, vec!["package.json".to_string()]);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "steps_dir = [").unwrap();

        let err = TortillaConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("config.toml")));
    }

    #[test]
    fn test_instruction_path() {
        let config = TortillaConfig::default();
        assert_eq!(
            config.instruction_path(Path::new("/repo"), 3),
            PathBuf::from("/repo/steps/step3.md")
        );
    }
}
