//! Configuration handling.
//!
//! Two documents drive a run:
//!
//! - The **tool config**, a TOML file with registry and audit settings,
//!   stored at the platform config dir (`~/.config/depmap/config.toml` on
//!   Linux). Optional; defaults apply when absent.
//! - The **package-group file** (default `./packages.json`), mapping each
//!   group name to the projects to scrape. A group file that fails to parse
//!   aborts the run before any scraping starts.
//!
//! # Example group file
//!
//! ```json
//! {
//!   "api": [
//!     { "name": "svc-a", "path": "./services/svc-a" },
//!     { "name": "svc-b", "path": "/abs/path/svc-b" }
//!   ]
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the package registry used for latest-version lookups.
    ///
    /// Default: `https://registry.npmjs.org`
    pub registry_url: String,

    /// How long to cache registry responses, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Minimum severity passed to the audit tool (`--level=<value>`).
    ///
    /// Default: "low"
    pub audit_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: "https://registry.npmjs.org".to_string(),
            cache_ttl_hours: 24,
            audit_level: "low".to_string(),
        }
    }
}

impl Config {
    /// Loads the tool config, falling back to defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depmap")
            .join("config.toml")
    }

    /// Renders the default configuration as TOML, for `config --init`.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// One project inside a package group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub path: PathBuf,
}

impl ProjectEntry {
    /// Resolves the project path against the invocation directory.
    pub fn resolved_path(&self, base: &Path) -> PathBuf {
        if self.path.is_relative() {
            base.join(&self.path)
        } else {
            self.path.clone()
        }
    }
}

/// The package-group file: group name -> ordered project list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageGroups(pub BTreeMap<String, Vec<ProjectEntry>>);

impl PackageGroups {
    /// Reads and parses a group file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`]; both are fatal to
    /// the run.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn project_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.registry_url, "https://registry.npmjs.org");
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.audit_level, "low");
    }

    #[test]
    fn test_config_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(r#"audit_level = "high""#).unwrap();

        assert_eq!(config.audit_level, "high");
        assert_eq!(config.cache_ttl_hours, 24);
    }

    #[test]
    fn test_group_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.json");
        fs::write(
            &path,
            r#"{"api": [{"name": "svc-a", "path": "./svc-a"}, {"name": "svc-b", "path": "/opt/svc-b"}]}"#,
        )
        .unwrap();

        let groups = PackageGroups::load(&path).unwrap();

        assert_eq!(groups.project_count(), 2);
        let api = &groups.0["api"];
        assert_eq!(api[0].name, "svc-a");
        assert_eq!(api[1].path, PathBuf::from("/opt/svc-b"));
    }

    #[test]
    fn test_group_file_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.json");
        fs::write(&path, "{ broken").unwrap();

        let err = PackageGroups::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_group_file_missing() {
        let err = PackageGroups::load(Path::new("/no/such/packages.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_resolved_path() {
        let entry = ProjectEntry {
            name: "svc-a".into(),
            path: PathBuf::from("./svc-a"),
        };
        assert_eq!(
            entry.resolved_path(Path::new("/work")),
            PathBuf::from("/work/./svc-a")
        );

        let absolute = ProjectEntry {
            name: "svc-b".into(),
            path: PathBuf::from("/opt/svc-b"),
        };
        assert_eq!(
            absolute.resolved_path(Path::new("/work")),
            PathBuf::from("/opt/svc-b")
        );
    }
}
