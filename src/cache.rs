//! File-based caching for registry responses.
//!
//! Latest-version lookups hit the package registry once per package name per
//! run; across runs this cache avoids re-fetching names that were resolved
//! recently. Entries are JSON files with a TTL measured from their mtime.
//!
//! Cache location:
//! - Linux: `~/.cache/depmap/`
//! - macOS: `~/Library/Caches/depmap/`
//! - Windows: `%LOCALAPPDATA%\depmap\cache\`

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 24;

/// A file-based cache with TTL support.
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("depmap")
}

impl Cache {
    /// Creates a cache with the default 24-hour TTL.
    pub fn new() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl: Duration::from_secs(CACHE_TTL_HOURS * 3600),
        }
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl_hours(hours: u64) -> Self {
        Self {
            dir: default_cache_dir(),
            ttl: Duration::from_secs(hours * 3600),
        }
    }

    /// Creates a cache rooted at an explicit directory.
    pub fn with_dir(dir: PathBuf, ttl_hours: u64) -> Self {
        Self {
            dir,
            ttl: Duration::from_secs(ttl_hours * 3600),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Converts a cache key to a safe filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value, or `None` if the key is absent or expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(elapsed) = SystemTime::now().duration_since(modified) {
                    if elapsed > self.ttl {
                        let _ = fs::remove_file(&path);
                        return None;
                    }
                }
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value as a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Removes every cached entry.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);

        cache.set("latest_lodash", &"4.17.21".to_string()).unwrap();

        let value: Option<String> = cache.get("latest_lodash");
        assert_eq!(value, Some("4.17.21".to_string()));
    }

    #[test]
    fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);

        let value: Option<String> = cache.get("never_set");
        assert_eq!(value, None);
    }

    #[test]
    fn test_scoped_package_key_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);

        cache.set("latest_@types/node", &"20.0.0".to_string()).unwrap();

        let value: Option<String> = cache.get("latest_@types/node");
        assert_eq!(value, Some("20.0.0".to_string()));
        // The key must not have produced a nested path.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);

        cache.set("a", &1u32).unwrap();
        cache.set("b", &2u32).unwrap();
        cache.clear().unwrap();

        assert_eq!(cache.get::<u32>("a"), None);
        assert_eq!(cache.get::<u32>("b"), None);
    }
}
