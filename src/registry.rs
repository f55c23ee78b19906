use async_trait::async_trait;
use serde::Deserialize;

use crate::cache::Cache;
use crate::config::Config;
use crate::error::RegistryError;

/// Resolves a package name to its most recently published version.
#[async_trait]
pub trait LatestVersionLookup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the latest published version string for a package.
    ///
    /// # Errors
    ///
    /// Fails if the registry cannot be reached or its response carries no
    /// latest version.
    async fn latest(&self, package: &str) -> Result<String, RegistryError>;
}

/// npm registry client backed by the file cache.
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
    cache: Cache,
}

#[derive(Deserialize)]
struct PackageInfo {
    #[serde(rename = "dist-tags")]
    dist_tags: Option<DistTags>,
}

#[derive(Deserialize)]
struct DistTags {
    latest: Option<String>,
}

impl NpmRegistry {
    pub fn new(base_url: impl Into<String>, cache: Cache) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache,
        }
    }

    fn cache_key(package: &str) -> String {
        format!("latest_{}", package)
    }
}

#[async_trait]
impl LatestVersionLookup for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm registry"
    }

    async fn latest(&self, package: &str) -> Result<String, RegistryError> {
        let cache_key = Self::cache_key(package);
        if let Some(version) = self.cache.get::<String>(&cache_key) {
            return Ok(version);
        }

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), package);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| RegistryError::Http {
                package: package.to_string(),
                source,
            })?;

        let info: PackageInfo =
            response
                .json()
                .await
                .map_err(|source| RegistryError::Http {
                    package: package.to_string(),
                    source,
                })?;

        let version = info
            .dist_tags
            .and_then(|tags| tags.latest)
            .ok_or_else(|| RegistryError::MissingVersion {
                package: package.to_string(),
            })?;

        let _ = self.cache.set(&cache_key, &version);

        Ok(version)
    }
}

/// Builds the production lookup from the tool configuration.
pub fn default_lookup(config: &Config) -> NpmRegistry {
    NpmRegistry::new(
        config.registry_url.clone(),
        Cache::with_ttl_hours(config.cache_ttl_hours),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cached_version_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);
        cache
            .set(&NpmRegistry::cache_key("lodash"), &"4.17.21".to_string())
            .unwrap();

        // Unroutable base URL: any network attempt would error out.
        let registry = NpmRegistry::new("http://127.0.0.1:1", cache);

        let version = registry.latest("lodash").await.unwrap();
        assert_eq!(version, "4.17.21");
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_an_http_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_dir(dir.path().to_path_buf(), 24);
        let registry = NpmRegistry::new("http://127.0.0.1:1", cache);

        let err = registry.latest("lodash").await.unwrap_err();
        assert!(matches!(err, RegistryError::Http { .. }));
    }

    #[test]
    fn test_dist_tags_shape() {
        let info: PackageInfo =
            serde_json::from_str(r#"{"dist-tags":{"latest":"4.17.21","next":"5.0.0-beta"}}"#)
                .unwrap();
        assert_eq!(info.dist_tags.unwrap().latest.unwrap(), "4.17.21");
    }
}
