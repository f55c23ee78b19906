//! Per-project scraping.
//!
//! A scrape runs three strictly sequential steps: read the project's
//! manifest, prune dependencies the usage checker reports as unused, then
//! run the vulnerability audit and correlate its findings back onto the
//! pruned sets. Pruning must happen before the audit so findings are only
//! attributed to dependencies that are actually in use.

pub mod audit;
pub mod depcheck;

pub use audit::{correlate, AuditOutcome};
pub use depcheck::{apply as prune, PruneOutcome};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AuditError, ManifestError, ProcessError, ScrapeError};
use crate::model::ProjectReport;
use crate::process::run_capture;

/// Name of the per-project manifest file.
const MANIFEST_FILE: &str = "package.json";

/// Scrapes one project: manifest, prune, audit.
pub struct Scraper {
    audit_level: String,
    prune: bool,
    audit: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Manifest {
    dependencies: BTreeMap<String, String>,
    peer_dependencies: BTreeMap<String, String>,
    dev_dependencies: BTreeMap<String, String>,
}

impl Scraper {
    pub fn new(audit_level: impl Into<String>) -> Self {
        Self {
            audit_level: audit_level.into(),
            prune: true,
            audit: true,
        }
    }

    /// Disables the usage-checker step.
    pub fn without_prune(mut self) -> Self {
        self.prune = false;
        self
    }

    /// Disables the vulnerability-audit step.
    pub fn without_audit(mut self) -> Self {
        self.audit = false;
        self
    }

    /// Reads the project's declared dependency sets into a fresh report.
    ///
    /// # Errors
    ///
    /// [`ManifestError::Read`] if the manifest is missing or unreadable,
    /// [`ManifestError::Parse`] if it is not valid JSON.
    pub fn read_manifest(project_path: &Path) -> Result<ProjectReport, ManifestError> {
        let path = project_path.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse { path, source })?;

        Ok(ProjectReport {
            dependencies: manifest.dependencies,
            peer_dependencies: manifest.peer_dependencies,
            dev_dependencies: manifest.dev_dependencies,
            ..ProjectReport::default()
        })
    }

    /// Runs the usage checker and prunes unused entries from the report.
    /// Unparsable checker output leaves the report untouched.
    pub async fn prune_unused(
        &self,
        project_path: &Path,
        report: &mut ProjectReport,
    ) -> Result<PruneOutcome, ProcessError> {
        let output = run_capture(project_path, "npx", &["depcheck", "--json"]).await?;
        let outcome = prune(&output, report);
        if let PruneOutcome::Pruned(removed) = outcome {
            tracing::debug!(?project_path, removed, "pruned unused dependencies");
        }
        Ok(outcome)
    }

    /// Runs the vulnerability audit and correlates its findings onto the
    /// report's (already pruned) dependency sets.
    pub async fn run_audit(
        &self,
        project_path: &Path,
        report: &mut ProjectReport,
    ) -> Result<(), ScrapeError> {
        let level = format!("--level={}", self.audit_level);
        let output =
            run_capture(project_path, "yarn", &["audit", "--json", level.as_str()]).await?;

        match correlate(&output, report) {
            AuditOutcome::Correlated { attributed, dropped } => {
                tracing::debug!(?project_path, attributed, dropped, "audit correlated");
                Ok(())
            }
            AuditOutcome::Failed(reason) => Err(AuditError::Malformed { reason }.into()),
        }
    }

    /// Full scrape for one project.
    pub async fn scrape(&self, project_path: &Path) -> Result<ProjectReport, ScrapeError> {
        let mut report = Self::read_manifest(project_path)?;

        if self.prune {
            self.prune_unused(project_path, &mut report).await?;
        }
        if self.audit {
            self.run_audit(project_path, &mut report).await?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_manifest_all_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
                "name": "svc-a",
                "dependencies": {"lodash": "^4.17.0"},
                "peerDependencies": {"react": "^18.0.0"},
                "devDependencies": {"eslint": "^8.0.0"}
            }"#,
        )
        .unwrap();

        let report = Scraper::read_manifest(dir.path()).unwrap();

        assert_eq!(report.dependencies["lodash"], "^4.17.0");
        assert_eq!(report.peer_dependencies["react"], "^18.0.0");
        assert_eq!(report.dev_dependencies["eslint"], "^8.0.0");
        assert!(report.dependencies_audit.is_empty());
    }

    #[test]
    fn test_read_manifest_absent_fields_default_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "bare"}"#).unwrap();

        let report = Scraper::read_manifest(dir.path()).unwrap();

        assert_eq!(report.declared_count(), 0);
    }

    #[test]
    fn test_read_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let err = Scraper::read_manifest(dir.path()).unwrap_err();

        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn test_read_manifest_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ not json").unwrap();

        let err = Scraper::read_manifest(dir.path()).unwrap_err();

        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
