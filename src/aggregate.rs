//! Cross-project aggregation.
//!
//! Folds every scraped [`ProjectReport`] in a group into one
//! [`GroupReport`]: per dependency kind, which exact versions of which
//! packages are in use and by which projects, and in parallel which
//! versions carry which audit severities. The aggregator owns the
//! latest-version memo, so the external lookup runs at most once per
//! package name per run, even when a name recurs across groups.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::model::{
    AuditEntry, AuditStats, CombinedReport, DepKind, DependencySet, GroupReport, ProjectReport,
    VersionAudit, VersionUsage,
};
use crate::registry::LatestVersionLookup;

/// One group's scraped inputs: ordered `(project, report)` pairs.
pub type ScrapedGroup = Vec<(String, ProjectReport)>;

pub struct Aggregator {
    lookup: Box<dyn LatestVersionLookup>,
    latest_memo: HashMap<String, String>,
}

impl Aggregator {
    pub fn new(lookup: Box<dyn LatestVersionLookup>) -> Self {
        Self {
            lookup,
            latest_memo: HashMap::new(),
        }
    }

    /// Memoized latest-version fetch.
    async fn latest(&mut self, package: &str) -> Result<String, RegistryError> {
        if let Some(version) = self.latest_memo.get(package) {
            return Ok(version.clone());
        }
        let version = self.lookup.latest(package).await?;
        self.latest_memo
            .insert(package.to_string(), version.clone());
        Ok(version)
    }

    /// Merges one project's report into a group accumulator. Projects must
    /// be added in configuration order; version buckets record projects in
    /// the order they arrive here.
    pub async fn add_project(
        &mut self,
        group: &mut GroupReport,
        project: &str,
        report: &ProjectReport,
    ) -> Result<(), RegistryError> {
        for kind in DepKind::PRIORITY {
            self.merge_usage(project, report.deps(kind), group.usage_mut(kind))
                .await?;
            merge_audit(
                project,
                report.deps(kind),
                report.audit(kind),
                group.audit_mut(kind),
            );
        }
        Ok(())
    }

    async fn merge_usage(
        &mut self,
        project: &str,
        deps: &DependencySet,
        usage: &mut std::collections::BTreeMap<String, VersionUsage>,
    ) -> Result<(), RegistryError> {
        for (name, version) in deps {
            match usage.get_mut(name) {
                Some(entry) => entry
                    .versions
                    .entry(version.clone())
                    .or_default()
                    .push(project.to_string()),
                None => {
                    let latest = self.latest(name).await?;
                    let mut entry = VersionUsage::new(latest);
                    entry
                        .versions
                        .insert(version.clone(), vec![project.to_string()]);
                    usage.insert(name.clone(), entry);
                }
            }
        }
        Ok(())
    }

    /// Folds every group's scraped projects into the combined report.
    pub async fn combine(
        &mut self,
        groups: &[(String, ScrapedGroup)],
    ) -> Result<CombinedReport, RegistryError> {
        let mut combined = CombinedReport::default();
        for (group_name, projects) in groups {
            let mut group = GroupReport::default();
            for (project, report) in projects {
                self.add_project(&mut group, project, report).await?;
            }
            combined.0.insert(group_name.clone(), group);
        }
        Ok(combined)
    }
}

fn merge_audit(
    project: &str,
    deps: &DependencySet,
    audits: &std::collections::BTreeMap<String, AuditStats>,
    global: &mut std::collections::BTreeMap<String, VersionAudit>,
) {
    for (name, stats) in audits {
        // The correlator only creates audit entries for declared names, so
        // a missing version means the report was assembled by hand wrong.
        let Some(version) = deps.get(name) else {
            tracing::warn!(package = %name, "audit entry without a declared version, skipping");
            continue;
        };

        let buckets = global.entry(name.clone()).or_default();
        match buckets.get_mut(version) {
            // An existing bucket only gains the project; its stats stay as
            // the first-seen project reported them, since both projects saw
            // the same advisories for this version.
            Some(entry) => entry.projects.push(project.to_string()),
            None => {
                buckets.insert(
                    version.clone(),
                    AuditEntry {
                        projects: vec![project.to_string()],
                        stats: stats.clone(),
                    },
                );
            }
        }
    }
}
