use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::report::{AuditStats, DepKind};

/// Version buckets for one package across a group: which exact version
/// strings are in use and by which projects, plus the latest published
/// version fetched from the registry.
///
/// The latest version serializes under `_latest_` so it can never collide
/// with a real version-string key in the flattened map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionUsage {
    #[serde(rename = "_latest_")]
    pub latest: String,
    #[serde(flatten)]
    pub versions: BTreeMap<String, Vec<String>>,
}

impl VersionUsage {
    pub fn new(latest: impl Into<String>) -> Self {
        Self {
            latest: latest.into(),
            versions: BTreeMap::new(),
        }
    }
}

/// One audited version bucket: the projects using this version and the
/// severity statistics attributed to it.
///
/// When several projects report the same package at the same version, only
/// the project list grows; the stats stay as reported by the first-seen
/// project, since the counts describe the same advisories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub projects: Vec<String>,
    pub stats: AuditStats,
}

/// Audited version buckets for one package: version string -> entry.
pub type VersionAudit = BTreeMap<String, AuditEntry>;

/// Cross-project aggregation for one package group. Usage and audit maps are
/// kept per dependency kind, mirroring the per-project reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupReport {
    pub dependencies: BTreeMap<String, VersionUsage>,
    pub peer_dependencies: BTreeMap<String, VersionUsage>,
    pub dev_dependencies: BTreeMap<String, VersionUsage>,
    pub dependencies_audit: BTreeMap<String, VersionAudit>,
    pub peer_dependencies_audit: BTreeMap<String, VersionAudit>,
    pub dev_dependencies_audit: BTreeMap<String, VersionAudit>,
}

impl GroupReport {
    pub fn usage(&self, kind: DepKind) -> &BTreeMap<String, VersionUsage> {
        match kind {
            DepKind::Runtime => &self.dependencies,
            DepKind::Peer => &self.peer_dependencies,
            DepKind::Dev => &self.dev_dependencies,
        }
    }

    pub fn usage_mut(&mut self, kind: DepKind) -> &mut BTreeMap<String, VersionUsage> {
        match kind {
            DepKind::Runtime => &mut self.dependencies,
            DepKind::Peer => &mut self.peer_dependencies,
            DepKind::Dev => &mut self.dev_dependencies,
        }
    }

    pub fn audit(&self, kind: DepKind) -> &BTreeMap<String, VersionAudit> {
        match kind {
            DepKind::Runtime => &self.dependencies_audit,
            DepKind::Peer => &self.peer_dependencies_audit,
            DepKind::Dev => &self.dev_dependencies_audit,
        }
    }

    pub fn audit_mut(&mut self, kind: DepKind) -> &mut BTreeMap<String, VersionAudit> {
        match kind {
            DepKind::Runtime => &mut self.dependencies_audit,
            DepKind::Peer => &mut self.peer_dependencies_audit,
            DepKind::Dev => &mut self.dev_dependencies_audit,
        }
    }

    /// Number of distinct packages across all kinds.
    pub fn package_count(&self) -> usize {
        DepKind::PRIORITY
            .into_iter()
            .map(|kind| self.usage(kind).len())
            .sum()
    }

    /// Total attributed findings across all kinds and version buckets.
    pub fn finding_count(&self) -> u32 {
        DepKind::PRIORITY
            .into_iter()
            .flat_map(|kind| self.audit(kind).values())
            .flat_map(|buckets| buckets.values())
            .map(|entry| entry.stats.total())
            .sum()
    }

    /// Distinct project identifiers appearing anywhere in this report.
    pub fn project_ids(&self) -> BTreeSet<&str> {
        DepKind::PRIORITY
            .into_iter()
            .flat_map(|kind| self.usage(kind).values())
            .flat_map(|usage| usage.versions.values())
            .flat_map(|projects| projects.iter())
            .map(String::as_str)
            .collect()
    }
}

/// The root output artifact: group name -> aggregated report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedReport(pub BTreeMap<String, GroupReport>);

impl CombinedReport {
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
