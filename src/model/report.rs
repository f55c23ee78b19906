use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared dependencies of one kind: package name -> version string.
pub type DependencySet = BTreeMap<String, String>;

/// The three dependency categories a manifest declares.
///
/// A package name belongs to at most one kind per project, but different
/// projects may declare the same name under different kinds, so the kinds
/// are always tracked in separate maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    Runtime,
    Peer,
    Dev,
}

impl DepKind {
    /// Correlation checks kinds in this fixed priority order.
    pub const PRIORITY: [DepKind; 3] = [DepKind::Runtime, DepKind::Peer, DepKind::Dev];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepKind::Runtime => "runtime",
            DepKind::Peer => "peer",
            DepKind::Dev => "dev",
        }
    }
}

impl std::fmt::Display for DepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Occurrence counts per severity label (`low`, `moderate`, `high`,
/// `critical`, ...). Labels are kept as free-form strings so severities this
/// tool has never heard of still pass through intact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditStats(pub BTreeMap<String, u32>);

impl AuditStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count for a severity label, starting at 1.
    pub fn bump(&mut self, severity: &str) {
        *self.0.entry(severity.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, severity: &str) -> u32 {
        self.0.get(severity).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One project's pruned dependency sets plus the audit findings attributed
/// to them, one audit map per dependency kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectReport {
    pub dependencies: DependencySet,
    pub peer_dependencies: DependencySet,
    pub dev_dependencies: DependencySet,
    pub dependencies_audit: BTreeMap<String, AuditStats>,
    pub peer_dependencies_audit: BTreeMap<String, AuditStats>,
    pub dev_dependencies_audit: BTreeMap<String, AuditStats>,
}

impl ProjectReport {
    pub fn deps(&self, kind: DepKind) -> &DependencySet {
        match kind {
            DepKind::Runtime => &self.dependencies,
            DepKind::Peer => &self.peer_dependencies,
            DepKind::Dev => &self.dev_dependencies,
        }
    }

    pub fn deps_mut(&mut self, kind: DepKind) -> &mut DependencySet {
        match kind {
            DepKind::Runtime => &mut self.dependencies,
            DepKind::Peer => &mut self.peer_dependencies,
            DepKind::Dev => &mut self.dev_dependencies,
        }
    }

    pub fn audit(&self, kind: DepKind) -> &BTreeMap<String, AuditStats> {
        match kind {
            DepKind::Runtime => &self.dependencies_audit,
            DepKind::Peer => &self.peer_dependencies_audit,
            DepKind::Dev => &self.dev_dependencies_audit,
        }
    }

    pub fn audit_mut(&mut self, kind: DepKind) -> &mut BTreeMap<String, AuditStats> {
        match kind {
            DepKind::Runtime => &mut self.dependencies_audit,
            DepKind::Peer => &mut self.peer_dependencies_audit,
            DepKind::Dev => &mut self.dev_dependencies_audit,
        }
    }

    /// Looks up which kind declares a package, in priority order.
    pub fn kind_of(&self, name: &str) -> Option<DepKind> {
        DepKind::PRIORITY
            .into_iter()
            .find(|kind| self.deps(*kind).contains_key(name))
    }

    /// Total number of declared dependencies across all kinds.
    pub fn declared_count(&self) -> usize {
        self.dependencies.len() + self.peer_dependencies.len() + self.dev_dependencies.len()
    }

    /// Total number of attributed audit findings across all kinds.
    pub fn finding_count(&self) -> u32 {
        DepKind::PRIORITY
            .into_iter()
            .map(|kind| self.audit(kind).values().map(AuditStats::total).sum::<u32>())
            .sum()
    }
}
