//! Usage-checker output handling.
//!
//! depcheck reports unused dependencies as arrays of package names per
//! dependency kind. Pruning fails open: if the checker's output cannot be
//! parsed the report passes through untouched, because an analysis-tool
//! glitch should not block the audit pipeline.

use serde::Deserialize;

use crate::model::{DepKind, ProjectReport};

/// Outcome of applying the usage checker to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    /// Output parsed; this many entries were removed (possibly zero).
    Pruned(usize),
    /// Output was unparsable; the report was left unmodified.
    PassThrough,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UnusedReport {
    dependencies: Vec<String>,
    peer_dependencies: Vec<String>,
    dev_dependencies: Vec<String>,
}

impl UnusedReport {
    fn unused(&self, kind: DepKind) -> &[String] {
        match kind {
            DepKind::Runtime => &self.dependencies,
            DepKind::Peer => &self.peer_dependencies,
            DepKind::Dev => &self.dev_dependencies,
        }
    }
}

/// Removes every dependency the checker flagged as unused from the matching
/// set in the report.
pub fn apply(checker_output: &str, report: &mut ProjectReport) -> PruneOutcome {
    let unused: UnusedReport = match serde_json::from_str(checker_output) {
        Ok(unused) => unused,
        Err(err) => {
            tracing::warn!(%err, "usage checker output unparsable, skipping prune");
            return PruneOutcome::PassThrough;
        }
    };

    let mut removed = 0;
    for kind in DepKind::PRIORITY {
        let set = report.deps_mut(kind);
        for name in unused.unused(kind) {
            if set.remove(name).is_some() {
                removed += 1;
            }
        }
    }

    PruneOutcome::Pruned(removed)
}
