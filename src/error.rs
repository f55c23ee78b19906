//! Error taxonomy for the scrape and aggregation pipeline.
//!
//! Failures are contained at the level they occur: a bad group file aborts the
//! run before any work, while a failed scrape is recorded and skipped so the
//! remaining projects still produce a combined report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading or parsing the package-group file. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read group file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse group file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reading a project's manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to launch an external tool. A process that starts but exits
/// non-zero is not an error; its output is consumed as-is.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{command}` in {dir}: {source}")]
    Launch {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The audit stream as a whole was unusable. Individual bad lines are
/// skipped with a warning and never surface here.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit output malformed: {reason}")]
    Malformed { reason: String },
}

/// Per-project rollup of everything that can sink a scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Latest-version lookup failures. These propagate out of aggregation:
/// every newly-seen package needs its latest version, so a dead registry
/// fails the run rather than producing a report with holes.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request for {package} failed: {source}")]
    Http {
        package: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry response for {package} carries no latest version")]
    MissingVersion { package: String },
}
