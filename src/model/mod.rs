//! Core data types for per-project reports and cross-project aggregation.
//!
//! This module contains the fundamental types used throughout depmap:
//!
//! - [`ProjectReport`] - One project's pruned dependencies plus audit findings
//! - [`DepKind`] - Runtime, peer, or development dependency category
//! - [`AuditStats`] - Severity label -> occurrence count
//! - [`GroupReport`] - Cross-project aggregation for one package group
//! - [`CombinedReport`] - The final group name -> report artifact

mod combined;
mod report;

pub use combined::*;
pub use report::*;
