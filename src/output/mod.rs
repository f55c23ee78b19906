//! Report output: the combined JSON artifact plus a CLI summary table.

use anyhow::Result;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::model::CombinedReport;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Projects")]
    projects: usize,
    #[tabled(rename = "Packages")]
    packages: usize,
    #[tabled(rename = "Findings")]
    findings: u32,
}

/// Writes the pretty-printed combined report to disk. Written exactly once
/// per run.
pub fn write_combined(path: &Path, report: &CombinedReport) -> Result<()> {
    let json = report.to_pretty_json()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Prints one summary row per group.
pub fn print_summary(report: &CombinedReport) {
    if report.0.is_empty() {
        println!("No groups aggregated.");
        return;
    }

    let rows: Vec<GroupRow> = report
        .0
        .iter()
        .map(|(name, group)| GroupRow {
            group: name.clone(),
            projects: group.project_ids().len(),
            packages: group.package_count(),
            findings: group.finding_count(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupReport, VersionUsage};

    #[test]
    fn test_write_combined_round_trips() {
        let mut group = GroupReport::default();
        let mut usage = VersionUsage::new("4.17.21");
        usage.versions.insert("^4.17.0".into(), vec!["svc-a".into()]);
        group.dependencies.insert("lodash".into(), usage);

        let mut report = CombinedReport::default();
        report.0.insert("api".into(), group);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packageMap.json");
        write_combined(&path, &report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let back: CombinedReport = serde_json::from_str(&content).unwrap();
        assert_eq!(back, report);
    }
}
