//! Audit correlator.
//!
//! Parses the audit tool's line-delimited JSON stream and attributes each
//! finding's severity to the top-level dependency at the head of its
//! dependency chain. Blank and malformed lines are skipped; a stream with no
//! parsable line at all is rejected, since that means the tool's output
//! contract was not met.

use serde::Deserialize;

use crate::model::ProjectReport;

/// Severity chains are reported as `direct>intermediate>vulnerable`.
const CHAIN_DELIMITER: char = '>';

/// Outcome of correlating one audit stream. Deliberately distinct from the
/// prune path's [`PruneOutcome`](super::depcheck::PruneOutcome): pruning
/// fails open, correlation fails closed.
#[derive(Debug, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The stream was consumed; counts of attributed and dropped findings.
    Correlated { attributed: u32, dropped: u32 },
    /// No line of a non-empty stream could be parsed.
    Failed(String),
}

#[derive(Deserialize)]
struct AuditLine {
    data: Option<AuditData>,
}

#[derive(Deserialize)]
struct AuditData {
    advisory: Option<Advisory>,
}

#[derive(Deserialize)]
struct Advisory {
    severity: String,
    #[serde(default)]
    findings: Vec<Finding>,
}

#[derive(Deserialize)]
struct Finding {
    #[serde(default)]
    paths: Vec<String>,
}

/// Walks the audit stream line by line and populates the report's audit
/// maps. The report's dependency sets must already be pruned, otherwise
/// findings get attributed to dependencies that are not actually in use.
pub fn correlate(output: &str, report: &mut ProjectReport) -> AuditOutcome {
    let mut attributed = 0u32;
    let mut dropped = 0u32;
    let mut seen_lines = 0u32;
    let mut bad_lines = 0u32;

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        seen_lines += 1;

        let parsed: AuditLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                bad_lines += 1;
                tracing::warn!(%err, "skipping unparsable audit line");
                continue;
            }
        };

        let Some(advisory) = parsed.data.and_then(|data| data.advisory) else {
            continue;
        };

        for finding in &advisory.findings {
            for path in &finding.paths {
                let top_level = path
                    .split(CHAIN_DELIMITER)
                    .next()
                    .unwrap_or(path.as_str());

                // Findings whose chain head is not declared top-level are
                // dropped: the advisory concerns a pruned or purely
                // transitive dependency.
                match report.kind_of(top_level) {
                    Some(kind) => {
                        report
                            .audit_mut(kind)
                            .entry(top_level.to_string())
                            .or_default()
                            .bump(&advisory.severity);
                        attributed += 1;
                    }
                    None => dropped += 1,
                }
            }
        }
    }

    if seen_lines > 0 && bad_lines == seen_lines {
        return AuditOutcome::Failed(format!(
            "none of {seen_lines} non-blank lines parsed as JSON"
        ));
    }

    AuditOutcome::Correlated { attributed, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory_line(severity: &str, paths: &[&str]) -> String {
        let paths = paths
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{{\"type\":\"auditAdvisory\",\"data\":{{\"advisory\":{{\"severity\":\"{severity}\",\"findings\":[{{\"paths\":[{paths}]}}]}}}}}}"
        )
    }

    fn report_with_runtime(name: &str, version: &str) -> ProjectReport {
        let mut report = ProjectReport::default();
        report.dependencies.insert(name.into(), version.into());
        report
    }

    #[test]
    fn test_high_severity_chain_attributed_to_chain_head() {
        let mut report = report_with_runtime("left-pad", "^1.3.0");
        let output = advisory_line("high", &["left-pad>is-even"]);

        let outcome = correlate(&output, &mut report);

        assert_eq!(
            outcome,
            AuditOutcome::Correlated {
                attributed: 1,
                dropped: 0
            }
        );
        assert_eq!(report.dependencies_audit["left-pad"].count("high"), 1);
    }

    #[test]
    fn test_undeclared_chain_head_is_dropped() {
        let mut report = report_with_runtime("left-pad", "^1.3.0");
        let output = advisory_line("critical", &["minimist>something"]);

        let outcome = correlate(&output, &mut report);

        assert_eq!(
            outcome,
            AuditOutcome::Correlated {
                attributed: 0,
                dropped: 1
            }
        );
        assert!(report.dependencies_audit.is_empty());
        assert!(report.peer_dependencies_audit.is_empty());
        assert!(report.dev_dependencies_audit.is_empty());
    }

    #[test]
    fn test_kind_priority_runtime_before_dev() {
        let mut report = ProjectReport::default();
        report.dependencies.insert("shared".into(), "1.0.0".into());
        report.dev_dependencies.insert("shared".into(), "1.0.0".into());

        let output = advisory_line("moderate", &["shared>inner"]);
        correlate(&output, &mut report);

        assert_eq!(report.dependencies_audit["shared"].count("moderate"), 1);
        assert!(report.dev_dependencies_audit.is_empty());
    }

    #[test]
    fn test_each_path_counts_once() {
        let mut report = report_with_runtime("lodash", "^4.17.0");
        let output = advisory_line("low", &["lodash>a>b", "lodash>c"]);

        correlate(&output, &mut report);

        assert_eq!(report.dependencies_audit["lodash"].count("low"), 2);
    }

    #[test]
    fn test_blank_and_non_advisory_lines_skipped() {
        let mut report = report_with_runtime("lodash", "^4.17.0");
        let output = format!(
            "\n{{\"type\":\"auditSummary\",\"data\":{{\"vulnerabilities\":{{}}}}}}\n\n{}\n",
            advisory_line("high", &["lodash>x"])
        );

        let outcome = correlate(&output, &mut report);

        assert_eq!(
            outcome,
            AuditOutcome::Correlated {
                attributed: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn test_bad_line_skipped_when_stream_otherwise_parses() {
        let mut report = report_with_runtime("lodash", "^4.17.0");
        let output = format!("not json at all\n{}", advisory_line("high", &["lodash>x"]));

        let outcome = correlate(&output, &mut report);

        assert_eq!(
            outcome,
            AuditOutcome::Correlated {
                attributed: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn test_entirely_unparsable_stream_fails() {
        let mut report = report_with_runtime("lodash", "^4.17.0");

        let outcome = correlate("garbage\nmore garbage\n", &mut report);

        assert!(matches!(outcome, AuditOutcome::Failed(_)));
        assert!(report.dependencies_audit.is_empty());
    }

    #[test]
    fn test_empty_stream_is_a_clean_no_op() {
        let mut report = report_with_runtime("lodash", "^4.17.0");

        let outcome = correlate("", &mut report);

        assert_eq!(
            outcome,
            AuditOutcome::Correlated {
                attributed: 0,
                dropped: 0
            }
        );
    }
}
