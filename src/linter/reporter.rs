use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::types::{FindingOrigin, LintFinding, LintReport, Result, Severity, short_hash};

pub struct Reporter;

impl Reporter {
    pub fn write_json<P: AsRef<Path>>(report: &LintReport, output_path: P) -> Result<()> {
        fs::write(output_path, serde_json::to_string_pretty(report)?)?;
        Ok(())
    }

    /// Plain-text rendering of a report
    pub fn render(report: &LintReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Lint Report ({})", short_hash(&report.content_hash));
        let _ = writeln!(out, "══════════════════════════════════════");
        let _ = writeln!(out);

        if report.findings.is_empty() {
            let _ = writeln!(out, "No issues found.");
        } else {
            let _ = writeln!(out, "Findings ({}):", report.findings.len());
            let _ = writeln!(out);
            for finding in &report.findings {
                render_finding(&mut out, finding);
            }
        }

        let _ = writeln!(out, "══════════════════════════════════════");
        if report.has_errors() {
            let _ = write!(
                out,
                "Result: FAILED ({} errors, {} warnings)",
                report.error_count(),
                report.warning_count()
            );
        } else if report.warning_count() > 0 {
            let _ = write!(out, "Result: PASSED with warnings ({})", report.warning_count());
        } else {
            let _ = write!(out, "Result: PASSED ✓");
        }
        out
    }

    pub fn print_summary(report: &LintReport) {
        println!("{}", Self::render(report));
    }
}

fn render_finding(out: &mut String, finding: &LintFinding) {
    let icon = match finding.severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
    };
    let source = match (&finding.origin, &finding.rule) {
        (FindingOrigin::Structural, Some(rule)) => rule.as_str(),
        (FindingOrigin::Structural, None) => "structural",
        (FindingOrigin::Semantic, _) => "semantic",
    };

    let _ = write!(
        out,
        "{} [{}] {}",
        icon,
        finding.severity.to_string().to_uppercase(),
        finding.message
    );
    if let Some(anchor) = &finding.location {
        match (anchor.line, &anchor.section) {
            (Some(line), _) => {
                let _ = write!(out, " (line {})", line);
            }
            (None, Some(section)) => {
                let _ = write!(out, " (in '{}')", section);
            }
            (None, None) => {}
        }
    }
    let _ = writeln!(out, "  <{}>", source);
    if !finding.suggestion.is_empty() {
        let _ = writeln!(out, "  → {}", finding.suggestion);
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> LintReport {
        LintReport::new(
            "0123456789abcdef",
            vec![
                LintFinding::structural("required-sections", Severity::Error, "Missing required section: Overview", "Add a '## Overview' section"),
                LintFinding::semantic(Severity::Warning, "Installation instructions may be insufficient", "Consider adding prerequisites")
                    .in_section("Installation"),
            ],
        )
    }

    #[test]
    fn test_render_lists_findings_in_order() {
        let text = Reporter::render(&sample());
        let first = text.find("Missing required section").unwrap();
        let second = text.find("Installation instructions").unwrap();
        assert!(first < second);
        assert!(text.contains("<required-sections>"));
        assert!(text.contains("(in 'Installation')"));
        assert!(text.contains("FAILED (1 errors, 1 warnings)"));
        assert!(text.starts_with("Lint Report (0123456789ab)"));
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        Reporter::write_json(&sample(), &path).unwrap();
        let parsed: LintReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample());
    }
}
