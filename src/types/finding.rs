use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(format!(
                "Unknown severity: {}. Valid values: warning, error",
                s
            )),
        }
    }
}

/// Which pass produced a finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FindingOrigin {
    Structural,
    Semantic,
}

/// Location inside a draft document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// 1-based line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Heading text of the enclosing section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A single lint issue. Derived and read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Anchor>,
    pub origin: FindingOrigin,
    /// Rule id for structural findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl LintFinding {
    pub fn structural(
        rule: &str,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
            location: None,
            origin: FindingOrigin::Structural,
            rule: Some(rule.to_string()),
        }
    }

    pub fn semantic(
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
            location: None,
            origin: FindingOrigin::Semantic,
            rule: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.location.get_or_insert_with(Anchor::default).line = Some(line);
        self
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.location.get_or_insert_with(Anchor::default).section = Some(section.into());
        self
    }
}

/// Findings plus the exact content hash they were computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub content_hash: String,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn new(content_hash: impl Into<String>, findings: Vec<LintFinding>) -> Self {
        Self {
            content_hash: content_hash.into(),
            findings,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Error);
        assert!("info".parse::<Severity>().is_err());
    }

    #[test]
    fn test_anchor_builders() {
        let finding = LintFinding::semantic(Severity::Warning, "vague", "be specific")
            .in_section("Overview")
            .at_line(3);
        let anchor = finding.location.unwrap();
        assert_eq!(anchor.line, Some(3));
        assert_eq!(anchor.section.as_deref(), Some("Overview"));
    }

    #[test]
    fn test_report_counts() {
        let report = LintReport::new(
            "h",
            vec![
                LintFinding::structural("title", Severity::Warning, "a", "b"),
                LintFinding::structural("required-sections", Severity::Error, "c", "d"),
            ],
        );
        assert!(report.has_errors());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }
}
