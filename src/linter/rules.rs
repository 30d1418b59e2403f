//! Structural lint rules.
//!
//! Rules run in a fixed order and each emits findings in line order, so the
//! same text always yields the same list.

use std::collections::HashMap;

use super::markdown::{Heading, Outline};
use crate::config::LintConfig;
use crate::types::{LintFinding, Severity};

pub const RULE_EMPTY_DOCUMENT: &str = "empty-document";
pub const RULE_TITLE: &str = "title";
pub const RULE_REQUIRED_SECTIONS: &str = "required-sections";
pub const RULE_EMPTY_SECTION: &str = "empty-section";
pub const RULE_SHORT_OVERVIEW: &str = "short-overview";
pub const RULE_DUPLICATE_HEADING: &str = "duplicate-heading";
pub const RULE_HEADING_JUMP: &str = "heading-jump";
pub const RULE_UNCLOSED_CODE_FENCE: &str = "unclosed-code-fence";

/// A section every document must have, under its name or an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSection {
    pub name: String,
    pub aliases: Vec<String>,
    pub severity: Severity,
}

impl RequiredSection {
    fn new(name: &str, aliases: &[&str], severity: Severity) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            severity,
        }
    }

    /// Name followed by aliases
    pub fn names(&self) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(self.aliases.iter().cloned())
            .collect()
    }
}

/// Built-in required sections in check order
pub fn builtin_sections() -> Vec<RequiredSection> {
    vec![
        RequiredSection::new("Overview", &["Introduction", "About"], Severity::Error),
        RequiredSection::new(
            "Installation",
            &["Install", "Setup", "Getting Started"],
            Severity::Warning,
        ),
        RequiredSection::new(
            "API Reference",
            &["API", "Endpoints", "Reference"],
            Severity::Warning,
        ),
    ]
}

/// The fixed structural rule set
#[derive(Debug, Clone)]
pub struct RuleSet {
    required: Vec<RequiredSection>,
    min_overview_words: usize,
}

impl RuleSet {
    pub fn new(config: &LintConfig) -> Self {
        let mut required = builtin_sections();
        for extra in &config.required_sections {
            let already = required
                .iter()
                .any(|r| r.names().iter().any(|n| n.eq_ignore_ascii_case(extra.trim())));
            if !already && !extra.trim().is_empty() {
                required.push(RequiredSection::new(extra.trim(), &[], Severity::Warning));
            }
        }

        Self {
            required,
            min_overview_words: config.min_overview_words,
        }
    }

    pub fn required_sections(&self) -> &[RequiredSection] {
        &self.required
    }

    /// Run every rule; never fails
    pub fn check(&self, text: &str) -> Vec<LintFinding> {
        if text.trim().is_empty() {
            return vec![LintFinding::structural(
                RULE_EMPTY_DOCUMENT,
                Severity::Error,
                "document is empty",
                "Generate a draft or write the documentation before linting",
            )];
        }

        let outline = Outline::parse(text);
        let mut findings = Vec::new();

        self.check_title(&outline, &mut findings);
        self.check_required_sections(&outline, &mut findings);
        check_empty_sections(&outline, &mut findings);
        self.check_overview_length(&outline, &mut findings);
        check_duplicate_headings(&outline, &mut findings);
        check_heading_jumps(&outline, &mut findings);
        check_code_fences(&outline, &mut findings);

        findings
    }

    fn check_title(&self, outline: &Outline, findings: &mut Vec<LintFinding>) {
        if !outline.headings.iter().any(|h| h.level == 1) {
            findings.push(LintFinding::structural(
                RULE_TITLE,
                Severity::Warning,
                "Document has no title",
                "Start the document with a level-1 heading such as '# <Project> Documentation'",
            ));
        }
    }

    fn check_required_sections(&self, outline: &Outline, findings: &mut Vec<LintFinding>) {
        for section in &self.required {
            if outline.find_section(&section.names()).is_none() {
                findings.push(LintFinding::structural(
                    RULE_REQUIRED_SECTIONS,
                    section.severity,
                    format!("Missing required section: {}", section.name),
                    format!("Add a '## {}' section", section.name),
                ));
            }
        }
    }

    fn check_overview_length(&self, outline: &Outline, findings: &mut Vec<LintFinding>) {
        let Some(overview) = self.required.first().and_then(|s| outline.find_section(&s.names()))
        else {
            return;
        };
        if overview.body_words < self.min_overview_words {
            findings.push(
                LintFinding::structural(
                    RULE_SHORT_OVERVIEW,
                    Severity::Warning,
                    "Missing detailed description in Overview section",
                    "Add more context about what the project does and its main features.",
                )
                .at_line(overview.line)
                .in_section(overview.text.clone()),
            );
        }
    }
}

fn check_empty_sections(outline: &Outline, findings: &mut Vec<LintFinding>) {
    for heading in outline.headings.iter().filter(|h| !h.has_content) {
        findings.push(
            LintFinding::structural(
                RULE_EMPTY_SECTION,
                Severity::Warning,
                format!("Section '{}' is empty", heading.text),
                "Add content to the section or remove the heading",
            )
            .at_line(heading.line)
            .in_section(heading.text.clone()),
        );
    }
}

/// Same text at the same level under the same parent
fn check_duplicate_headings(outline: &Outline, findings: &mut Vec<LintFinding>) {
    let mut seen: HashMap<(Option<usize>, usize, String), &Heading> = HashMap::new();
    for heading in &outline.headings {
        let key = (heading.parent, heading.level, heading.normalized());
        if let Some(first) = seen.get(&key) {
            findings.push(
                LintFinding::structural(
                    RULE_DUPLICATE_HEADING,
                    Severity::Warning,
                    format!(
                        "Duplicate heading '{}' (first used on line {})",
                        heading.text, first.line
                    ),
                    "Merge the sections or give them distinct names",
                )
                .at_line(heading.line)
                .in_section(heading.text.clone()),
            );
        } else {
            seen.insert(key, heading);
        }
    }
}

fn check_heading_jumps(outline: &Outline, findings: &mut Vec<LintFinding>) {
    for pair in outline.headings.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.level > prev.level + 1 {
            findings.push(
                LintFinding::structural(
                    RULE_HEADING_JUMP,
                    Severity::Warning,
                    format!(
                        "Heading level jumps from {} to {} at '{}'",
                        prev.level, next.level, next.text
                    ),
                    format!("Use a level-{} heading here", prev.level + 1),
                )
                .at_line(next.line)
                .in_section(next.text.clone()),
            );
        }
    }
}

fn check_code_fences(outline: &Outline, findings: &mut Vec<LintFinding>) {
    if let Some(line) = outline.unclosed_fence {
        findings.push(
            LintFinding::structural(
                RULE_UNCLOSED_CODE_FENCE,
                Severity::Error,
                "Code block is never closed",
                "Close the code block with a matching ``` line",
            )
            .at_line(line),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FindingOrigin;

    fn rules() -> RuleSet {
        RuleSet::new(&LintConfig::default())
    }

    fn rule_ids(findings: &[LintFinding]) -> Vec<&str> {
        findings.iter().filter_map(|f| f.rule.as_deref()).collect()
    }

    const GOOD: &str = "# Alpha Documentation\n\n## Overview\nAlpha is a small service that stores user profiles, serves them over HTTP and keeps an audit trail of every change.\n\n## Installation\n```bash\nnpm install\n```\n\n## API Reference\n### GET /api/users\nLists users.\n";

    #[test]
    fn test_clean_document_has_no_findings() {
        assert!(rules().check(GOOD).is_empty());
    }

    #[test]
    fn test_empty_document_single_error() {
        for text in ["", "   \n\t\n"] {
            let findings = rules().check(text);
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].severity, Severity::Error);
            assert_eq!(findings[0].message, "document is empty");
        }
    }

    #[test]
    fn test_title_only_reports_missing_sections() {
        let findings = rules().check("# Title\n");
        assert!(findings.len() >= 2);
        assert!(findings.iter().all(|f| f.origin == FindingOrigin::Structural));
        let missing: Vec<&str> = findings
            .iter()
            .filter(|f| f.rule.as_deref() == Some(RULE_REQUIRED_SECTIONS))
            .map(|f| f.message.as_str())
            .collect();
        assert_eq!(
            missing,
            vec![
                "Missing required section: Overview",
                "Missing required section: Installation",
                "Missing required section: API Reference",
            ]
        );
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_aliases_satisfy_required_sections() {
        let text = "# X\n\n## About\nword word word word word word word word word word word word word word word word\n\n## Getting Started\nrun it\n\n## Endpoints\n- GET /\n";
        assert!(rules().check(text).is_empty());
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let text = "## Overview\nToo short.\n\n## Overview\n\n#### Deep\ntext\n```\nopen";
        let findings = rules().check(text);
        assert_eq!(
            rule_ids(&findings),
            vec![
                RULE_TITLE,
                RULE_REQUIRED_SECTIONS,
                RULE_REQUIRED_SECTIONS,
                RULE_SHORT_OVERVIEW,
                RULE_DUPLICATE_HEADING,
                RULE_HEADING_JUMP,
                RULE_UNCLOSED_CODE_FENCE,
            ]
        );
    }

    #[test]
    fn test_empty_section_anchored() {
        let text = "# T\n\n## Overview\n\n## Installation\nnpm i\n";
        let findings = rules().check(text);
        let empty = findings
            .iter()
            .find(|f| f.rule.as_deref() == Some(RULE_EMPTY_SECTION))
            .unwrap();
        let anchor = empty.location.as_ref().unwrap();
        assert_eq!(anchor.line, Some(3));
        assert_eq!(anchor.section.as_deref(), Some("Overview"));
    }

    #[test]
    fn test_duplicate_under_same_parent_reported() {
        let text = "# T\n## Overview\nx\n### GET /a\n#### Response\nok\n#### Response\nagain\n";
        let findings = rules().check(text);
        let duplicate = findings
            .iter()
            .find(|f| f.rule.as_deref() == Some(RULE_DUPLICATE_HEADING))
            .unwrap();
        assert_eq!(duplicate.location.as_ref().unwrap().line, Some(7));
    }

    #[test]
    fn test_duplicates_under_different_parents_allowed() {
        let text = "# T\n## Overview\nx\n### GET /a\n#### Response\nok\n### GET /b\n#### Response\nok\n";
        let findings = rules().check(text);
        assert!(!rule_ids(&findings).contains(&RULE_DUPLICATE_HEADING));
    }

    #[test]
    fn test_extra_required_sections_are_warnings() {
        let config = LintConfig {
            required_sections: vec!["License".to_string(), "overview".to_string()],
            ..Default::default()
        };
        let rules = RuleSet::new(&config);
        assert_eq!(rules.required_sections().len(), 4);

        let findings = rules.check(GOOD);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Missing required section: License");
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_structural_is_deterministic() {
        let text = "## Intro\n\n### A\n### A\n";
        assert_eq!(rules().check(text), rules().check(text));
    }
}
