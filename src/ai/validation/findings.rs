use serde_json::{Map, Value};

use super::extract::parse_json_response;
use crate::types::{DocForgeError, LintFinding, Result, Severity};

/// Schema for semantic lint answers:
///
/// ```json
/// {"findings": [{"severity": "warning", "message": "...", "suggestion": "...", "section": null}]}
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FindingsSchema {
    pub max_findings: usize,
}

impl FindingsSchema {
    pub fn new(max_findings: usize) -> Self {
        Self { max_findings }
    }

    /// JSON example embedded into lint prompts
    pub fn example() -> &'static str {
        r#"{"findings": [{"severity": "warning", "message": "Overview does not say what the service does", "suggestion": "Describe the service's purpose in one or two sentences", "section": "Overview"}]}"#
    }
}

/// Parse and strictly validate a semantic lint answer
pub fn parse_findings(raw: &str, schema: FindingsSchema) -> Result<Vec<LintFinding>> {
    let value = parse_json_response(raw)?;

    let Value::Object(root) = &value else {
        return Err(DocForgeError::malformed("response must be a JSON object", raw));
    };

    let items = match root.get("findings") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(DocForgeError::malformed("'findings' must be an array", raw)),
        None => {
            return Err(DocForgeError::malformed(
                "missing required 'findings' field",
                raw,
            ));
        }
    };

    if items.len() > schema.max_findings {
        return Err(DocForgeError::malformed(
            format!(
                "{} findings exceeds the maximum of {}",
                items.len(),
                schema.max_findings
            ),
            raw,
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(fields) => parse_finding(fields, idx, raw),
            _ => Err(DocForgeError::malformed(
                format!("findings[{}] must be an object", idx),
                raw,
            )),
        })
        .collect()
}

fn parse_finding(fields: &Map<String, Value>, idx: usize, raw: &str) -> Result<LintFinding> {
    let invalid = |what: &str| DocForgeError::malformed(format!("findings[{}]: {}", idx, what), raw);

    let severity = match fields.get("severity") {
        Some(Value::String(s)) => match s.as_str() {
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            other => return Err(invalid(&format!("unknown severity '{}'", other))),
        },
        Some(_) => return Err(invalid("'severity' must be a string")),
        None => return Err(invalid("missing 'severity'")),
    };

    let message = match fields.get("message") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err(invalid("'message' must not be empty")),
        Some(_) => return Err(invalid("'message' must be a string")),
        None => return Err(invalid("missing 'message'")),
    };

    let suggestion = match fields.get("suggestion") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(invalid("'suggestion' must be a string")),
        None => return Err(invalid("missing 'suggestion'")),
    };

    let section = match fields.get("section") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => return Err(invalid("'section' must be a string or null")),
    };

    let finding = LintFinding::semantic(severity, message, suggestion);
    Ok(match section {
        Some(section) => finding.in_section(section),
        None => finding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FindingOrigin;

    const SCHEMA: FindingsSchema = FindingsSchema { max_findings: 5 };

    #[test]
    fn test_valid_findings_keep_order() {
        let raw = r#"```json
{"findings": [
  {"severity": "error", "message": "Wrong port", "suggestion": "Use 8080", "section": "Installation"},
  {"severity": "warning", "message": "Vague overview", "suggestion": "Be specific", "section": null}
]}
```"#;
        let findings = parse_findings(raw, SCHEMA).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].origin, FindingOrigin::Semantic);
        assert_eq!(
            findings[0].location.as_ref().and_then(|a| a.section.as_deref()),
            Some("Installation")
        );
        assert_eq!(findings[1].message, "Vague overview");
        assert!(findings[1].location.is_none());
    }

    #[test]
    fn test_empty_findings_accepted() {
        assert!(parse_findings(r#"{"findings": []}"#, SCHEMA).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_schema_violations() {
        let cases = [
            "not json at all",
            "[]",
            r#"{"issues": []}"#,
            r#"{"findings": {}}"#,
            r#"{"findings": ["text"]}"#,
            r#"{"findings": [{"severity": "info", "message": "m", "suggestion": "s"}]}"#,
            r#"{"findings": [{"severity": "warning", "message": "  ", "suggestion": "s"}]}"#,
            r#"{"findings": [{"severity": "warning", "message": "m"}]}"#,
            r#"{"findings": [{"severity": "warning", "message": "m", "suggestion": 3}]}"#,
            r#"{"findings": [{"severity": "warning", "message": "m", "suggestion": "s", "section": 1}]}"#,
        ];
        for raw in cases {
            let err = parse_findings(raw, SCHEMA).unwrap_err();
            assert!(
                matches!(err, DocForgeError::MalformedResponse { .. }),
                "expected malformed for {raw}"
            );
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_rejects_too_many_findings() {
        let item = r#"{"severity": "warning", "message": "m", "suggestion": "s"}"#;
        let raw = format!("{{\"findings\": [{}]}}", vec![item; 6].join(","));
        assert!(parse_findings(&raw, SCHEMA).is_err());
    }
}
