use serde_json::Value;

use crate::types::{DocForgeError, Result};

/// Strip a single Markdown code fence wrapping the whole text.
///
/// The opening fence may carry an info string (```` ```json ````). The
/// wrapper ends at the first closing fence; when anything other than
/// whitespace follows it, the fences belong to separate code blocks and the
/// text is returned trimmed but otherwise untouched.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();

    let Some(newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let Some((marker, open_len)) = fence_run(&trimmed[..newline]) else {
        return trimmed;
    };

    let body = &trimmed[newline + 1..];
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if is_closing_fence(line, marker, open_len) {
            return if body[offset + line.len()..].trim().is_empty() {
                body[..offset].trim()
            } else {
                trimmed
            };
        }
        offset += line.len();
    }
    trimmed
}

fn fence_run(line: &str) -> Option<(char, usize)> {
    let line = line.trim_start();
    let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = line.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn is_closing_fence(line: &str, marker: char, open_len: usize) -> bool {
    let line = line.trim();
    matches!(fence_run(line), Some((m, len)) if m == marker && len >= open_len)
        && line.trim_start_matches(marker).is_empty()
}

/// Parse a backend answer as a single JSON value
pub fn parse_json_response(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(DocForgeError::malformed("empty response", raw));
    }
    serde_json::from_str(cleaned)
        .map_err(|e| DocForgeError::malformed(format!("response is not valid JSON: {}", e), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        // Unterminated fence is left alone
        assert_eq!(strip_code_fences("```json\n{}"), "```json\n{}");
    }

    #[test]
    fn test_separate_code_blocks_are_not_a_wrapper() {
        let answer = "```bash\nnpm install\n```\n\n## Overview\nText here.\n\n## Usage\n```bash\nnpm start\n```";
        assert_eq!(strip_code_fences(answer), answer);
    }

    #[test]
    fn test_longer_wrapper_keeps_inner_blocks() {
        let answer = "````markdown\n# Doc\n\n```bash\nnpm start\n```\n````";
        assert_eq!(
            strip_code_fences(answer),
            "# Doc\n\n```bash\nnpm start\n```"
        );
    }

    #[test]
    fn test_parse_json_response() {
        let value = parse_json_response("```json\n{\"findings\": []}\n```").unwrap();
        assert!(value["findings"].is_array());

        let err = parse_json_response("Sure! Here are the findings").unwrap_err();
        assert!(matches!(err, DocForgeError::MalformedResponse { .. }));
        assert!(parse_json_response("   ").is_err());
    }
}
