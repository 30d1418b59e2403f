//! Post-processing of backend output into a draft document.

use crate::linter::Outline;
use crate::types::{CodeSummary, RepositoryId};

const OVERVIEW_NAMES: [&str; 3] = ["overview", "introduction", "about"];

/// `# <name> Documentation`
pub fn title_for(repository: &RepositoryId) -> String {
    format!("# {} Documentation", repository.name())
}

/// Make a backend answer a well-formed draft.
///
/// `body` is the answer with any wrapping code fence already removed. The
/// title and Overview are inserted at the top when missing; an Endpoints
/// section is appended when the summary declares endpoints and the answer
/// has no section for them.
pub fn normalize(body: &str, repository: &RepositoryId, summary: &CodeSummary) -> String {
    let body = body.trim();
    let outline = Outline::parse(body);
    let mut lines: Vec<String> = body.lines().map(|l| l.trim_end().to_string()).collect();

    // 0-based index of the line after the title
    let after_title = match outline.headings.iter().find(|h| h.level == 1) {
        Some(title) => title.line,
        None => {
            lines.splice(0..0, [title_for(repository), String::new()]);
            1
        }
    };

    let has_overview = outline
        .headings
        .iter()
        .any(|h| OVERVIEW_NAMES.contains(&h.normalized().as_str()));
    if !has_overview {
        let mut block = vec![
            String::new(),
            "## Overview".to_string(),
            String::new(),
            overview_stub(repository, summary),
        ];
        if lines.get(after_title).is_some_and(|l| !l.is_empty()) {
            block.push(String::new());
        }
        lines.splice(after_title..after_title, block);
    }

    let has_endpoints_section = outline
        .headings
        .iter()
        .any(|h| h.normalized().contains("endpoint"));
    if summary.has_endpoints() && !has_endpoints_section {
        if lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push(String::new());
        }
        lines.extend(endpoints_stub(summary));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn overview_stub(repository: &RepositoryId, summary: &CodeSummary) -> String {
    let endpoints: usize = summary.units.iter().map(|u| u.endpoints().count()).sum();
    format!(
        "This document describes the {} repository. It was generated from {} source file(s) \
         exposing {} symbol(s), of which {} are HTTP endpoint(s).",
        repository,
        summary.len(),
        summary.symbol_count(),
        endpoints
    )
}

/// Every endpoint, grouped under its unit path
pub fn endpoints_stub(summary: &CodeSummary) -> Vec<String> {
    let mut lines = vec!["## Endpoints".to_string()];
    for unit in &summary.units {
        let endpoints: Vec<&str> = unit.endpoints().collect();
        if endpoints.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("### {}", unit.path));
        lines.push(String::new());
        lines.extend(endpoints.into_iter().map(|e| format!("- `{}`", e)));
    }
    lines
}
