//! Minimal Markdown outline: ATX headings and fenced code blocks.
//!
//! Headings inside fenced code blocks are not headings.

/// One ATX heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1..=6
    pub level: usize,
    pub text: String,
    /// 1-based line number
    pub line: usize,
    /// Index of the enclosing heading of lower level, if any
    pub parent: Option<usize>,
    /// Words of prose directly under this heading, up to the next heading
    pub body_words: usize,
    /// Any non-blank line (including sub-headings and code) before the
    /// section ends at the next heading of the same or higher level
    pub has_content: bool,
}

impl Heading {
    /// Case-insensitive comparable form of the heading text
    pub fn normalized(&self) -> String {
        normalize_heading(&self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub headings: Vec<Heading>,
    /// Line of a code fence that is never closed
    pub unclosed_fence: Option<usize>,
}

impl Outline {
    pub fn parse(text: &str) -> Self {
        let mut headings: Vec<Heading> = Vec::new();
        // Line kinds for the section-content pass
        let mut kinds: Vec<LineKind> = Vec::new();
        let mut fence: Option<(char, usize, usize)> = None;

        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim_start();

            if let Some((marker, len)) = fence_marker(trimmed) {
                match fence {
                    None => fence = Some((marker, len, idx + 1)),
                    Some((open, open_len, _))
                        if open == marker
                            && len >= open_len
                            && trimmed.trim_start_matches(marker).trim().is_empty() =>
                    {
                        fence = None
                    }
                    Some(_) => {}
                }
                kinds.push(LineKind::Other);
                continue;
            }

            if fence.is_some() {
                kinds.push(if trimmed.is_empty() {
                    LineKind::Blank
                } else {
                    LineKind::Code
                });
                continue;
            }

            if let Some((level, heading_text)) = parse_atx(trimmed) {
                let parent = headings.iter().rposition(|h| h.level < level);
                headings.push(Heading {
                    level,
                    text: heading_text,
                    line: idx + 1,
                    parent,
                    body_words: 0,
                    has_content: false,
                });
                kinds.push(LineKind::Heading(headings.len() - 1));
                continue;
            }

            if trimmed.is_empty() {
                kinds.push(LineKind::Blank);
            } else {
                if let Some(current) = headings.last_mut() {
                    current.body_words += trimmed.split_whitespace().count();
                }
                kinds.push(LineKind::Other);
            }
        }

        mark_content(&mut headings, &kinds);

        Self {
            headings,
            unclosed_fence: fence.map(|(_, _, line)| line),
        }
    }

    /// First heading whose normalized text is one of `names`
    pub fn find_section(&self, names: &[String]) -> Option<&Heading> {
        self.headings
            .iter()
            .find(|h| names.iter().any(|n| normalize_heading(n) == h.normalized()))
    }
}

#[derive(Debug, Clone, Copy)]
enum LineKind {
    Blank,
    Code,
    Heading(usize),
    Other,
}

fn mark_content(headings: &mut [Heading], kinds: &[LineKind]) {
    for idx in 0..headings.len() {
        let level = headings[idx].level;
        let start = headings[idx].line; // 0-based index of the next line
        let mut has_content = false;

        for kind in &kinds[start.min(kinds.len())..] {
            match kind {
                LineKind::Heading(other) if headings[*other].level <= level => break,
                LineKind::Blank => {}
                _ => {
                    has_content = true;
                    break;
                }
            }
        }
        headings[idx].has_content = has_content;
    }
}

/// Opening/closing fence marker (``` or ~~~, three or more)
fn fence_marker(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn parse_atx(trimmed: &str) -> Option<(usize, String)> {
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end().to_string();
    Some((level, text))
}

/// Lowercase, collapse whitespace, drop trailing colon
pub fn normalize_heading(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(':')
        .to_lowercase()
}
