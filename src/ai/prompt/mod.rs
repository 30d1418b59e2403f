//! Prompt Builder System
//!
//! Standardized prompt construction for backend interactions.
//! Sections render in insertion order so identical inputs give identical prompts.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value pairs
    Context(Vec<(String, String)>),
    /// Headed block of free text
    Text { header: String, content: String },
    /// Code block with language
    Code { language: String, content: String },
    /// Hard output rules
    Rules(Vec<String>),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Add a context item, appending to the first context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        for section in &mut self.sections {
            if let PromptSection::Context(items) = section {
                items.push(item);
                return self;
            }
        }
        self.sections.push(PromptSection::Context(vec![item]));
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: header.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add code block; the fence is longer than any backtick run in `content`
    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add output rules
    pub fn rules(mut self, rules: Vec<&str>) -> Self {
        self.sections
            .push(PromptSection::Rules(rules.into_iter().map(String::from).collect()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    let fence = fence_for(&content);
                    prompt.push_str(&format!("{}{}\n", fence, language));
                    prompt.push_str(&content);
                    prompt.push_str(&format!("\n{}\n\n", fence));
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Backtick fence that no run inside `content` can close early
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

/// Preset prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Template for README-style document generation
    pub fn documentation(repository: &str) -> PromptBuilder {
        PromptBuilder::new()
            .role(
                "technical writer",
                "developer documentation for code repositories",
            )
            .objectives(vec![
                &format!("Write Markdown documentation for the {} repository", repository),
                "Explain what the project does and who it is for",
                "Describe how to install and run it",
                "Document every HTTP endpoint and exported entry point listed below",
            ])
    }

    /// Template for semantic review of a draft document
    pub fn review() -> PromptBuilder {
        PromptBuilder::new()
            .role("documentation reviewer", "accuracy and clarity of technical docs")
            .objectives(vec![
                "Find statements that are vague, misleading or internally inconsistent",
                "Find missing information a new developer would need",
                "Suggest a concrete remedy for every problem",
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("technical writer", "API docs")
            .objectives(vec!["Describe endpoints", "Show examples"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("technical writer"));
        assert!(prompt.contains("1. Describe endpoints"));
        assert!(prompt.contains("2. Show examples"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Repository", "acme/api")
            .context_item("Branch", "main")
            .build();

        let repo = prompt.find("**Repository**: acme/api").unwrap();
        let branch = prompt.find("**Branch**: main").unwrap();
        assert!(repo < branch);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_rules_and_code() {
        let prompt = PromptTemplates::review()
            .code("markdown", "# Title")
            .rules(vec!["Respond with JSON only"])
            .build();

        assert!(prompt.contains("```markdown\n# Title\n```"));
        assert!(prompt.contains("- Respond with JSON only"));
    }

    #[test]
    fn test_code_fence_outlasts_inner_fences() {
        let content = "# Title\n\n```bash\nmake\n```\n\nThen ````` appears.";
        let prompt = PromptBuilder::new().code("markdown", content).build();

        assert!(prompt.starts_with("``````markdown\n# Title"));
        assert!(prompt.ends_with("appears.\n``````"));
    }
}
