use console::style;

/// Styled terminal lines for command output
pub struct Output;

impl Output {
    pub fn success(message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn header(message: &str) {
        println!("{}", style(message).bold());
        println!("{}", "═".repeat(38));
    }

    /// Indented `label: value` line
    pub fn field(label: &str, value: impl std::fmt::Display) {
        println!("  {:<12} {}", format!("{}:", label), value);
    }

    pub fn dim(message: &str) {
        println!("{}", style(message).dim());
    }
}
