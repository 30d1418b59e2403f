//! Code summary produced by the analyzer and consumed by the generator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::utils::sha256_hex;

static ENDPOINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS) /\S*$").expect("valid endpoint regex")
});

/// One discovered source file and what it exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Exported symbol names and endpoint declarations (`GET /api/users`)
    pub symbols: Vec<String>,
    /// Whether the file looks like a program/library entry point
    #[serde(default)]
    pub entry_point: bool,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            path: path.into(),
            symbols,
            entry_point: false,
        }
    }

    pub fn with_entry_point(mut self, entry_point: bool) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// Endpoint declarations among the symbols
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .map(String::as_str)
            .filter(|s| is_endpoint(s))
    }

    /// Symbols that are not endpoint declarations
    pub fn exports(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .map(String::as_str)
            .filter(|s| !is_endpoint(s))
    }

    /// Normalized `path:sym1:sym2` line with symbols sorted
    fn fingerprint_line(&self) -> String {
        let mut symbols: Vec<&str> = self.symbols.iter().map(String::as_str).collect();
        symbols.sort_unstable();
        let mut line = self.path.clone();
        for symbol in symbols {
            line.push(':');
            line.push_str(symbol);
        }
        line
    }
}

/// Whether a symbol is an HTTP endpoint declaration such as `GET /api/users`
pub fn is_endpoint(symbol: &str) -> bool {
    ENDPOINT_PATTERN.is_match(symbol)
}

/// Ordered list of source units for one analysis run. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSummary {
    pub units: Vec<SourceUnit>,
}

impl CodeSummary {
    pub fn new(units: Vec<SourceUnit>) -> Self {
        Self { units }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Normalized unit lines the fingerprint is computed over, sorted by path
    pub fn fingerprint_lines(&self) -> Vec<String> {
        let mut units: Vec<&SourceUnit> = self.units.iter().collect();
        units.sort_by(|a, b| a.path.cmp(&b.path));
        units.into_iter().map(SourceUnit::fingerprint_line).collect()
    }

    /// Deterministic hash over the normalized unit list.
    ///
    /// Independent of unit order and symbol order.
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.fingerprint_lines().join("\n"))
    }

    pub fn entry_points(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(|u| u.entry_point)
    }

    pub fn has_endpoints(&self) -> bool {
        self.units.iter().any(|u| u.endpoints().next().is_some())
    }

    pub fn symbol_count(&self) -> usize {
        self.units.iter().map(|u| u.symbols.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn users_unit() -> SourceUnit {
        SourceUnit::new(
            "api/users.ts",
            vec!["GET /api/users".into(), "POST /api/users".into()],
        )
    }

    #[test]
    fn test_fingerprint_matches_normalized_line() {
        let summary = CodeSummary::new(vec![users_unit()]);
        assert_eq!(
            summary.fingerprint_lines(),
            vec!["api/users.ts:GET /api/users:POST /api/users".to_string()]
        );
        assert_eq!(
            summary.fingerprint(),
            sha256_hex("api/users.ts:GET /api/users:POST /api/users")
        );
    }

    #[test]
    fn test_endpoint_detection() {
        assert!(is_endpoint("GET /api/users"));
        assert!(is_endpoint("DELETE /api/users/:id"));
        assert!(!is_endpoint("getUsers"));
        assert!(!is_endpoint("GET api/users"));

        let unit = SourceUnit::new(
            "api/users.ts",
            vec!["GET /api/users".into(), "UserService".into()],
        );
        assert_eq!(unit.endpoints().collect::<Vec<_>>(), vec!["GET /api/users"]);
        assert_eq!(unit.exports().collect::<Vec<_>>(), vec!["UserService"]);
    }

    #[test]
    fn test_fingerprint_changes_with_symbols() {
        let a = CodeSummary::new(vec![users_unit()]);
        let mut unit = users_unit();
        unit.symbols.push("DELETE /api/users/:id".into());
        let b = CodeSummary::new(vec![unit]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    proptest! {
        #[test]
        fn prop_fingerprint_ignores_ordering(
            units in prop::collection::btree_map(
                "[a-z]{1,8}/[a-z]{1,8}\\.ts",
                prop::collection::vec("[A-Za-z]{1,10}", 0..5),
                1..6,
            ),
            seed in any::<u64>(),
        ) {
            let ordered: Vec<SourceUnit> = units
                .iter()
                .map(|(path, symbols)| SourceUnit::new(path.clone(), symbols.clone()))
                .collect();

            let mut shuffled = ordered.clone();
            let n = shuffled.len();
            shuffled.rotate_left((seed as usize) % n);
            for unit in &mut shuffled {
                unit.symbols.reverse();
            }

            prop_assert_eq!(
                CodeSummary::new(ordered).fingerprint(),
                CodeSummary::new(shuffled).fingerprint()
            );
        }
    }
}
