//! Symbol extraction on tree-sitter syntax trees.
//!
//! Recognizes exported declarations, HTTP route registrations and entry
//! points for TypeScript/JavaScript, Rust, Python and Go. Routes are
//! normalized to `METHOD /path` so they compare equal across frameworks.
//! Constructs spanning several lines are one node, so layout does not change
//! what is found.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser, Tree};

use super::language::Language;
use crate::constants::analysis;
use crate::types::{DocForgeError, Result, is_endpoint};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!("valid regex: ", stringify!($name))));
    };
}

// Matched against the full text of attribute and decorator nodes
pattern!(
    RS_ATTR_ROUTE,
    r#"^#\[\s*(get|post|put|patch|delete|head|options)\s*\(\s*"(/[^"\s]*)""#
);
pattern!(
    PY_ROUTE,
    r#"^@\s*[\w.]+\.(get|post|put|patch|delete|head|options)\(\s*['"](/[^'"\s]*)['"]"#
);
pattern!(PY_FLASK_ROUTE, r#"^@\s*[\w.]+\.route\(\s*['"](/[^'"\s]*)['"]"#);
pattern!(PY_METHODS, r"methods\s*=\s*[\[(]([^\])]*)[\])]");
pattern!(QUOTED_WORD, r#"['"]([A-Za-z]+)['"]"#);
pattern!(PY_MAIN, r#"__name__\s*==\s*['"]__main__['"]"#);

const HTTP_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// Receivers whose `.get('/path', ...)` calls register routes
const ES_ROUTERS: [&str; 5] = ["app", "router", "server", "api", "routes"];

const RUST_ITEMS: [&str; 8] = [
    "function_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "type_item",
    "static_item",
    "const_item",
    "mod_item",
];

/// Symbols and entry-point flag extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub symbols: Vec<String>,
    pub entry_point: bool,
}

/// Extracts exported symbols and endpoint declarations per language
#[derive(Debug, Clone, Copy)]
pub struct SymbolExtractor {
    max_symbols: usize,
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self {
            max_symbols: analysis::MAX_SYMBOLS_PER_UNIT,
        }
    }
}

impl SymbolExtractor {
    pub fn with_max_symbols(max_symbols: usize) -> Self {
        Self { max_symbols }
    }

    /// Extract from file content. `relative_path` decides entry-point naming
    /// and the JSX dialect.
    ///
    /// Syntax errors do not fail extraction; tree-sitter recovers and the
    /// well-formed parts are still read.
    pub fn extract(
        &self,
        relative_path: &str,
        language: Language,
        content: &str,
    ) -> Result<Extraction> {
        let mut collector = Collector::new(self.max_symbols);
        let mut entry_point = is_entry_file(relative_path, language);

        let Some(grammar) = grammar_for(relative_path, language) else {
            return Ok(Extraction {
                symbols: Vec::new(),
                entry_point,
            });
        };
        let tree = parse(relative_path, &grammar, content)?;
        let root = tree.root_node();

        match language {
            Language::TypeScript | Language::JavaScript => {
                visit(root, |node| es_node(node, content, &mut collector))
            }
            Language::Rust => visit(root, |node| {
                rust_node(node, content, &mut collector);
                entry_point |= is_rust_main(node, content);
            }),
            Language::Python => visit(root, |node| {
                python_node(node, content, &mut collector);
                entry_point |= is_python_main(node, content);
            }),
            Language::Go => visit(root, |node| {
                go_node(node, content, &mut collector);
                entry_point |= is_go_main(node, content);
            }),
            Language::Unknown => {}
        }

        Ok(Extraction {
            symbols: collector.symbols,
            entry_point,
        })
    }
}

fn grammar_for(relative_path: &str, language: Language) -> Option<tree_sitter::Language> {
    let jsx = relative_path.ends_with(".tsx") || relative_path.ends_with(".jsx");
    let grammar = match language {
        Language::TypeScript | Language::JavaScript if jsx => tree_sitter_typescript::LANGUAGE_TSX,
        Language::TypeScript | Language::JavaScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Language::Rust => tree_sitter_rust::LANGUAGE,
        Language::Python => tree_sitter_python::LANGUAGE,
        Language::Go => tree_sitter_go::LANGUAGE,
        Language::Unknown => return None,
    };
    Some(grammar.into())
}

fn parse(path: &str, grammar: &tree_sitter::Language, content: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| DocForgeError::Parse {
            path: path.to_string(),
            message: format!("Failed to set grammar: {}", e),
        })?;
    parser.parse(content, None).ok_or_else(|| DocForgeError::Parse {
        path: path.to_string(),
        message: "Parser produced no syntax tree".to_string(),
    })
}

/// Pre-order walk over named nodes, in document order
fn visit<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        f(node);
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    node.utf8_text(src.as_bytes()).unwrap_or_else(|e| {
        tracing::debug!(
            line = node.start_position().row + 1,
            "UTF-8 extraction failed: {}",
            e
        );
        ""
    })
}

fn field_text<'s>(node: Node, field: &str, src: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|n| text(n, src))
}

/// Contents of a plain string literal; `None` for interpolated strings
fn string_value<'s>(node: Node, src: &'s str) -> Option<&'s str> {
    match node.kind() {
        "string" | "string_literal" | "interpreted_string_literal" | "raw_string_literal" => {
            Some(text(node, src).trim_matches(|c| c == '"' || c == '\'' || c == '`'))
        }
        "template_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            (!interpolated).then(|| text(node, src).trim_matches('`'))
        }
        _ => None,
    }
}

fn is_comment(node: Node) -> bool {
    matches!(node.kind(), "comment" | "line_comment" | "block_comment")
}

fn first_string_argument<'s>(call: Node, src: &'s str) -> Option<&'s str> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let first = arguments
        .named_children(&mut cursor)
        .find(|n| !is_comment(*n))?;
    string_value(first, src)
}

fn is_entry_file(relative_path: &str, language: Language) -> bool {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let depth = relative_path.matches('/').count();

    // Only top-level or src/ entry files count for script languages
    if language.is_ecmascript() && depth > 1 {
        return false;
    }
    language.entry_file_names().contains(&stem)
}

// =============================================================================
// TypeScript / JavaScript
// =============================================================================

fn es_node(node: Node, src: &str, out: &mut Collector) {
    match node.kind() {
        "export_statement" => es_export(node, src, out),
        "assignment_expression" => es_commonjs_export(node, src, out),
        "call_expression" => es_route(node, src, out),
        _ => {}
    }
}

fn es_export(node: Node, src: &str, out: &mut Collector) {
    if let Some(declaration) = node.child_by_field_name("declaration") {
        es_declaration(declaration, src, out);
        return;
    }

    let mut cursor = node.walk();
    for clause in node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "export_clause")
    {
        let mut inner = clause.walk();
        for specifier in clause
            .named_children(&mut inner)
            .filter(|c| c.kind() == "export_specifier")
        {
            // `a as b` exports b
            let exported = specifier
                .child_by_field_name("alias")
                .or_else(|| specifier.child_by_field_name("name"));
            if let Some(name) = exported {
                out.push(text(name, src));
            }
        }
    }
}

fn es_declaration(declaration: Node, src: &str, out: &mut Collector) {
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = declaration.walk();
            for declarator in declaration
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "variable_declarator")
            {
                if let Some(name) = declarator
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                {
                    out.push(text(name, src));
                }
            }
        }
        // `export declare ...`
        "ambient_declaration" => {
            let mut cursor = declaration.walk();
            let inner = declaration.named_children(&mut cursor).next();
            if let Some(inner) = inner {
                es_declaration(inner, src, out);
            }
        }
        _ => {
            if let Some(name) = declaration
                .child_by_field_name("name")
                .filter(|n| matches!(n.kind(), "identifier" | "type_identifier"))
            {
                out.push(text(name, src));
            }
        }
    }
}

/// `exports.x = ...` and `module.exports.x = ...`
fn es_commonjs_export(node: Node, src: &str, out: &mut Collector) {
    let Some(left) = node
        .child_by_field_name("left")
        .filter(|l| l.kind() == "member_expression")
    else {
        return;
    };
    let object = field_text(left, "object", src).unwrap_or_default();
    if object == "exports" || object == "module.exports" {
        if let Some(property) = field_text(left, "property", src) {
            out.push(property);
        }
    }
}

fn es_route(call: Node, src: &str, out: &mut Collector) {
    let Some(function) = call
        .child_by_field_name("function")
        .filter(|f| f.kind() == "member_expression")
    else {
        return;
    };
    let Some(method) = field_text(function, "property", src) else {
        return;
    };
    let object = field_text(function, "object", src).unwrap_or_default();
    let receiver = object.rsplit('.').next().unwrap_or(object);
    if !HTTP_METHODS.contains(&method) || !ES_ROUTERS.contains(&receiver) {
        return;
    }
    if let Some(path) = first_string_argument(call, src) {
        out.push_endpoint(method, path);
    }
}

// =============================================================================
// Rust
// =============================================================================

fn rust_node(node: Node, src: &str, out: &mut Collector) {
    match node.kind() {
        "attribute_item" => {
            if let Some(caps) = RS_ATTR_ROUTE.captures(text(node, src)) {
                out.push_endpoint(&caps[1], &caps[2]);
            }
        }
        "call_expression" => rust_router_route(node, src, out),
        kind if RUST_ITEMS.contains(&kind) && is_public(node, src) => {
            if let Some(name) = field_text(node, "name", src) {
                out.push(name);
            }
        }
        _ => {}
    }
}

/// Plain `pub`; `pub(crate)` and friends are not exported
fn is_public(node: Node, src: &str) -> bool {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier" && text(c, src) == "pub")
}

/// `.route("/path", get(a).post(b))`
fn rust_router_route(call: Node, src: &str, out: &mut Collector) {
    let Some(function) = call
        .child_by_field_name("function")
        .filter(|f| f.kind() == "field_expression")
    else {
        return;
    };
    if field_text(function, "field", src) != Some("route") {
        return;
    }
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return;
    };
    let mut cursor = arguments.walk();
    let args: Vec<Node> = arguments
        .named_children(&mut cursor)
        .filter(|n| !is_comment(*n))
        .collect();
    let [path, handler, ..] = args.as_slice() else {
        return;
    };
    let Some(path) = string_value(*path, src) else {
        return;
    };

    let mut methods: Vec<(usize, &str)> = Vec::new();
    visit(*handler, |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let name = node.child_by_field_name("function").and_then(|f| match f.kind() {
            "identifier" => Some(f),
            "field_expression" => f.child_by_field_name("field"),
            "scoped_identifier" => f.child_by_field_name("name"),
            _ => None,
        });
        if let Some(name) = name.filter(|n| HTTP_METHODS.contains(&text(*n, src))) {
            methods.push((name.start_byte(), text(name, src)));
        }
    });
    methods.sort_by_key(|(start, _)| *start);

    for (_, method) in methods {
        out.push_endpoint(method, path);
    }
}

fn is_rust_main(node: Node, src: &str) -> bool {
    node.kind() == "function_item"
        && field_text(node, "name", src) == Some("main")
        && node.parent().is_some_and(|p| p.kind() == "source_file")
}

// =============================================================================
// Python
// =============================================================================

fn python_node(node: Node, src: &str, out: &mut Collector) {
    match node.kind() {
        "decorator" => python_route(text(node, src), out),
        "function_definition" | "class_definition" if is_module_level(node) => {
            if let Some(name) = field_text(node, "name", src).filter(|n| !n.starts_with('_')) {
                out.push(name);
            }
        }
        _ => {}
    }
}

fn is_module_level(node: Node) -> bool {
    let mut parent = node.parent();
    if parent.is_some_and(|p| p.kind() == "decorated_definition") {
        parent = parent.and_then(|p| p.parent());
    }
    parent.is_some_and(|p| p.kind() == "module")
}

fn python_route(decorator: &str, out: &mut Collector) {
    if let Some(caps) = PY_ROUTE.captures(decorator) {
        out.push_endpoint(&caps[1], &caps[2]);
        return;
    }
    let Some(caps) = PY_FLASK_ROUTE.captures(decorator) else {
        return;
    };
    let path = &caps[1];
    match PY_METHODS.captures(decorator) {
        Some(methods) => {
            for method in QUOTED_WORD.captures_iter(&methods[1]) {
                out.push_endpoint(&method[1], path);
            }
        }
        None => out.push_endpoint("GET", path),
    }
}

fn is_python_main(node: Node, src: &str) -> bool {
    node.kind() == "if_statement"
        && node.parent().is_some_and(|p| p.kind() == "module")
        && node
            .child_by_field_name("condition")
            .is_some_and(|c| PY_MAIN.is_match(text(c, src)))
}

// =============================================================================
// Go
// =============================================================================

fn go_node(node: Node, src: &str, out: &mut Collector) {
    match node.kind() {
        "function_declaration" | "method_declaration" | "type_spec" | "type_alias" => {
            if let Some(name) = field_text(node, "name", src)
                .filter(|n| n.starts_with(|c: char| c.is_ascii_uppercase()))
            {
                out.push(name);
            }
        }
        "call_expression" => go_route(node, src, out),
        _ => {}
    }
}

/// `r.GET("/x", h)`, `e.Get("/x", h)` and `mux.HandleFunc("GET /x", h)`
fn go_route(call: Node, src: &str, out: &mut Collector) {
    let Some(function) = call
        .child_by_field_name("function")
        .filter(|f| f.kind() == "selector_expression")
    else {
        return;
    };
    let Some(method) = field_text(function, "field", src) else {
        return;
    };
    let Some(pattern) = first_string_argument(call, src) else {
        return;
    };

    let exported = method.starts_with(|c: char| c.is_ascii_uppercase());
    if exported && HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
        out.push_endpoint(method, pattern);
    } else if method == "Handle" || method == "HandleFunc" {
        if let Some((verb, path)) = pattern.split_once(' ') {
            out.push_endpoint(verb, path.trim());
        }
    }
}

fn is_go_main(node: Node, src: &str) -> bool {
    node.kind() == "function_declaration" && field_text(node, "name", src) == Some("main")
}

/// Ordered, de-duplicated, bounded symbol list
struct Collector {
    symbols: Vec<String>,
    seen: HashSet<String>,
    max: usize,
}

impl Collector {
    fn new(max: usize) -> Self {
        Self {
            symbols: Vec::new(),
            seen: HashSet::new(),
            max,
        }
    }

    fn push(&mut self, symbol: &str) {
        if symbol.is_empty()
            || self.symbols.len() >= self.max
            || !self.seen.insert(symbol.to_string())
        {
            return;
        }
        self.symbols.push(symbol.to_string());
    }

    fn push_endpoint(&mut self, method: &str, path: &str) {
        let endpoint = format!("{} {}", method.to_ascii_uppercase(), path);
        if is_endpoint(&endpoint) {
            self.push(&endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(path: &str, content: &str) -> Extraction {
        let language = Language::from_path(std::path::Path::new(path));
        SymbolExtractor::default()
            .extract(path, language, content)
            .unwrap()
    }

    #[test]
    fn test_express_routes_and_exports() {
        let content = r#"
import { Router } from 'express';
export const router = Router();
router.get('/api/users', listUsers);
router.post("/api/users", createUser);
export function listUsers(req, res) {}
"#;
        let result = extract("api/users.ts", content);
        assert_eq!(
            result.symbols,
            vec!["router", "GET /api/users", "POST /api/users", "listUsers"]
        );
        assert!(!result.entry_point);
    }

    #[test]
    fn test_multiline_exports_and_chained_routes() {
        let content = r#"
const a = 1;
const b = 2;
export {
  a,
  b as renamed
};
router
  .get('/health', ok);
export interface User {
  id: string;
}
exports.legacy = function () {};
"#;
        let result = extract("src/routes.ts", content);
        assert_eq!(
            result.symbols,
            vec!["a", "renamed", "GET /health", "User", "legacy"]
        );
    }

    #[test]
    fn test_interpolated_paths_are_not_endpoints() {
        let content = "app.get(`/users/${id}`, h);\napp.get(`/static`, h);\n";
        let result = extract("app.js", content);
        assert_eq!(result.symbols, vec!["GET /static"]);
        assert!(result.entry_point);
    }

    #[test]
    fn test_rust_items_and_routes() {
        let content = r#"
pub struct AppState;
pub(crate) fn hidden() {}
fn private() {}
#[get("/health")]
pub async fn health() -> &'static str { "ok" }
fn main() {
    let app = Router::new().route("/items", get(list).post(create));
}
"#;
        let result = extract("src/main.rs", content);
        assert_eq!(
            result.symbols,
            vec!["AppState", "GET /health", "health", "GET /items", "POST /items"]
        );
        assert!(result.entry_point);
    }

    #[test]
    fn test_rust_multiline_signature_with_attributes() {
        let content = r#"
#[instrument(skip_all)]
#[allow(clippy::too_many_arguments)]
pub async fn
handle_request(
    state: AppState,
    body: String,
) -> Result<()> {
    Ok(())
}

pub mod routes {
    pub fn router() -> Router {
        Router::new()
            .route(
                "/orders",
                axum::routing::get(list)
                    .delete(remove),
            )
    }
}
"#;
        let result = extract("src/api.rs", content);
        assert_eq!(
            result.symbols,
            vec![
                "handle_request",
                "routes",
                "router",
                "GET /orders",
                "DELETE /orders"
            ]
        );
        assert!(!result.entry_point);
    }

    #[test]
    fn test_python_routes() {
        let content = r#"
@app.get("/items")
def list_items():
    pass

@bp.route(
    "/orders",
    methods=["GET", "POST"],
)
def orders():
    def nested():
        pass

def _private():
    pass

class Store:
    pass

if __name__ == "__main__":
    main()
"#;
        let result = extract("service/routes.py", content);
        assert_eq!(
            result.symbols,
            vec!["GET /items", "list_items", "GET /orders", "POST /orders", "orders", "Store"]
        );
        assert!(result.entry_point);
    }

    #[test]
    fn test_go_exports_and_routes() {
        let content = r#"
package main

type Server struct{}
func (s *Server) Start() error { return nil }
func helper() {}
func main() {
    r.GET("/ping", ping)
    mux.HandleFunc("DELETE /users/{id}", del)
}
"#;
        let result = extract("cmd/api/main.go", content);
        assert_eq!(
            result.symbols,
            vec!["Server", "Start", "GET /ping", "DELETE /users/{id}"]
        );
        assert!(result.entry_point);
    }

    #[test]
    fn test_symbol_limit_and_dedup() {
        let content = "export const a = 1;\nexport const a = 2;\nexport const b = 1;\nexport const c = 1;\n";
        let result = SymbolExtractor::with_max_symbols(2)
            .extract("lib.ts", Language::TypeScript, content)
            .unwrap();
        assert_eq!(result.symbols, vec!["a", "b"]);
    }

    #[test]
    fn test_syntax_errors_keep_valid_declarations() {
        let result = extract("src/broken.ts", "export function ok() {}\nexport const = ;\n");
        assert_eq!(result.symbols.first().map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_nested_index_not_entry_point() {
        assert!(extract("src/index.ts", "").entry_point);
        assert!(!extract("src/components/index.ts", "").entry_point);
    }

    #[test]
    fn test_unknown_language_has_no_symbols() {
        let result = SymbolExtractor::default()
            .extract("notes.txt", Language::Unknown, "export const a = 1;")
            .unwrap();
        assert!(result.symbols.is_empty());
    }
}
