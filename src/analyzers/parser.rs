//! Tree-sitter parser integration
//!
//! Provides parsing using tree-sitter grammars for Python, JS/JSX and TS/TSX.

use crate::core::{Error, Language, Result};
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Node, Parser, Tree};

/// Get the tree-sitter grammar for a file. `.tsx` needs the TSX grammar,
/// plain JavaScript is parsed with JSX support enabled.
fn get_language(language: Language, path: &Path) -> TsLanguage {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => {
            let is_tsx = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tsx"));
            if is_tsx {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            } else {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
        }
    }
}

/// Parse source code, rejecting trees that contain syntax errors
pub fn parse_source(content: &str, path: &Path, language: Language) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&get_language(language, path))
        .map_err(|e| Error::parse(path, 0, format!("failed to load {language} grammar: {e}")))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| Error::parse(path, 0, "parser returned no tree"))?;

    if has_parse_errors(&tree) {
        let line = first_error_line(tree.root_node()).unwrap_or(1);
        return Err(Error::parse(path, line, "syntax error"));
    }

    Ok(tree)
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Line of the first ERROR or MISSING node, depth first
fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node_line(&node));
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find_map(first_error_line);
    found.or(Some(node_line(&node)))
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Text of a named field, if present
pub fn field_text<'a>(node: &Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field)
        .map(|child| node_text(&child, source))
}

/// Whether any descendant (including `node`) has one of the given kinds
pub fn contains_kind(node: &Node, kinds: &[&str]) -> bool {
    if kinds.contains(&node.kind()) {
        return true;
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .any(|child| contains_kind(&child, kinds));
    found
}

/// Strip quotes and string prefixes from a string literal's source text
pub fn unquote(text: &str) -> &str {
    let text = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'", "`"] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}
