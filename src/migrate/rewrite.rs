//! Syntax-aware identifier rewriting.
//!
//! Only `identifier` tokens are touched, so names inside string literals
//! and comments are never rewritten.

use crate::analyzers::parser::node_text;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use tree_sitter::{Node, Tree};

const STRING_KINDS: &[&str] = &["string", "template_string"];

/// Visit every node of a tree in document order
fn visit<'t>(tree: &'t Tree, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = tree.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Byte ranges of every identifier token spelled `name`
pub fn identifier_ranges(tree: &Tree, source: &str, name: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    visit(tree, |node| {
        if node.kind() == "identifier" && node_text(&node, source) == name {
            ranges.push(node.byte_range());
        }
    });
    ranges
}

/// Raw text of every string literal in a file
pub fn string_literals(tree: &Tree, source: &str) -> Vec<String> {
    let mut literals = Vec::new();
    visit(tree, |node| {
        if STRING_KINDS.contains(&node.kind()) {
            literals.push(node_text(&node, source).to_string());
        }
    });
    literals
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `word` occurs in `text` delimited by non-identifier characters
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
    })
}

/// Apply replacements back to front so earlier byte offsets stay valid.
/// Overlapping ranges keep the first one seen from the end.
pub fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut output = source.to_string();
    let mut floor = usize::MAX;
    for (range, replacement) in edits {
        if range.end > floor {
            continue;
        }
        floor = range.start;
        output.replace_range(range, &replacement);
    }
    output
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Python module name a file is imported under: `pkg/utils.py` -> `utils`,
/// `pkg/__init__.py` -> `pkg`
fn python_module_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    if stem == "__init__" {
        return path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned());
    }
    Some(stem.into_owned())
}

/// Whether `importer` imports `name` from the module defined at `defining`
pub fn imports_name(
    importer: &Path,
    tree: &Tree,
    source: &str,
    name: &str,
    defining: &Path,
    python: bool,
) -> bool {
    if python {
        python_imports_name(tree, source, name, defining)
    } else {
        ecmascript_imports_name(importer, tree, source, name, defining)
    }
}

fn python_imports_name(tree: &Tree, source: &str, name: &str, defining: &Path) -> bool {
    let Some(module) = python_module_name(defining) else {
        return false;
    };
    let mut found = false;
    visit(tree, |node| {
        if found || node.kind() != "import_from_statement" {
            return;
        }
        let from_module = node
            .child_by_field_name("module_name")
            .map(|m| node_text(&m, source).trim_start_matches('.'))
            .unwrap_or_default();
        if from_module.rsplit('.').next() != Some(module.as_str()) {
            return;
        }
        let mut cursor = node.walk();
        found = node
            .children_by_field_name("name", &mut cursor)
            .any(|imported| {
                let imported = match imported.kind() {
                    "aliased_import" => imported.child_by_field_name("name").unwrap_or(imported),
                    _ => imported,
                };
                node_text(&imported, source) == name
            });
    });
    found
}

fn ecmascript_imports_name(
    importer: &Path,
    tree: &Tree,
    source: &str,
    name: &str,
    defining: &Path,
) -> bool {
    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    let target = normalize(&defining.with_extension(""));
    let index_target = normalize(defining.parent().unwrap_or_else(|| Path::new("")));
    let defines_index = defining.file_stem().is_some_and(|s| s == "index");

    let mut found = false;
    visit(tree, |node| {
        if found || node.kind() != "import_statement" {
            return;
        }
        let Some(specifier) = crate::analyzers::typescript::import_source(&node, source) else {
            return;
        };
        if !specifier.starts_with('.') {
            return;
        }
        let resolved = normalize(&base.join(&specifier));
        let stripped = normalize(&base.join(&specifier).with_extension(""));
        let matches_module = resolved == target
            || stripped == target
            || (defines_index && resolved == index_target);
        if !matches_module {
            return;
        }
        let mut named = false;
        visit_subtree(node, |child| {
            if child.kind() == "import_specifier" {
                let imported = child.child_by_field_name("name").unwrap_or(child);
                named |= node_text(&imported, source) == name;
            }
        });
        found = named;
    });
    found
}

fn visit_subtree<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        f(node);
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::parse_file;
    use crate::core::{Language, SourceFile};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn tree(path: &str, language: Language, source: &str) -> (SourceFile, Tree) {
        let file = SourceFile::new(path, language, source);
        let tree = parse_file(&file).unwrap();
        (file, tree)
    }

    #[test]
    fn test_identifier_ranges_skip_strings_and_comments() {
        let source = indoc! {r#"
            def userData():
                # userData is old
                return "userData"

            x = userData()
        "#};
        let (_, tree) = tree("a.py", Language::Python, source);
        let ranges = identifier_ranges(&tree, source, "userData");
        assert_eq!(ranges.len(), 2);

        let edits = ranges
            .into_iter()
            .map(|r| (r, "get_user_data".to_string()))
            .collect();
        let rewritten = apply_edits(source, edits);
        assert!(rewritten.contains("def get_user_data():"));
        assert!(rewritten.contains("x = get_user_data()"));
        assert!(rewritten.contains("# userData is old"));
        assert!(rewritten.contains("return \"userData\""));
    }

    #[test]
    fn test_apply_edits_reverse_order() {
        let edits = vec![(0..1, "alpha".to_string()), (4..5, "beta".to_string())];
        assert_eq!(apply_edits("a + b", edits), "alpha + beta");
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("getattr(mod, 'userData')", "userData"));
        assert!(!contains_word("userDataCache", "userData"));
        assert!(!contains_word("my_userData", "userData"));
        assert!(contains_word("x.userData", "userData"));
    }

    #[test]
    fn test_string_literals() {
        let source = "__all__ = ['userData']\nmsg = `hi ${name}`\n";
        let (_, tree) = tree("a.js", Language::JavaScript, source);
        let literals = string_literals(&tree, source);
        assert_eq!(literals, vec!["'userData'", "`hi ${name}`"]);
    }

    #[test]
    fn test_python_from_import() {
        let source = "from app.utils import userData, other as o\nuserData()\n";
        let (file, tree) = tree("app/main.py", Language::Python, source);
        let defining = Path::new("app/utils.py");
        assert!(imports_name(&file.path, &tree, source, "userData", defining, true));
        assert!(imports_name(&file.path, &tree, source, "other", defining, true));
        assert!(!imports_name(&file.path, &tree, source, "userData", Path::new("app/models.py"), true));
    }

    #[test]
    fn test_ecmascript_relative_import() {
        let source = "import { userData } from './lib/users';\nuserData();\n";
        let (file, tree) = tree("src/app.js", Language::JavaScript, source);
        assert!(imports_name(
            &file.path,
            &tree,
            source,
            "userData",
            Path::new("src/lib/users.js"),
            false
        ));
        assert!(!imports_name(
            &file.path,
            &tree,
            source,
            "userData",
            Path::new("src/users.js"),
            false
        ));
    }

    #[test]
    fn test_ecmascript_package_import_ignored() {
        let source = "import { userData } from 'users';\n";
        let (file, tree) = tree("src/app.js", Language::JavaScript, source);
        assert!(!imports_name(
            &file.path,
            &tree,
            source,
            "userData",
            Path::new("src/users.js"),
            false
        ));
    }
}
