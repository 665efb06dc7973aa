//! Python declaration extraction
//!
//! Walks a tree-sitter-python tree once and collects every function
//! definition (module level, nested and methods) plus module-level
//! assignments to plain identifiers.

use super::parser::{field_text, node_line, node_text, unquote};
use super::DeclarationExtractor;
use crate::core::{
    AssignedValue, Declaration, DeclarationKind, EnclosingScope, Language, SourceFile,
    SourceLocation, ValueShape,
};
use std::collections::HashSet;
use tree_sitter::{Node, Tree};

/// Constructors whose result is a CLI group that commands attach to
const CLI_GROUP_CONSTRUCTORS: &[&str] = &["Typer", "Group", "group"];

pub struct PythonExtractor;

impl DeclarationExtractor for PythonExtractor {
    fn extract(&self, tree: &Tree, file: &SourceFile) -> Vec<Declaration> {
        let root = tree.root_node();
        let ctx = WalkContext {
            source: &file.content,
            file,
            cli_groups: collect_cli_groups(&root, &file.content),
        };

        let mut declarations = Vec::new();
        visit_block(&root, &ctx, Scope::Module, &mut declarations);
        declarations
    }

    fn language(&self) -> Language {
        Language::Python
    }
}

struct WalkContext<'a> {
    source: &'a str,
    file: &'a SourceFile,
    cli_groups: HashSet<String>,
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Module,
    Class(&'a str),
    Function,
}

/// Names bound to CLI group objects: `cli = typer.Typer()` or a function
/// decorated with `@click.group()`.
fn collect_cli_groups(root: &Node, source: &str) -> HashSet<String> {
    let mut groups = HashSet::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "expression_statement" => {
                if let Some((name, value)) = module_assignment(&child, source) {
                    let is_group = value
                        .child_by_field_name("function")
                        .map(|f| node_text(&f, source))
                        .map(|callee| callee.rsplit('.').next().unwrap_or(callee))
                        .is_some_and(|callee| CLI_GROUP_CONSTRUCTORS.contains(&callee));
                    if value.kind() == "call" && is_group {
                        groups.insert(name.to_string());
                    }
                }
            }
            "decorated_definition" => {
                let decorators = decorator_texts(&child, source);
                let is_group = decorators
                    .iter()
                    .any(|d| d.starts_with("@click.group") || d.ends_with(".group()"));
                if is_group {
                    if let Some(name) = child
                        .child_by_field_name("definition")
                        .and_then(|def| field_text(&def, "name", source))
                    {
                        groups.insert(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    groups
}

fn visit_block(node: &Node, ctx: &WalkContext, scope: Scope, out: &mut Vec<Declaration>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => visit_function(&child, &[], ctx, scope, out),
            "decorated_definition" => {
                let decorators = decorator_texts(&child, ctx.source);
                if let Some(definition) = child.child_by_field_name("definition") {
                    match definition.kind() {
                        "function_definition" => {
                            visit_function(&definition, &decorators, ctx, scope, out)
                        }
                        "class_definition" => visit_class(&definition, ctx, out),
                        _ => {}
                    }
                }
            }
            "class_definition" => visit_class(&child, ctx, out),
            "expression_statement" if matches!(scope, Scope::Module) => {
                if let Some(decl) = extract_assignment(&child, ctx) {
                    out.push(decl);
                }
            }
            // Module-level code under `if __name__ == ...` or `try:` still
            // defines module names
            "if_statement" | "try_statement" | "with_statement" | "block" | "else_clause"
            | "except_clause" | "finally_clause" | "elif_clause" => {
                visit_block(&child, ctx, scope, out)
            }
            _ => {}
        }
    }
}

fn visit_class(node: &Node, ctx: &WalkContext, out: &mut Vec<Declaration>) {
    let Some(name) = field_text(node, "name", ctx.source) else {
        return;
    };
    if let Some(body) = node.child_by_field_name("body") {
        visit_block(&body, ctx, Scope::Class(name), out);
    }
}

fn visit_function(
    node: &Node,
    decorators: &[String],
    ctx: &WalkContext,
    scope: Scope,
    out: &mut Vec<Declaration>,
) {
    let Some(name) = field_text(node, "name", ctx.source) else {
        return;
    };

    let (enclosing, parent_class) = match scope {
        Scope::Class(class) => (EnclosingScope::Class, Some(class.to_string())),
        Scope::Module | Scope::Function => {
            let in_cli_group = decorators
                .iter()
                .any(|d| is_group_command(d, &ctx.cli_groups));
            if in_cli_group {
                (EnclosingScope::CliGroup, None)
            } else {
                (EnclosingScope::Module, None)
            }
        }
    };

    let body = node.child_by_field_name("body");
    out.push(Declaration {
        name: name.to_string(),
        kind: DeclarationKind::Function,
        language: Language::Python,
        location: SourceLocation::new(&ctx.file.path, node_line(node)),
        decorators: decorators.to_vec(),
        scope: enclosing,
        parent_class,
        parameters: node
            .child_by_field_name("parameters")
            .map(|params| parameter_names(&params, ctx.source))
            .unwrap_or_default(),
        return_type: field_text(node, "return_type", ctx.source).map(str::to_string),
        docstring: body.as_ref().and_then(|b| docstring(b, ctx.source)),
        value: None,
        contains_jsx: false,
        is_accessor: false,
    });

    if let Some(body) = body {
        visit_block(&body, ctx, Scope::Function, out);
    }
}

/// `@cli.command()` where `cli` is a known group object
fn is_group_command(decorator: &str, groups: &HashSet<String>) -> bool {
    let Some(path) = decorator.strip_prefix('@') else {
        return false;
    };
    let path = path.split('(').next().unwrap_or(path).trim();
    match path.rsplit_once('.') {
        Some((object, "command")) | Some((object, "group")) => groups.contains(object),
        _ => false,
    }
}

fn decorator_texts(node: &Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let decorators = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .map(|child| collapse_whitespace(node_text(&child, source)))
        .collect();
    decorators
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parameter_names(params: &Node, source: &str) -> Vec<String> {
    let mut cursor = params.walk();
    let names = params
        .named_children(&mut cursor)
        .filter_map(|param| parameter_name(&param, source))
        .collect();
    names
}

fn parameter_name(param: &Node, source: &str) -> Option<String> {
    match param.kind() {
        "identifier" => Some(node_text(param, source).to_string()),
        "default_parameter" | "typed_default_parameter" => {
            field_text(param, "name", source).map(str::to_string)
        }
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            let mut cursor = param.walk();
            let name = param
                .named_children(&mut cursor)
                .find(|child| child.kind() == "identifier")
                .map(|child| node_text(&child, source).to_string());
            name
        }
        _ => None,
    }
}

/// First statement of a block when it is a bare string
fn docstring(body: &Node, source: &str) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    Some(unquote(node_text(&string, source)).trim().to_string())
}

/// `name = value` (optionally annotated) where the target is an identifier
fn module_assignment<'t>(statement: &Node<'t>, source: &str) -> Option<(String, Node<'t>)> {
    let assignment = statement.named_child(0)?;
    if assignment.kind() != "assignment" {
        return None;
    }
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let right = assignment.child_by_field_name("right")?;
    Some((node_text(&left, source).to_string(), right))
}

fn extract_assignment(statement: &Node, ctx: &WalkContext) -> Option<Declaration> {
    let (name, right) = module_assignment(statement, ctx.source)?;
    let value = AssignedValue {
        text: collapse_whitespace(node_text(&right, ctx.source)),
        shape: value_shape(&right, ctx.source),
    };
    Some(Declaration::assignment(
        name,
        Language::Python,
        SourceLocation::new(&ctx.file.path, node_line(statement)),
        value,
    ))
}

fn value_shape(node: &Node, source: &str) -> ValueShape {
    if is_literal(node, source) {
        return ValueShape::Literal;
    }
    match node.kind() {
        "list" | "tuple" | "set" | "dictionary" if is_literal_collection(node, source) => {
            ValueShape::LiteralCollection
        }
        "call" => match node.child_by_field_name("function") {
            Some(function) => ValueShape::Call {
                callee: callee_path(&function, source),
            },
            None => ValueShape::Other,
        },
        "parenthesized_expression" => node
            .named_child(0)
            .map(|inner| value_shape(&inner, source))
            .unwrap_or(ValueShape::Other),
        _ => ValueShape::Other,
    }
}

/// `typing.TypeVar` stays dotted, subscripted generics lose their arguments
fn callee_path(function: &Node, source: &str) -> String {
    match function.kind() {
        "subscript" => function
            .child_by_field_name("value")
            .map(|value| callee_path(&value, source))
            .unwrap_or_default(),
        _ => collapse_whitespace(node_text(function, source)),
    }
}

fn is_literal(node: &Node, source: &str) -> bool {
    match node.kind() {
        "string" => {
            // f-strings with interpolation are computed values
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|child| child.kind() == "interpolation");
            !interpolated
        }
        "concatenated_string" | "integer" | "float" | "true" | "false" | "none" => true,
        "unary_operator" => node
            .child_by_field_name("argument")
            .is_some_and(|arg| matches!(arg.kind(), "integer" | "float")),
        "binary_operator" => {
            let left = node.child_by_field_name("left");
            let right = node.child_by_field_name("right");
            matches!((left, right), (Some(l), Some(r)) if is_literal(&l, source) && is_literal(&r, source))
        }
        _ => false,
    }
}

fn is_literal_collection(node: &Node, source: &str) -> bool {
    let mut cursor = node.walk();
    let all_literal = node.named_children(&mut cursor).all(|element| match element.kind() {
        "pair" => {
            let key = element.child_by_field_name("key");
            let value = element.child_by_field_name("value");
            matches!((key, value), (Some(k), Some(v)) if is_literal_element(&k, source) && is_literal_element(&v, source))
        }
        "comment" => true,
        _ => is_literal_element(&element, source),
    });
    all_literal
}

fn is_literal_element(node: &Node, source: &str) -> bool {
    is_literal(node, source)
        || (matches!(node.kind(), "list" | "tuple" | "set" | "dictionary")
            && is_literal_collection(node, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::extract_declarations;
    use indoc::indoc;

    fn extract(source: &str) -> Vec<Declaration> {
        let file = SourceFile::new("app.py", Language::Python, source);
        extract_declarations(&file).unwrap()
    }

    fn find<'a>(decls: &'a [Declaration], name: &str) -> &'a Declaration {
        decls
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("no declaration named {name}"))
    }

    #[test]
    fn test_extracts_functions_and_assignments() {
        let decls = extract(indoc! {r#"
            import logging

            MAX_RETRIES = 3
            logger = logging.getLogger(__name__)

            def get_user(user_id: int) -> dict:
                """Return a user."""
                return {}
        "#});

        assert_eq!(decls.len(), 3);
        let max = find(&decls, "MAX_RETRIES");
        assert_eq!(max.kind, DeclarationKind::Assignment);
        assert_eq!(max.value_shape(), Some(&ValueShape::Literal));

        let logger = find(&decls, "logger");
        assert_eq!(
            logger.value_shape().and_then(|s| s.callee()),
            Some("logging.getLogger")
        );

        let func = find(&decls, "get_user");
        assert_eq!(func.location.line, 6);
        assert_eq!(func.parameters, vec!["user_id"]);
        assert_eq!(func.return_type.as_deref(), Some("dict"));
        assert_eq!(func.docstring.as_deref(), Some("Return a user."));
    }

    #[test]
    fn test_decorators_and_class_scope() {
        let decls = extract(indoc! {r#"
            class UserView:
                @property
                def full_name(self):
                    return ""

                def get(self, request, pk=None):
                    pass
        "#});

        let prop = find(&decls, "full_name");
        assert_eq!(prop.decorators, vec!["@property"]);
        assert_eq!(prop.scope, EnclosingScope::Class);
        assert_eq!(prop.parent_class.as_deref(), Some("UserView"));

        let get = find(&decls, "get");
        assert_eq!(get.parameters, vec!["self", "request", "pk"]);
    }

    #[test]
    fn test_cli_group_scope() {
        let decls = extract(indoc! {r#"
            import typer

            cli = typer.Typer()

            @cli.command()
            def start():
                pass

            @other.command()
            def stop():
                pass
        "#});

        assert_eq!(find(&decls, "start").scope, EnclosingScope::CliGroup);
        assert_eq!(find(&decls, "stop").scope, EnclosingScope::Module);
    }

    #[test]
    fn test_click_group_function_is_group() {
        let decls = extract(indoc! {r#"
            import click

            @click.group()
            def main():
                pass

            @main.command()
            def build():
                pass
        "#});

        assert_eq!(find(&decls, "build").scope, EnclosingScope::CliGroup);
    }

    #[test]
    fn test_literal_collection_shapes() {
        let decls = extract(indoc! {r#"
            ALLOWED = ["a", "b", 3]
            MAPPING = {"x": 1, "y": (2, 3)}
            COMPUTED = [x for x in range(3)]
            GREETING = f"hello {name}"
            T = TypeVar("T")
        "#});

        assert_eq!(
            find(&decls, "ALLOWED").value_shape(),
            Some(&ValueShape::LiteralCollection)
        );
        assert_eq!(
            find(&decls, "MAPPING").value_shape(),
            Some(&ValueShape::LiteralCollection)
        );
        assert_eq!(find(&decls, "COMPUTED").value_shape(), Some(&ValueShape::Other));
        assert_eq!(find(&decls, "GREETING").value_shape(), Some(&ValueShape::Other));
        assert_eq!(
            find(&decls, "T").value_shape().and_then(|s| s.callee_name()),
            Some("TypeVar")
        );
    }

    #[test]
    fn test_function_local_assignments_are_ignored() {
        let decls = extract(indoc! {r#"
            def build_index():
                local_value = 1

                def helper():
                    pass
                return local_value
        "#});

        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["build_index", "helper"]);
    }
}
