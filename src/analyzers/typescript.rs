//! JavaScript/TypeScript declaration extraction
//!
//! Collects function declarations, class methods (with decorators) and
//! module-level `const`/`let`/`var` declarators. A declarator bound to an
//! arrow function or function expression counts as a function.

use super::parser::{contains_kind, field_text, node_line, node_text, unquote};
use super::DeclarationExtractor;
use crate::core::{
    AssignedValue, Declaration, DeclarationKind, EnclosingScope, Language, SourceFile,
    SourceLocation, ValueShape,
};
use tree_sitter::{Node, Tree};

const JSX_KINDS: &[&str] = &["jsx_element", "jsx_self_closing_element", "jsx_fragment"];

const FUNCTION_VALUE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

pub struct EcmaScriptExtractor {
    language: Language,
}

impl EcmaScriptExtractor {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl DeclarationExtractor for EcmaScriptExtractor {
    fn extract(&self, tree: &Tree, file: &SourceFile) -> Vec<Declaration> {
        let ctx = WalkContext {
            source: &file.content,
            file,
            language: self.language,
        };
        let mut declarations = Vec::new();
        visit_statements(&tree.root_node(), &ctx, true, &mut declarations);
        declarations
    }

    fn language(&self) -> Language {
        self.language
    }
}

struct WalkContext<'a> {
    source: &'a str,
    file: &'a SourceFile,
    language: Language,
}

impl WalkContext<'_> {
    fn location(&self, node: &Node) -> SourceLocation {
        SourceLocation::new(&self.file.path, node_line(node))
    }
}

/// Walk a statement list. `module_level` controls whether plain variable
/// declarators are recorded as assignments.
fn visit_statements(
    node: &Node,
    ctx: &WalkContext,
    module_level: bool,
    out: &mut Vec<Declaration>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit_statement(&child, ctx, module_level, out);
    }
}

fn visit_statement(
    node: &Node,
    ctx: &WalkContext,
    module_level: bool,
    out: &mut Vec<Declaration>,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = field_text(node, "name", ctx.source) {
                out.push(function_declaration(
                    name,
                    node,
                    node,
                    ctx,
                    EnclosingScope::Module,
                    None,
                    Vec::new(),
                ));
            }
            if let Some(body) = node.child_by_field_name("body") {
                visit_statements(&body, ctx, false, out);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    visit_declarator(&declarator, node, ctx, module_level, out);
                }
            }
        }
        "export_statement" => {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                visit_statement(&declaration, ctx, module_level, out);
            }
        }
        "class_declaration" | "abstract_class_declaration" => visit_class(node, ctx, out),
        "statement_block" => visit_statements(node, ctx, false, out),
        _ => {}
    }
}

fn visit_declarator(
    declarator: &Node,
    statement: &Node,
    ctx: &WalkContext,
    module_level: bool,
    out: &mut Vec<Declaration>,
) {
    let Some(name_node) = declarator.child_by_field_name("name") else {
        return;
    };
    // Destructuring patterns bind several names; skip them
    if name_node.kind() != "identifier" {
        return;
    }
    let name = node_text(&name_node, ctx.source);
    let Some(value) = declarator.child_by_field_name("value") else {
        return;
    };

    if FUNCTION_VALUE_KINDS.contains(&value.kind()) {
        out.push(function_declaration(
            name,
            statement,
            &value,
            ctx,
            EnclosingScope::Module,
            None,
            Vec::new(),
        ));
        if let Some(body) = value.child_by_field_name("body") {
            visit_statements(&body, ctx, false, out);
        }
        return;
    }

    if module_level {
        let assigned = AssignedValue {
            text: collapse_whitespace(node_text(&value, ctx.source)),
            shape: value_shape(&value, ctx.source),
        };
        let mut decl =
            Declaration::assignment(name, ctx.language, ctx.location(statement), assigned);
        decl.docstring = doc_comment(statement, ctx.source);
        out.push(decl);
    }
}

fn visit_class(node: &Node, ctx: &WalkContext, out: &mut Vec<Declaration>) {
    let Some(class_name) = field_text(node, "name", ctx.source) else {
        return;
    };
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    // TypeScript puts member decorators in the class body ahead of the
    // member; JavaScript nests them inside the member node.
    let mut pending: Vec<String> = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "decorator" => pending.push(collapse_whitespace(node_text(&member, ctx.source))),
            "method_definition" => {
                let mut decorators = std::mem::take(&mut pending);
                decorators.extend(inner_decorators(&member, ctx.source));
                if let Some(name) = field_text(&member, "name", ctx.source) {
                    let mut decl = function_declaration(
                        name,
                        &member,
                        &member,
                        ctx,
                        EnclosingScope::Class,
                        Some(class_name),
                        decorators,
                    );
                    decl.is_accessor = is_accessor(&member);
                    out.push(decl);
                }
            }
            "public_field_definition" | "field_definition" => {
                let mut decorators = std::mem::take(&mut pending);
                decorators.extend(inner_decorators(&member, ctx.source));
                let name = field_text(&member, "name", ctx.source)
                    .or_else(|| field_text(&member, "property", ctx.source));
                let value = member.child_by_field_name("value");
                if let (Some(name), Some(value)) = (name, value) {
                    if FUNCTION_VALUE_KINDS.contains(&value.kind()) {
                        out.push(function_declaration(
                            name,
                            &member,
                            &value,
                            ctx,
                            EnclosingScope::Class,
                            Some(class_name),
                            decorators,
                        ));
                    }
                }
            }
            _ => pending.clear(),
        }
    }
}

/// `get x()` / `set x(v)`: the keyword is an anonymous child, the name a
/// named one, so a method called `get` is not an accessor
fn is_accessor(method: &Node) -> bool {
    let mut cursor = method.walk();
    let found = method
        .children(&mut cursor)
        .any(|child| !child.is_named() && matches!(child.kind(), "get" | "set"));
    found
}

fn inner_decorators(member: &Node, source: &str) -> Vec<String> {
    let mut cursor = member.walk();
    let decorators = member
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "decorator")
        .map(|child| collapse_whitespace(node_text(&child, source)))
        .collect();
    decorators
}

/// Build a function declaration. `anchor` gives the line and leading doc
/// comment, `function` carries parameters, return type and body.
fn function_declaration(
    name: &str,
    anchor: &Node,
    function: &Node,
    ctx: &WalkContext,
    scope: EnclosingScope,
    parent_class: Option<&str>,
    decorators: Vec<String>,
) -> Declaration {
    let body = function.child_by_field_name("body");
    Declaration {
        name: name.to_string(),
        kind: DeclarationKind::Function,
        language: ctx.language,
        location: ctx.location(anchor),
        decorators,
        scope,
        parent_class: parent_class.map(str::to_string),
        parameters: parameter_names(function, ctx.source),
        return_type: field_text(function, "return_type", ctx.source)
            .map(|t| t.trim_start_matches(':').trim().to_string()),
        docstring: doc_comment(anchor, ctx.source),
        value: None,
        contains_jsx: body.is_some_and(|b| contains_kind(&b, JSX_KINDS)),
        is_accessor: false,
    }
}

fn parameter_names(function: &Node, source: &str) -> Vec<String> {
    // `x => x` has a single bare parameter
    if let Some(single) = function.child_by_field_name("parameter") {
        return vec![node_text(&single, source).to_string()];
    }
    let Some(params) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let names = params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "comment")
        .map(|param| {
            let target = match param.kind() {
                "required_parameter" | "optional_parameter" => param.child_by_field_name("pattern"),
                "assignment_pattern" => param.child_by_field_name("left"),
                _ => None,
            };
            node_text(&target.unwrap_or(param), source).to_string()
        })
        .collect();
    names
}

/// Leading `/** ... */` comment directly above a declaration (or its export)
fn doc_comment(node: &Node, source: &str) -> Option<String> {
    let anchor = match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => *node,
    };
    let comment = anchor.prev_named_sibling()?;
    if comment.kind() != "comment" {
        return None;
    }
    let text = node_text(&comment, source);
    let inner = text.strip_prefix("/**")?.strip_suffix("*/")?;
    let cleaned = inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn value_shape(node: &Node, source: &str) -> ValueShape {
    if is_literal(node) {
        return ValueShape::Literal;
    }
    match node.kind() {
        "array" | "object" if is_literal_collection(node) => ValueShape::LiteralCollection,
        "call_expression" => node
            .child_by_field_name("function")
            .map(|f| ValueShape::Call {
                callee: collapse_whitespace(node_text(&f, source)),
            })
            .unwrap_or(ValueShape::Other),
        "new_expression" => node
            .child_by_field_name("constructor")
            .map(|c| ValueShape::Call {
                callee: collapse_whitespace(node_text(&c, source)),
            })
            .unwrap_or(ValueShape::Other),
        // `[...] as const`, `{...} satisfies Config`, `(value)`
        "as_expression" | "satisfies_expression" | "parenthesized_expression"
        | "non_null_expression" => node
            .named_child(0)
            .map(|inner| value_shape(&inner, source))
            .unwrap_or(ValueShape::Other),
        _ => ValueShape::Other,
    }
}

fn is_literal(node: &Node) -> bool {
    match node.kind() {
        "string" | "number" | "true" | "false" | "null" | "undefined" | "regex" => true,
        "template_string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|child| child.kind() == "template_substitution");
            !interpolated
        }
        "unary_expression" => node
            .child_by_field_name("argument")
            .is_some_and(|arg| arg.kind() == "number"),
        _ => false,
    }
}

fn is_literal_collection(node: &Node) -> bool {
    let mut cursor = node.walk();
    let all_literal = node.named_children(&mut cursor).all(|element| match element.kind() {
        "pair" => element
            .child_by_field_name("value")
            .is_some_and(|v| is_literal_element(&v)),
        "comment" => true,
        _ => is_literal_element(&element),
    });
    all_literal
}

fn is_literal_element(node: &Node) -> bool {
    match node.kind() {
        "array" | "object" => is_literal_collection(node),
        "as_expression" | "satisfies_expression" => {
            node.named_child(0).is_some_and(|inner| is_literal_element(&inner))
        }
        _ => is_literal(node),
    }
}

/// String literal contents for a `source` field, e.g. `import x from 'react'`
pub(crate) fn import_source(node: &Node, source: &str) -> Option<String> {
    field_text(node, "source", source).map(|s| unquote(s).to_string())
}
