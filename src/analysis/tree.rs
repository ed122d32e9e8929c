// src/analysis/tree.rs
//! Syntax-tree analysis for languages with a tree-sitter grammar.
//!
//! Extracts the declaration tree (functions, classes with methods, nested
//! functions, module constants) and scores every callable body with the
//! [`MetricsWalker`].

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::graph::imports;
use crate::lang::Lang;
use crate::types::{
    AnalysisMode, Declaration, DeclarationKind, Diagnostic, DiagnosticKind, MetricRecord,
    SourceUnit,
};

use super::walker::{self, node_text, MetricsWalker};
use super::{Analyzer, AnalyzerSettings, UnitAnalysis};

pub struct TreeAnalyzer {
    lang: Lang,
}

impl TreeAnalyzer {
    #[must_use]
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    fn parse(&self, text: &str) -> Option<Tree> {
        let grammar = self.lang.grammar()?;
        let mut parser = Parser::new();
        parser.set_language(grammar).ok()?;
        parser.parse(text, None)
    }
}

impl Analyzer for TreeAnalyzer {
    fn analyze(&self, path: &Path, text: String, _settings: &AnalyzerSettings) -> UnitAnalysis {
        let mut unit = SourceUnit::new(path, self.lang, String::new());

        let Some(tree) = self.parse(&text) else {
            tracing::warn!("{}: parser produced no tree", unit.id);
            let diagnostic = Diagnostic::new(
                &unit.id,
                DiagnosticKind::ParseError,
                None,
                format!("no {} syntax tree could be built", self.lang.name()),
            );
            unit.text = text;
            return UnitAnalysis { unit, metrics: Vec::new(), references: Vec::new(), diagnostics: vec![diagnostic] };
        };

        let root = tree.root_node();
        let mut ctx = Extraction {
            lang: self.lang,
            source: &text,
            file: &unit.id,
            metrics: Vec::new(),
            diagnostics: Vec::new(),
        };
        let declarations = ctx.collect(root, Scope::Module);

        if root.has_error() && ctx.diagnostics.is_empty() {
            let line = first_error(root).map(|n| n.start_position().row + 1);
            ctx.diagnostics.push(Diagnostic::new(
                &unit.id,
                DiagnosticKind::ParseError,
                line,
                "syntax error outside any declaration".to_string(),
            ));
        }
        for d in &ctx.diagnostics {
            tracing::warn!("{}: {}", d.path, d.message);
        }

        let Extraction { metrics, diagnostics, .. } = ctx;
        let references = imports::from_tree(self.lang, root, &text);

        unit.class_name = declarations
            .iter()
            .find(|d| d.kind == DeclarationKind::Class)
            .map(|d| d.name.clone());
        unit.declarations = declarations;
        unit.text = text;
        UnitAnalysis { unit, metrics, references, diagnostics }
    }
}

/// Where a node sits relative to the declaration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Function,
}

struct Extraction<'a> {
    lang: Lang,
    source: &'a str,
    file: &'a str,
    metrics: Vec<MetricRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl Extraction<'_> {
    /// Collects declarations among the descendants of `container`, stopping
    /// at each declaration found.
    fn collect(&mut self, container: Node, scope: Scope) -> Vec<Declaration> {
        let mut out = Vec::new();
        let mut impls: Vec<(String, Vec<Declaration>)> = Vec::new();

        let mut cursor = container.walk();
        let children: Vec<Node> = container.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_definition" | "function_item" | "function_declaration"
                | "generator_function_declaration" | "method_definition" => {
                    if let Some(decl) = self.callable(child, child, None, scope) {
                        out.push(decl);
                    }
                }
                "decorated_definition" | "export_statement" => {
                    let inner = child.child_by_field_name("definition")
                        .or_else(|| child.child_by_field_name("declaration"));
                    if let Some(inner) = inner {
                        out.extend(self.collect_single(inner, scope));
                    } else {
                        out.extend(self.collect(child, scope));
                    }
                }
                "class_definition" | "class_declaration" | "abstract_class_declaration"
                | "trait_item" => out.push(self.class(child)),
                "struct_item" | "enum_item" | "union_item" => {
                    if let Some(name) = self.name_of(child, "name") {
                        out.push(spanned(Declaration::new(DeclarationKind::Class, name, line_of(child)), child));
                    }
                }
                "impl_item" => {
                    let name = self.name_of(child, "type").unwrap_or_default();
                    let methods = child
                        .child_by_field_name("body")
                        .map(|b| self.collect(b, Scope::Class))
                        .unwrap_or_default();
                    impls.push((name, methods));
                }
                "mod_item" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        out.extend(self.collect(body, scope));
                    }
                }
                "const_item" | "static_item" if scope == Scope::Module => {
                    if let Some(name) = self.name_of(child, "name") {
                        out.push(Declaration::new(DeclarationKind::Const, name, line_of(child)));
                    }
                }
                "lexical_declaration" | "variable_declaration" => {
                    out.extend(self.variable_declarators(child, scope));
                }
                "public_field_definition" | "field_definition" if scope == Scope::Class => {
                    if let Some(decl) = self.arrow_field(child) {
                        out.push(decl);
                    }
                }
                "expression_statement" if scope == Scope::Module && self.lang == Lang::Python => {
                    out.extend(self.python_constant(child));
                }
                _ => out.extend(self.collect(child, scope)),
            }
        }

        attach_impls(&mut out, impls);
        out
    }

    fn collect_single(&mut self, node: Node, scope: Scope) -> Vec<Declaration> {
        match node.kind() {
            "function_definition" | "function_declaration" | "generator_function_declaration" => {
                self.callable(node, node, None, scope).into_iter().collect()
            }
            "class_definition" | "class_declaration" | "abstract_class_declaration" => {
                vec![self.class(node)]
            }
            "lexical_declaration" | "variable_declaration" => self.variable_declarators(node, scope),
            _ => self.collect(node, scope),
        }
    }

    fn class(&mut self, node: Node) -> Declaration {
        let name = self.name_of(node, "name").unwrap_or_default();
        let mut decl = spanned(Declaration::new(DeclarationKind::Class, name, line_of(node)), node);
        if let Some(body) = node.child_by_field_name("body") {
            decl.children = self.collect(body, Scope::Class);
        }
        decl
    }

    /// Scores a function-like node. `func` carries parameters and body;
    /// `span` is the node whose extent is reported (a declarator for arrows).
    fn callable(&mut self, func: Node, span: Node, name: Option<String>, scope: Scope) -> Option<Declaration> {
        let name = name.or_else(|| self.name_of(func, "name"))?;
        let kind = if scope == Scope::Class { DeclarationKind::Method } else { DeclarationKind::Function };
        let line = line_of(span);

        if has_own_error(func) {
            self.diagnostics.push(Diagnostic::new(
                self.file,
                DiagnosticKind::ParseError,
                Some(line),
                format!("syntax error in `{name}`; not scored"),
            ));
            return None;
        }

        let params = walker::parameters(func, self.source);
        let mut decl = spanned(Declaration::new(kind, name.clone(), line), span);

        // Trait and interface signatures have no body and are not scored.
        if let Some(body) = func.child_by_field_name("body") {
            let scores = MetricsWalker::measure(body, self.source);
            self.metrics.push(MetricRecord {
                file: self.file.to_string(),
                name,
                kind,
                line,
                cyclomatic: scores.cyclomatic,
                cognitive: scores.cognitive,
                lines: decl.end_line - line + 1,
                parameters: params.len(),
                mode: AnalysisMode::Tree,
            });
            decl.children = self.collect(body, Scope::Function);
        }
        decl.params = Some(params);
        Some(decl)
    }

    /// `const f = (a) => ...` and `let g = function () {}` bind callables;
    /// upper-case module bindings are constants.
    fn variable_declarators(&mut self, node: Node, scope: Scope) -> Vec<Declaration> {
        let is_const = node.child(0).is_some_and(|k| k.kind() == "const");
        let mut out = Vec::new();
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();

        for declarator in declarators {
            let name = self.name_of(declarator, "name");
            match declarator.child_by_field_name("value") {
                // Closures bound inside a body count toward the enclosing function.
                Some(value) if is_function_value(value.kind()) => {
                    if scope != Scope::Function {
                        out.extend(self.callable(value, declarator, name, scope));
                    }
                }
                Some(value) => {
                    let constant = name.filter(|n| scope == Scope::Module && is_const && is_constant_name(n));
                    if let Some(name) = constant {
                        out.push(Declaration::new(DeclarationKind::Const, name, line_of(declarator)));
                    }
                    out.extend(self.collect(value, scope));
                }
                None => {}
            }
        }
        out
    }

    fn arrow_field(&mut self, field: Node) -> Option<Declaration> {
        let value = field.child_by_field_name("value")?;
        if !is_function_value(value.kind()) {
            return None;
        }
        let name = self.name_of(field, "name").or_else(|| self.name_of(field, "property"));
        self.callable(value, field, name, Scope::Class)
    }

    fn python_constant(&mut self, stmt: Node) -> Vec<Declaration> {
        let Some(assign) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            return self.collect(stmt, Scope::Module);
        };
        let mut out = Vec::new();
        if let Some(left) = assign.child_by_field_name("left").filter(|l| l.kind() == "identifier") {
            let name = node_text(left, self.source);
            if is_constant_name(&name) {
                out.push(Declaration::new(DeclarationKind::Const, name, line_of(stmt)));
            }
        }
        if let Some(right) = assign.child_by_field_name("right") {
            out.extend(self.collect(right, Scope::Module));
        }
        out
    }

    fn name_of(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| node_text(n, self.source))
            .filter(|s| !s.is_empty())
    }
}

fn is_function_value(kind: &str) -> bool {
    matches!(kind, "arrow_function" | "function" | "function_expression" | "generator_function")
}

/// `MAX_SIZE`, `DEFAULT_TIMEOUT_MS`: at least one letter, no lowercase.
fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn spanned(mut decl: Declaration, node: Node) -> Declaration {
    decl.end_line = node.end_position().row + 1;
    decl
}

/// Methods of `impl Foo` become children of the `Foo` declared in the same
/// file; otherwise the impl block stands in as the class.
fn attach_impls(out: &mut Vec<Declaration>, impls: Vec<(String, Vec<Declaration>)>) {
    for (name, methods) in impls {
        let bare = name.split('<').next().unwrap_or(&name).trim().to_string();
        let owner = out
            .iter_mut()
            .find(|d| d.kind == DeclarationKind::Class && d.name == bare);
        match owner {
            Some(class) => class.children.extend(methods),
            None => {
                let line = methods.first().map_or(0, |m| m.line);
                let mut class = Declaration::new(DeclarationKind::Class, bare, line);
                class.end_line = methods.iter().map(|m| m.end_line).max().unwrap_or(line);
                class.children = methods;
                out.push(class);
            }
        }
    }
}

/// True when `node` holds a syntax error outside its nested definitions.
/// Errors inside a nested definition are reported against that definition.
fn has_own_error(node: Node) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).filter(Node::has_error).collect();
    children
        .into_iter()
        .any(|c| !walker::is_definition(c.kind()) && has_own_error(c))
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(Node::has_error)
        .find_map(first_error)
}
