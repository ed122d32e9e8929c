// src/analysis/walker.rs
//! Metrics walker: cyclomatic and cognitive complexity over one body.
//!
//! Scoring rules:
//! 1. Cyclomatic starts at 1 and gains 1 per conditional, loop and match arm,
//!    plus one per exception handler and one for a `finally` clause.
//! 2. Cognitive gains `1 + nesting` for every conditional, loop, match arm,
//!    `try`, `with` and comprehension; each handler adds a flat 1.
//! 3. `elif` and `else if` cost `1 + nesting` of the chain head; they do not
//!    nest one level deeper per link. Bodies of every branch nest one level.
//! 4. A chain of N short-circuit operands adds N - 1 to cognitive.
//! 5. Nested named definitions are measured on their own and skipped here.
//!
//! Nesting depth lives in a [`Depth`] counter whose guards restore the prior
//! value on drop, so unwinding out of a subtree never leaks depth.

use std::cell::Cell;

use tree_sitter::Node;

/// Accumulated scores for one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scores {
    pub cyclomatic: usize,
    pub cognitive: usize,
}

impl Default for Scores {
    fn default() -> Self {
        Self { cyclomatic: 1, cognitive: 0 }
    }
}

/// Scope-guarded nesting counter.
#[derive(Debug, Default)]
pub struct Depth(Cell<usize>);

impl Depth {
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Increments the depth until the returned guard is dropped.
    #[must_use]
    pub fn enter(&self) -> DepthGuard<'_> {
        let prior = self.0.get();
        self.0.set(prior + 1);
        DepthGuard { depth: &self.0, prior }
    }
}

pub struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
    prior: usize,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.prior);
    }
}

/// How a syntax node affects the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    /// `if`, `elif`, ternary, loops, match arms.
    Branch,
    Try,
    /// `except` / `catch`.
    Handler,
    /// `with` blocks.
    Resource,
    Comprehension,
    /// One short-circuit operator joining two operands.
    Logical,
    /// Named function or class definition nested in the body.
    Definition,
    Plain,
}

fn classify(node: Node, source: &str) -> Construct {
    match node.kind() {
        "if_statement" | "elif_clause" | "if_expression" | "if_let_expression"
        | "conditional_expression" | "ternary_expression" | "for_statement"
        | "for_in_statement" | "while_statement" | "do_statement" | "for_expression"
        | "while_expression" | "while_let_expression" | "loop_expression"
        | "case_clause" | "match_arm" | "switch_case" => Construct::Branch,

        "try_statement" => Construct::Try,
        "except_clause" | "except_group_clause" | "catch_clause" => Construct::Handler,
        "with_statement" => Construct::Resource,

        "list_comprehension" | "dictionary_comprehension" | "set_comprehension"
        | "generator_expression" => Construct::Comprehension,

        "boolean_operator" => Construct::Logical,
        "binary_expression" if is_short_circuit(node, source) => Construct::Logical,

        kind if is_definition(kind) => Construct::Definition,
        _ => Construct::Plain,
    }
}

/// Named definitions that are scored as declarations of their own.
pub(crate) fn is_definition(kind: &str) -> bool {
    matches!(
        kind,
        "function_definition" | "class_definition" | "decorated_definition"
            | "function_item" | "impl_item" | "trait_item" | "mod_item"
            | "function_declaration" | "generator_function_declaration"
            | "class_declaration" | "method_definition"
    )
}

fn is_short_circuit(node: Node, source: &str) -> bool {
    let Some(op) = node.child_by_field_name("operator") else {
        return false;
    };
    op.utf8_text(source.as_bytes())
        .is_ok_and(|text| matches!(text, "&&" | "||" | "??"))
}

fn is_if(kind: &str) -> bool {
    matches!(kind, "if_statement" | "elif_clause" | "if_expression" | "if_let_expression")
}

fn is_handler(kind: &str) -> bool {
    matches!(kind, "except_clause" | "except_group_clause" | "catch_clause")
}

/// Walks a declaration body and accumulates [`Scores`].
pub struct MetricsWalker<'a> {
    source: &'a str,
    scores: Scores,
}

impl<'a> MetricsWalker<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self { source, scores: Scores::default() }
    }

    /// Measures the body of a function-like node. Expression bodies (arrow
    /// functions) are scored as written; blocks fall through to their children.
    #[must_use]
    pub fn measure(body: Node, source: &str) -> Scores {
        let mut walker = MetricsWalker::new(source);
        let depth = Depth::default();
        walker.visit(body, &depth);
        walker.scores
    }

    fn visit_children(&mut self, node: Node, depth: &Depth) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, depth);
        }
    }

    fn visit(&mut self, node: Node, depth: &Depth) {
        match classify(node, self.source) {
            Construct::Branch if is_if(node.kind()) => self.visit_if(node, depth),
            Construct::Branch => {
                self.scores.cyclomatic += 1;
                self.scores.cognitive += 1 + depth.get();
                let _nested = depth.enter();
                self.visit_children(node, depth);
            }
            Construct::Try => self.visit_try(node, depth),
            Construct::Handler => {
                self.scores.cognitive += 1;
                self.visit_children(node, depth);
            }
            Construct::Resource => {
                self.scores.cognitive += 1 + depth.get();
                let _nested = depth.enter();
                self.visit_children(node, depth);
            }
            Construct::Comprehension => {
                self.scores.cognitive += 1 + depth.get();
                self.visit_children(node, depth);
            }
            Construct::Logical => {
                self.scores.cognitive += 1;
                self.visit_children(node, depth);
            }
            Construct::Definition => {}
            Construct::Plain => self.visit_children(node, depth),
        }
    }

    /// `elif` clauses and an `if` directly under `else` continue the chain at
    /// the head's depth. Everything else under the `if` nests one level.
    fn visit_if(&mut self, node: Node, depth: &Depth) {
        self.scores.cyclomatic += 1;
        self.scores.cognitive += 1 + depth.get();

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "elif_clause" => self.visit_if(child, depth),
                "else_clause" => self.visit_else(child, depth),
                _ => {
                    let _nested = depth.enter();
                    self.visit(child, depth);
                }
            }
        }
    }

    fn visit_else(&mut self, node: Node, depth: &Depth) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            if is_if(child.kind()) {
                self.visit_if(child, depth);
            } else {
                let _nested = depth.enter();
                self.visit(child, depth);
            }
        }
    }

    /// Only the protected body nests; handlers and `finally` stay at the
    /// depth of the `try` itself.
    fn visit_try(&mut self, node: Node, depth: &Depth) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();

        let handlers = children.iter().filter(|c| is_handler(c.kind())).count();
        let finally = children.iter().any(|c| c.kind() == "finally_clause");

        self.scores.cyclomatic += handlers + usize::from(finally);
        self.scores.cognitive += 1 + depth.get();

        let body_id = node.child_by_field_name("body").map(|b| b.id());
        for child in children {
            if Some(child.id()) == body_id {
                let _nested = depth.enter();
                self.visit_children(child, depth);
            } else {
                self.visit(child, depth);
            }
        }
    }
}

/// Parameter names of a function-like node, each variadic form counted once.
#[must_use]
pub fn parameters(func: Node, source: &str) -> Vec<String> {
    if let Some(single) = func.child_by_field_name("parameter") {
        return vec![node_text(single, source)];
    }
    let Some(params) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| {
            !matches!(
                p.kind(),
                "keyword_separator" | "positional_separator" | "comment" | "attribute_item"
            )
        })
        .map(|p| parameter_name(p, source))
        .filter(|name| !matches!(name.trim(), "*" | "/" | ""))
        .collect()
}

fn parameter_name(node: Node, source: &str) -> String {
    if node.kind() == "identifier" || node.kind() == "self_parameter" {
        return node_text(node, source);
    }
    for field in ["name", "pattern"] {
        if let Some(n) = node.child_by_field_name(field) {
            return node_text(n, source);
        }
    }
    let mut cursor = node.walk();
    let first_ident = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier");
    first_ident.map_or_else(|| node_text(node, source), |n| node_text(n, source))
}

pub(crate) fn node_text(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .map(str::to_string)
        .unwrap_or_default()
}
