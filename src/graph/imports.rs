// src/graph/imports.rs
//! Candidate reference extraction.
//!
//! Tree languages use tree-sitter queries; GDScript and C# use line regexes.

use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::{Node, Query, QueryCursor};

use crate::lang::Lang;
use crate::types::{RawReference, ReferenceKind};

/// Runs the language's import query over an already parsed tree.
#[must_use]
pub fn from_tree(lang: Lang, root: Node, source: &str) -> Vec<RawReference> {
    let (Some(grammar), Some(pattern)) = (lang.grammar(), lang.q_imports()) else {
        return Vec::new();
    };
    let query = match Query::new(grammar, pattern) {
        Ok(q) => q,
        Err(e) => {
            tracing::warn!("invalid import query for {}: {e}", lang.name());
            return Vec::new();
        }
    };

    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut refs = Vec::new();

    for m in cursor.matches(&query, root, source.as_bytes()) {
        for capture in m.captures {
            let Some(name) = names.get(capture.index as usize) else {
                continue;
            };
            let node = capture.node;
            let line = node.start_position().row + 1;
            match name.as_str() {
                "import" => push_import(lang, node, source, line, &mut refs),
                "mod" => push_mod(node, source, line, &mut refs),
                "from" => push_from(node, source, line, &mut refs),
                _ => {}
            }
        }
    }

    refs
}

fn push_import(lang: Lang, node: Node, source: &str, line: usize, out: &mut Vec<RawReference>) {
    let Ok(text) = node.utf8_text(source.as_bytes()) else {
        return;
    };
    if lang == Lang::Rust {
        for path in expand_use_tree(text) {
            out.push(RawReference::new(path, ReferenceKind::Import, line));
        }
    } else {
        out.push(RawReference::new(clean_text(text), ReferenceKind::Import, line));
    }
}

/// `mod foo;` pulls in a file; inline `mod foo { .. }` does not.
fn push_mod(node: Node, source: &str, line: usize, out: &mut Vec<RawReference>) {
    if node.child_by_field_name("body").is_some() {
        return;
    }
    if let Some(name) = node.child_by_field_name("name") {
        if let Ok(text) = name.utf8_text(source.as_bytes()) {
            out.push(RawReference::new(text, ReferenceKind::Include, line));
        }
    }
}

/// `from M import a, b` yields `M.a` and `M.b`. A wildcard import yields `M`.
fn push_from(node: Node, source: &str, line: usize, out: &mut Vec<RawReference>) {
    let Some(module) = node
        .child_by_field_name("module_name")
        .and_then(|m| m.utf8_text(source.as_bytes()).ok())
    else {
        return;
    };

    let mut cursor = node.walk();
    let names: Vec<&str> = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|n| {
            let n = if n.kind() == "aliased_import" { n.child_by_field_name("name")? } else { n };
            n.utf8_text(source.as_bytes()).ok()
        })
        .collect();

    if names.is_empty() {
        out.push(RawReference::new(module, ReferenceKind::Import, line));
        return;
    }
    let sep = if module.ends_with('.') { "" } else { "." };
    for name in names {
        out.push(RawReference::new(format!("{module}{sep}{name}"), ReferenceKind::FromImport, line));
    }
}

fn clean_text(text: &str) -> String {
    // Remove quotes for JS/TS strings
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

static USE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+as\s+[A-Za-z_][A-Za-z0-9_]*").unwrap_or_else(|_| panic!("Invalid Regex")));

/// Flattens a Rust use tree: `crate::a::{b, c::D}` → `crate::a::b`, `crate::a::c::D`.
#[must_use]
pub fn expand_use_tree(text: &str) -> Vec<String> {
    let without_alias = USE_ALIAS.replace_all(text, "");
    let compact: String = without_alias.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = Vec::new();
    expand_into("", &compact, &mut out);
    out
}

fn expand_into(prefix: &str, tree: &str, out: &mut Vec<String>) {
    let Some(open) = tree.find('{') else {
        let full = join_use(prefix, tree);
        let trimmed = full
            .trim_end_matches("::*")
            .trim_end_matches("::self")
            .to_string();
        if !trimmed.is_empty() && trimmed != "*" {
            out.push(trimmed);
        }
        return;
    };

    let head = tree[..open].trim_end_matches("::");
    let inner = tree[open + 1..].strip_suffix('}').unwrap_or(&tree[open + 1..]);
    let new_prefix = join_use(prefix, head);

    for item in split_top_level(inner) {
        expand_into(&new_prefix, item, out);
    }
}

fn join_use(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}::{rest}"),
    }
}

fn split_top_level(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

// --- Line-based extraction (GDScript, C#) ---

static GD_EXTENDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:class_name\s+[A-Za-z_][A-Za-z0-9_]*\s+)?extends\s+(?:"([^"]+)"|'([^']+)'|([A-Za-z_][A-Za-z0-9_.]*))"#,
    )
    .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_PRELOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bpreload\(\s*["']([^"']+)["']\s*\)"#).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_LOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bload\(\s*["']([^"']+)["']\s*\)"#).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static CS_USING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^using\s+(?:static\s+)?(?:[A-Za-z_][A-Za-z0-9_]*\s*=\s*)?([A-Za-z_][A-Za-z0-9_.]*)\s*;")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static CS_BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclass\s+[A-Za-z_][A-Za-z0-9_]*(?:<[^>]*>)?\s*:\s*([A-Za-z_][A-Za-z0-9_.]*)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Line-regex extraction for languages without a grammar.
#[must_use]
pub fn from_lines(lang: Lang, source: &str) -> Vec<RawReference> {
    let mut refs = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        match lang {
            Lang::GdScript => {
                if trimmed.starts_with('#') {
                    continue;
                }
                scan_gdscript_line(raw, trimmed, line, &mut refs);
            }
            Lang::CSharp => {
                if trimmed.starts_with("//") {
                    continue;
                }
                scan_csharp_line(trimmed, line, &mut refs);
            }
            _ => {}
        }
    }
    refs
}

fn scan_gdscript_line(raw: &str, trimmed: &str, line: usize, out: &mut Vec<RawReference>) {
    // Only the script-level `extends` names the parent; inner classes are
    // indented. Godot 4 allows `class_name Foo extends Bar` on one line.
    if let Some(caps) = GD_EXTENDS.captures(raw) {
        let target = caps.get(1).or(caps.get(2)).or(caps.get(3));
        if let Some(t) = target {
            out.push(RawReference::new(t.as_str(), ReferenceKind::Extends, line));
        }
    }
    for caps in GD_PRELOAD.captures_iter(trimmed) {
        if let Some(t) = caps.get(1) {
            out.push(RawReference::new(t.as_str(), ReferenceKind::Preload, line));
        }
    }
    for caps in GD_LOAD.captures_iter(trimmed) {
        if let Some(t) = caps.get(1) {
            out.push(RawReference::new(t.as_str(), ReferenceKind::Load, line));
        }
    }
}

fn scan_csharp_line(trimmed: &str, line: usize, out: &mut Vec<RawReference>) {
    if let Some(t) = CS_USING.captures(trimmed).and_then(|c| c.get(1)) {
        out.push(RawReference::new(t.as_str(), ReferenceKind::Using, line));
    }
    if let Some(t) = CS_BASE.captures(trimmed).and_then(|c| c.get(1)) {
        out.push(RawReference::new(t.as_str(), ReferenceKind::Extends, line));
    }
}
