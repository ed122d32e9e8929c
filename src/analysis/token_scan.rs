// src/analysis/token_scan.rs
//! Degraded analysis for languages without a syntax tree (GDScript, C#).
//!
//! Functions are located by signature regexes and scored by scanning keyword
//! occurrences in a bounded window of following lines. Nesting comes from
//! indentation (GDScript) or brace depth (C#). The numbers follow the same
//! increment rules as the tree walker but are approximate: string contents
//! and comments are stripped, everything else is taken at face value.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::graph::imports;
use crate::lang::Lang;
use crate::types::{
    AnalysisMode, Declaration, DeclarationKind, MetricRecord, ReferenceKind, SourceUnit,
};

use super::walker::Scores;
use super::{Analyzer, AnalyzerSettings, UnitAnalysis};

static STRING_LIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).unwrap_or_else(|_| panic!("Invalid Regex"))
});
static LOGICAL_OPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&&|\|\||\?\?|\band\b|\bor\b").unwrap_or_else(|_| panic!("Invalid Regex"))
});

static GD_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:static\s+)?func\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class_name\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_INNER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^const\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| panic!("Invalid Regex"))
});
/// `@export var x`, `@export_range(0, 9) var x`, Godot 3 `export(int) var x`.
static GD_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:@export\w*(?:\([^)]*\))?\s+|export(?:\([^)]*\))?\s+)(?:@?onready\s+)?var\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap_or_else(|_| panic!("Invalid Regex"))
});
/// An export annotation alone on its line; the `var` follows on the next.
static GD_EXPORT_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@export\w*(?:\([^)]*\))?$").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@?onready\s+)?var\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| panic!("Invalid Regex"))
});
static GD_SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^signal\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Optional attributes, modifiers (group 1), return type (group 2), name
/// (group 3), parameter list (group 4). The return type allows one level of
/// nested generics, so `Dictionary<string, List<int>>` matches.
static CS_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\[[^\]]*\]\s*)*((?:(?:public|private|protected|internal|static|virtual|override|abstract|async|sealed|extern|unsafe|partial|readonly)\s+)*)(?:([A-Za-z_][A-Za-z0-9_.]*(?:<[^<>()]*(?:<[^<>()]*>[^<>()]*)*>)?(?:\[[,\s]*\])*\??)\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(?:<[^<>()]*>)?\s*\(([^)]*)",
    )
    .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static CS_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:class|struct|interface|record)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});
static CS_CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconst\s+[A-Za-z_][A-Za-z0-9_<>.]*\s+([A-Za-z_][A-Za-z0-9_]*)")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Statement keywords that a signature match can pick up as a return type
/// or a name.
const CS_KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "catch", "using", "lock",
    "return", "new", "await", "throw", "yield", "var", "typeof", "nameof", "sizeof", "default",
    "is", "as", "in", "out", "ref", "goto", "fixed", "checked", "unchecked", "base", "this", "when",
];

pub struct TokenScanAnalyzer {
    lang: Lang,
}

impl TokenScanAnalyzer {
    #[must_use]
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }
}

impl Analyzer for TokenScanAnalyzer {
    fn analyze(&self, path: &Path, text: String, settings: &AnalyzerSettings) -> UnitAnalysis {
        let references = imports::from_lines(self.lang, &text);
        let scan = {
            let lines: Vec<&str> = text.lines().collect();
            match self.lang {
                Lang::CSharp => scan_csharp(&lines, settings.token_scan_window),
                _ => scan_gdscript(&lines, settings.token_scan_window),
            }
        };

        let mut unit = SourceUnit::new(path, self.lang, text);
        let metrics = scan
            .functions
            .iter()
            .map(|f| MetricRecord {
                file: unit.id.clone(),
                name: f.name.clone(),
                kind: f.kind,
                line: f.line,
                cyclomatic: f.scores.cyclomatic,
                cognitive: f.scores.cognitive,
                lines: f.end_line.saturating_sub(f.line) + 1,
                parameters: f.params.len(),
                mode: AnalysisMode::TokenScan,
            })
            .collect();

        unit.declarations = scan.declarations();
        unit.class_name = scan.class_name;
        unit.extends = references
            .iter()
            .find(|r| r.kind == ReferenceKind::Extends)
            .map(|r| r.target.clone());

        UnitAnalysis { unit, metrics, references, diagnostics: Vec::new() }
    }
}

#[derive(Debug)]
struct ScannedFunction {
    name: String,
    kind: DeclarationKind,
    line: usize,
    end_line: usize,
    params: Vec<String>,
    scores: Scores,
    /// Index into `ScanResult::classes` when declared inside a class.
    owner: Option<usize>,
}

#[derive(Debug, Default)]
struct ScanResult {
    class_name: Option<String>,
    classes: Vec<Declaration>,
    functions: Vec<ScannedFunction>,
    top_level: Vec<Declaration>,
}

impl ScanResult {
    fn declarations(&self) -> Vec<Declaration> {
        let mut classes = self.classes.clone();
        let mut out = self.top_level.clone();
        for f in &self.functions {
            let mut decl = Declaration::new(f.kind, f.name.clone(), f.line);
            decl.end_line = f.end_line;
            decl.params = Some(f.params.clone());
            match f.owner.and_then(|i| classes.get_mut(i)) {
                Some(class) => class.children.push(decl),
                None => out.push(decl),
            }
        }
        out.extend(classes);
        out.sort_by_key(|d| d.line);
        out
    }
}

/// Blanks string literal contents and trailing comments.
fn strip_code(line: &str, comment: &str) -> String {
    let no_strings = STRING_LIT.replace_all(line, "\"\"");
    match no_strings.find(comment) {
        Some(pos) => no_strings[..pos].to_string(),
        None => no_strings.into_owned(),
    }
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn split_params(raw: &str, name_of: fn(&str) -> String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(name_of)
        .collect()
}

fn gd_param_name(p: &str) -> String {
    p.split([':', '='])
        .next()
        .unwrap_or(p)
        .trim()
        .to_string()
}

fn cs_param_name(p: &str) -> String {
    let before_default = p.split('=').next().unwrap_or(p).trim();
    before_default
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or(before_default)
        .to_string()
}

// --- GDScript ---

#[derive(Debug, Clone, Copy)]
struct Frame {
    indent: usize,
    is_match: bool,
}

fn scan_gdscript(lines: &[&str], window: usize) -> ScanResult {
    let mut result = ScanResult::default();
    let mut current_class: Option<(usize, usize)> = None; // (class index, class indent)
    let mut pending_export = false;

    for (idx, raw) in lines.iter().enumerate() {
        let trimmed = raw.trim();
        let line = idx + 1;
        let indent = indent_of(raw);

        if trimmed.is_empty() {
            continue;
        }
        if current_class.is_some_and(|(_, ci)| indent <= ci) {
            current_class = None;
        }
        let annotated = std::mem::replace(&mut pending_export, false);
        if is_export_annotation(trimmed) {
            pending_export = true;
            continue;
        }

        if let Some(c) = GD_CLASS_NAME.captures(raw).and_then(|c| c.get(1)) {
            result.class_name = Some(c.as_str().to_string());
            result.top_level.push(Declaration::new(DeclarationKind::Class, c.as_str(), line));
        } else if let Some(c) = GD_INNER_CLASS.captures(trimmed).and_then(|c| c.get(1)) {
            result.classes.push(Declaration::new(DeclarationKind::Class, c.as_str(), line));
            current_class = Some((result.classes.len() - 1, indent));
        } else if let Some(c) = GD_CONST.captures(trimmed).and_then(|c| c.get(1)) {
            if indent == 0 {
                result.top_level.push(Declaration::new(DeclarationKind::Const, c.as_str(), line));
            }
        } else if let Some(c) = GD_SIGNAL.captures(trimmed).and_then(|c| c.get(1)) {
            result.top_level.push(Declaration::new(DeclarationKind::Signal, c.as_str(), line));
        } else if let Some(name) = gd_export_name(trimmed, annotated) {
            result.top_level.push(Declaration::new(DeclarationKind::Export, name, line));
        } else if let Some(caps) = GD_FUNC.captures(raw) {
            let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
            let params = split_params(caps.get(3).map_or("", |m| m.as_str()), gd_param_name);
            let (scores, end_line) = score_gdscript_body(lines, idx, indent, window);
            let owner = current_class.map(|(ci, _)| ci);
            let kind = if owner.is_some() { DeclarationKind::Method } else { DeclarationKind::Function };
            if let Some(class) = owner.and_then(|ci| result.classes.get_mut(ci)) {
                class.end_line = class.end_line.max(end_line);
            }
            result.functions.push(ScannedFunction { name, kind, line, end_line, params, scores, owner });
        }
    }
    result
}

/// Group and category annotations structure the inspector; they export nothing.
fn is_export_annotation(trimmed: &str) -> bool {
    GD_EXPORT_ANNOTATION.is_match(trimmed)
        && !["@export_group", "@export_subgroup", "@export_category"]
            .iter()
            .any(|p| trimmed.starts_with(p))
}

fn gd_export_name(trimmed: &str, annotated: bool) -> Option<&str> {
    if let Some(m) = GD_EXPORT.captures(trimmed).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    if annotated {
        return GD_VAR.captures(trimmed).and_then(|c| c.get(1)).map(|m| m.as_str());
    }
    None
}

/// Scores the indented block following a `func` line.
fn score_gdscript_body(lines: &[&str], sig_idx: usize, sig_indent: usize, window: usize) -> (Scores, usize) {
    let mut scores = Scores::default();
    let mut frames: Vec<Frame> = Vec::new();
    let mut end_line = sig_idx + 1;

    for (offset, raw) in lines.iter().enumerate().skip(sig_idx + 1).take(window) {
        let code = strip_code(raw, "#");
        let trimmed = code.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indent_of(raw);
        if indent <= sig_indent {
            break;
        }
        end_line = offset + 1;

        while frames.last().is_some_and(|f| f.indent >= indent) {
            frames.pop();
        }
        let nesting = frames.len();
        let in_match = frames.last().is_some_and(|f| f.is_match);
        let first = trimmed.split(|c: char| !c.is_alphanumeric() && c != '_').next().unwrap_or("");

        scores.cognitive += LOGICAL_OPS.find_iter(trimmed).count();

        let opens_block = trimmed.ends_with(':');
        let mut is_match = false;
        match first {
            "if" | "elif" | "for" | "while" => {
                scores.cyclomatic += 1;
                scores.cognitive += 1 + nesting;
            }
            "match" => is_match = true,
            _ if in_match && opens_block => {
                scores.cyclomatic += 1;
                scores.cognitive += 1 + nesting;
            }
            _ => {}
        }
        if opens_block {
            frames.push(Frame { indent, is_match });
        }
    }
    (scores, end_line)
}

// --- C# ---

fn scan_csharp(lines: &[&str], window: usize) -> ScanResult {
    let mut result = ScanResult::default();
    let mut class_stack: Vec<(usize, i64)> = Vec::new(); // (class index, brace depth at declaration)
    let mut depth: i64 = 0;

    for (idx, raw) in lines.iter().enumerate() {
        let code = strip_code(raw, "//");
        let line = idx + 1;

        let enclosing = class_stack
            .last()
            .and_then(|(ci, _)| result.classes.get(*ci))
            .map(|c| c.name.clone());
        if let Some((name, raw_params)) = csharp_signature(&code, enclosing.as_deref()) {
            let params = split_params(raw_params, cs_param_name);
            let (scores, end_line) = score_csharp_body(lines, idx, window);
            let owner = class_stack.last().map(|(ci, _)| *ci);
            let kind = if owner.is_some() { DeclarationKind::Method } else { DeclarationKind::Function };
            result.functions.push(ScannedFunction {
                name: name.to_string(),
                kind,
                line,
                end_line,
                params,
                scores,
                owner,
            });
        } else if let Some(c) = CS_CLASS.captures(&code).and_then(|c| c.get(1)) {
            result.classes.push(Declaration::new(DeclarationKind::Class, c.as_str(), line));
            if result.class_name.is_none() {
                result.class_name = Some(c.as_str().to_string());
            }
            class_stack.push((result.classes.len() - 1, depth));
        } else if let Some(c) = CS_CONST.captures(&code).and_then(|c| c.get(1)) {
            result.top_level.push(Declaration::new(DeclarationKind::Const, c.as_str(), line));
        }

        depth += brace_delta(&code);
        for (ci, _) in &class_stack {
            if let Some(class) = result.classes.get_mut(*ci) {
                class.end_line = line;
            }
        }
        while class_stack.last().is_some_and(|(_, d)| depth <= *d && code.contains('}')) {
            class_stack.pop();
        }
    }
    result
}

/// Name and raw parameter list of a method or constructor declared on this
/// line. A declaration needs a return type or a modifier, except for a
/// constructor named like the enclosing class.
fn csharp_signature<'a>(code: &'a str, enclosing: Option<&str>) -> Option<(&'a str, &'a str)> {
    if CS_CLASS.is_match(code) {
        return None;
    }
    let caps = CS_METHOD.captures(code)?;
    let name = caps.get(3)?.as_str();
    let return_type = caps.get(2).map(|m| m.as_str());
    if CS_KEYWORDS.contains(&name) || return_type.is_some_and(|t| CS_KEYWORDS.contains(&t)) {
        return None;
    }
    let has_modifiers = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
    let is_constructor = enclosing == Some(name);
    if return_type.is_none() && !has_modifiers && !is_constructor {
        return None;
    }
    Some((name, caps.get(4).map_or("", |m| m.as_str())))
}

fn brace_delta(code: &str) -> i64 {
    let open = code.matches('{').count();
    let close = code.matches('}').count();
    i64::try_from(open).unwrap_or(0) - i64::try_from(close).unwrap_or(0)
}

/// Scores the brace-delimited body that starts at or after the signature.
fn score_csharp_body(lines: &[&str], sig_idx: usize, window: usize) -> (Scores, usize) {
    let mut scores = Scores::default();
    let mut depth: i64 = 0;
    let mut opened = false;
    let mut end_line = sig_idx + 1;

    for (offset, raw) in lines.iter().enumerate().skip(sig_idx).take(window + 1) {
        let code = strip_code(raw, "//");
        end_line = offset + 1;

        let body = if offset == sig_idx {
            // Signature line: only its braces and expression body count.
            if code.trim_end().ends_with(';') && !code.contains("=>") {
                return (scores, end_line);
            }
            match code.find("=>") {
                Some(pos) if !opened && !code.contains('{') => {
                    scores.cognitive += LOGICAL_OPS.find_iter(&code[pos..]).count();
                    return (scores, end_line);
                }
                _ => String::new(),
            }
        } else {
            code.clone()
        };

        let trimmed = body.trim_start();
        let leading_close = trimmed.chars().take_while(|c| *c == '}' || c.is_whitespace()).filter(|c| *c == '}').count();
        let after_close = trimmed.trim_start_matches(|c: char| c == '}' || c.is_whitespace());
        let current = depth - i64::try_from(leading_close).unwrap_or(0);
        let nesting = usize::try_from((current - 1).max(0)).unwrap_or(0);

        if opened || offset != sig_idx {
            score_csharp_statement(after_close, nesting, &mut scores);
        }

        depth += brace_delta(&code);
        if code.contains('{') {
            opened = true;
        }
        if opened && depth <= 0 {
            break;
        }
    }
    (scores, end_line)
}

fn score_csharp_statement(stmt: &str, nesting: usize, scores: &mut Scores) {
    scores.cognitive += LOGICAL_OPS
        .find_iter(stmt)
        .filter(|m| matches!(m.as_str(), "&&" | "||" | "??"))
        .count();

    let stmt = stmt.strip_prefix("else").map_or(stmt, str::trim_start);
    let first = stmt.split(|c: char| !c.is_alphanumeric() && c != '_').next().unwrap_or("");
    match first {
        "if" | "for" | "foreach" | "while" | "case" => {
            scores.cyclomatic += 1;
            scores.cognitive += 1 + nesting;
        }
        "catch" => {
            scores.cyclomatic += 1;
            scores.cognitive += 1;
        }
        "finally" => scores.cyclomatic += 1,
        "try" => scores.cognitive += 1 + nesting,
        "using" if stmt.contains('(') => scores.cognitive += 1 + nesting,
        _ => {}
    }
}
