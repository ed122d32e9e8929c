use std::path::Path;

use serde::Serialize;
use tree_sitter::Language;

/// Language families recognized during discovery.
///
/// Families with a tree-sitter grammar get syntax-tree analysis; the rest
/// fall back to the line-oriented token scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Python,
    Rust,
    TypeScript,
    /// TypeScript or JavaScript with JSX. Reported as `typescript`.
    #[serde(rename = "typescript")]
    Tsx,
    GdScript,
    CSharp,
}

/// Extension allow-list. Lookup is case-insensitive.
const EXTENSIONS: &[(&str, Lang)] = &[
    ("py", Lang::Python),
    ("pyw", Lang::Python),
    ("rs", Lang::Rust),
    ("ts", Lang::TypeScript),
    ("js", Lang::TypeScript),
    ("mjs", Lang::TypeScript),
    ("cjs", Lang::TypeScript),
    ("tsx", Lang::Tsx),
    ("jsx", Lang::Tsx),
    ("gd", Lang::GdScript),
    ("cs", Lang::CSharp),
];

impl Lang {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_ext)
    }

    /// Stable tag used in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::TypeScript | Self::Tsx => "typescript",
            Self::GdScript => "gdscript",
            Self::CSharp => "csharp",
        }
    }

    /// Tree-sitter grammar, or `None` for token-scan languages.
    #[must_use]
    pub fn grammar(self) -> Option<Language> {
        match self {
            Self::Python => Some(tree_sitter_python::language()),
            Self::Rust => Some(tree_sitter_rust::language()),
            Self::TypeScript => Some(tree_sitter_typescript::language_typescript()),
            Self::Tsx => Some(tree_sitter_typescript::language_tsx()),
            Self::GdScript | Self::CSharp => None,
        }
    }

    #[must_use]
    pub fn has_grammar(self) -> bool {
        !matches!(self, Self::GdScript | Self::CSharp)
    }

    /// Import query for tree languages. Captures named `import` carry the
    /// reference text; `mod` and `from` captures are whole statements.
    #[must_use]
    pub fn q_imports(self) -> Option<&'static str> {
        match self {
            Self::Rust => Some(RUST_IMPORTS),
            Self::Python => Some(PYTHON_IMPORTS),
            Self::TypeScript | Self::Tsx => Some(TS_IMPORTS),
            Self::GdScript | Self::CSharp => None,
        }
    }
}

const RUST_IMPORTS: &str = r"
    (use_declaration argument: (_) @import)
    (mod_item) @mod
";

const PYTHON_IMPORTS: &str = r"
    (import_statement name: (dotted_name) @import)
    (import_statement name: (aliased_import name: (dotted_name) @import))
    (import_from_statement) @from
";

const TS_IMPORTS: &str = r#"
    (import_statement source: (string) @import)
    (export_statement source: (string) @import)
    (call_expression
      function: (identifier) @func
      arguments: (arguments (string) @import)
      (#eq? @func "require"))
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ext() {
        assert_eq!(Lang::from_ext("rs"), Some(Lang::Rust));
        assert_eq!(Lang::from_ext("PY"), Some(Lang::Python));
        assert_eq!(Lang::from_ext("jsx"), Some(Lang::Tsx));
        assert_eq!(Lang::from_ext("gd"), Some(Lang::GdScript));
        assert_eq!(Lang::from_ext("md"), None);
    }

    #[test]
    fn test_jsx_dialects_report_as_typescript() {
        assert_eq!(Lang::Tsx.name(), "typescript");
        assert_eq!(Lang::TypeScript.name(), "typescript");
        assert_eq!(Lang::from_ext("jsx").map(Lang::name), Some("typescript"));
    }

    #[test]
    fn test_token_scan_languages_have_no_grammar() {
        assert!(Lang::GdScript.grammar().is_none());
        assert!(Lang::CSharp.grammar().is_none());
        assert!(Lang::Python.grammar().is_some());
        assert!(!Lang::CSharp.has_grammar());
    }

    #[test]
    fn test_import_queries_compile() {
        for lang in [Lang::Rust, Lang::Python, Lang::TypeScript, Lang::Tsx] {
            let (Some(grammar), Some(q)) = (lang.grammar(), lang.q_imports()) else {
                panic!("{lang:?} should have a grammar and import query");
            };
            assert!(tree_sitter::Query::new(grammar, q).is_ok(), "{lang:?}");
        }
    }
}
