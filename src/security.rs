// src/security.rs
//! Line-oriented security pattern scan.
//!
//! A static rule table matched line by line. Matches are hints, not proof:
//! each rule looks for string concatenation or a literal where a safer API
//! exists.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SqlInjection,
    Xss,
    CommandInjection,
    PathTraversal,
    HardcodedSecret,
    WeakCrypto,
    InsecureRandom,
    DebugLeak,
}

#[derive(Debug)]
pub struct Rule {
    pub category: Category,
    pub severity: Severity,
    pub message: &'static str,
    pattern: Regex,
}

/// One rule hit on one line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub snippet: String,
}

const SNIPPET_MAX: usize = 120;

const RULE_SPECS: &[(Category, Severity, &str, &str)] = &[
    (
        Category::SqlInjection,
        Severity::Critical,
        r#"(?i)\b(execute|query|raw|exec)\s*\(\s*["'][^"']*\b(select|insert|update|delete)\b[^"']*["']\s*\+"#,
        "SQL built by string concatenation",
    ),
    (
        Category::SqlInjection,
        Severity::High,
        r#"(?i)["']\s*(select\s.+\sfrom|insert\s+into|update\s.+\sset|delete\s+from)\b[^"']*%s[^"']*["']\s*%"#,
        "SQL built with string formatting",
    ),
    (
        Category::Xss,
        Severity::High,
        r"\b(innerHTML|outerHTML)\s*=[^=].*\+",
        "HTML assigned from concatenated input",
    ),
    (
        Category::Xss,
        Severity::Critical,
        r"\bdocument\.write\s*\(.*\+",
        "document.write with concatenated input",
    ),
    (
        Category::CommandInjection,
        Severity::Critical,
        r"\b(os\.system|subprocess\.(call|run|Popen)|shell_exec|child_process\.exec|OS\.execute)\s*\(.*\+",
        "shell command built by concatenation",
    ),
    (
        Category::PathTraversal,
        Severity::High,
        r#"\b(open|FileAccess\.open|File\.ReadAllText|readFileSync)\s*\(\s*["'][^"']*["']\s*\+"#,
        "file path built by concatenation",
    ),
    (
        Category::HardcodedSecret,
        Severity::High,
        r#"(?i)\b(password|passwd|pwd|secret|token)\s*[:=]\s*["'][^"']{4,}["']"#,
        "credential stored in source",
    ),
    (
        Category::HardcodedSecret,
        Severity::High,
        r#"(?i)\b(api_?key|access_?key|private_?key)\s*[:=]\s*["'][^"']{10,}["']"#,
        "API key stored in source",
    ),
    (
        Category::WeakCrypto,
        Severity::Medium,
        r"(?i)\b(md5|sha1)\s*\(",
        "weak hash algorithm",
    ),
    (
        Category::WeakCrypto,
        Severity::High,
        r"(?i)\b(des_|3des|rc4)",
        "weak cipher",
    ),
    (
        Category::InsecureRandom,
        Severity::Medium,
        r"\b(Math\.random|random\.random|random\.randint|randf|randi)\s*\(",
        "non-cryptographic random source",
    ),
    (
        Category::DebugLeak,
        Severity::Low,
        r"(?i)\b(console\.log|print|alert|Debug\.Log|GD\.Print)\s*\(.*\b(password|token|secret|api_?key)\b",
        "debug output may leak a secret",
    ),
];

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_SPECS
        .iter()
        .map(|(category, severity, pattern, message)| Rule {
            category: *category,
            severity: *severity,
            message: *message,
            pattern: Regex::new(pattern).unwrap_or_else(|_| panic!("Invalid Regex")),
        })
        .collect()
});

/// Rules matching `line`, in table order.
#[must_use]
pub fn scan_line(line: &str) -> Vec<&'static Rule> {
    RULES.iter().filter(|r| r.pattern.is_match(line)).collect()
}

/// Scans a whole file. Comment lines are skipped.
#[must_use]
pub fn scan_source(file: &str, text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if is_comment(trimmed) {
            continue;
        }
        for rule in scan_line(trimmed) {
            findings.push(Finding {
                file: file.to_string(),
                line: idx + 1,
                severity: rule.severity,
                category: rule.category,
                message: rule.message.to_string(),
                snippet: snippet(trimmed),
            });
        }
    }
    findings
}

fn is_comment(line: &str) -> bool {
    ["#", "//", "/*", "* ", "--"].iter().any(|p| line.starts_with(p))
}

fn snippet(line: &str) -> String {
    if line.chars().count() <= SNIPPET_MAX {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(SNIPPET_MAX).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(line: &str) -> Vec<Category> {
        scan_line(line).iter().map(|r| r.category).collect()
    }

    #[test]
    fn test_rules_compile() {
        assert_eq!(RULES.len(), RULE_SPECS.len());
    }

    #[test]
    fn test_detects_each_family() {
        assert_eq!(
            categories(r#"cursor.execute("SELECT * FROM users WHERE id = " + uid)"#),
            vec![Category::SqlInjection]
        );
        assert_eq!(categories("el.innerHTML = '<b>' + name;"), vec![Category::Xss]);
        assert_eq!(categories("os.system('rm ' + path)"), vec![Category::CommandInjection]);
        assert_eq!(categories(r#"password = "hunter22""#), vec![Category::HardcodedSecret]);
        assert_eq!(categories("digest = md5(data)"), vec![Category::WeakCrypto]);
        assert_eq!(categories("var roll = randi()"), vec![Category::InsecureRandom]);
        assert_eq!(categories("console.log('token', token)"), vec![Category::DebugLeak]);
    }

    #[test]
    fn test_clean_lines_do_not_match() {
        assert!(scan_line("let total = a + b;").is_empty());
        assert!(scan_line("cursor.execute(query, (uid,))").is_empty());
        assert!(scan_line("password = get_env('DB_PASSWORD')").is_empty());
    }

    #[test]
    fn test_scan_source_skips_comments_and_reports_lines() {
        let text = "# password = \"hunter22\"\nx = 1\napi_key = \"abcdef0123456789\"\n";
        let findings = scan_source("cfg.py", text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].file, "cfg.py");
    }
}
