// src/graph/resolver.rs
//! Resolves raw reference strings to unit ids.
//!
//! Resolution is purely lexical over the set of discovered units; the
//! filesystem is never consulted here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::lang::Lang;
use crate::types::{RawReference, ReferenceKind};

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// Looks local but matches no unit. Carries a short explanation.
    Unresolved(String),
    /// Standard library, third-party package, engine built-in or asset.
    External,
}

/// Lookup tables built over every discovered unit.
#[derive(Debug, Default)]
pub struct UnitIndex {
    ids: BTreeSet<String>,
    unreadable: BTreeMap<String, String>,
    names: BTreeMap<String, String>,
    godot_root: String,
}

impl UnitIndex {
    /// `godot_root` is the forward-slash directory `res://` maps to, empty
    /// for the scan root itself.
    #[must_use]
    pub fn new(godot_root: &str) -> Self {
        Self {
            godot_root: godot_root.trim_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Registers a unit. When two units declare the same type name, the one
    /// inserted first keeps it.
    pub fn insert(&mut self, id: &str, class_name: Option<&str>) {
        self.ids.insert(id.to_string());
        if let Some(name) = class_name {
            self.names.entry(name.to_string()).or_insert_with(|| id.to_string());
        }
    }

    /// Registers a discovered file whose contents could not be read.
    pub fn insert_unreadable(&mut self, id: &str, error: &str) {
        self.unreadable.insert(id.to_string(), error.to_string());
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// First candidate that names a unit wins.
    fn probe<I>(&self, candidates: I) -> Option<Resolution>
    where
        I: IntoIterator<Item = String>,
    {
        for candidate in candidates {
            if self.ids.contains(&candidate) {
                return Some(Resolution::Resolved(candidate));
            }
            if let Some(err) = self.unreadable.get(&candidate) {
                return Some(Resolution::Unresolved(format!("{candidate} could not be read: {err}")));
            }
        }
        None
    }

    /// True when some unit lives at `base/seg.*` or under `base/seg/`.
    fn has_module_root(&self, base: &str, seg: &str) -> bool {
        let dir = join(base, seg);
        let prefix = format!("{dir}/");
        let as_file = format!("{dir}.");
        self.ids
            .range(dir.clone()..)
            .take_while(|id| id.starts_with(&dir))
            .any(|id| id.starts_with(&prefix) || id.starts_with(&as_file))
    }
}

/// Resolves `reference`, found in unit `source`, against the index.
#[must_use]
pub fn resolve(index: &UnitIndex, source: &str, lang: Lang, reference: &RawReference) -> Resolution {
    let target = reference.target.trim();
    if target.is_empty() {
        return Resolution::External;
    }
    match lang {
        Lang::Rust => resolve_rust(index, source, reference.kind, target),
        Lang::Python if reference.kind == ReferenceKind::FromImport => {
            resolve_python_from(index, source, target)
        }
        Lang::Python => resolve_python(index, source, target),
        Lang::TypeScript | Lang::Tsx => resolve_ts(index, source, target),
        Lang::GdScript => resolve_gdscript(index, source, reference.kind, target),
        Lang::CSharp => resolve_csharp(index, reference.kind, target),
    }
}

/// Collapses `.` and `..` segments. `None` when the path climbs above the root.
#[must_use]
pub fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

fn parent_dir(id: &str) -> &str {
    id.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn join(dir: &str, rest: &str) -> String {
    match (dir.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => dir.to_string(),
        _ => format!("{dir}/{rest}"),
    }
}

fn escapes_root(target: &str) -> Resolution {
    Resolution::Unresolved(format!("`{target}` points above the scan root"))
}

fn not_found(target: &str) -> Resolution {
    Resolution::Unresolved(format!("no unit matches `{target}`"))
}

// --- Rust ---

/// Directory holding the child modules of the module defined by `id`.
fn rust_module_dir(id: &str) -> String {
    let dir = parent_dir(id);
    let file = id.rsplit('/').next().unwrap_or(id);
    match file {
        "lib.rs" | "main.rs" | "mod.rs" => dir.to_string(),
        _ => join(dir, file.trim_end_matches(".rs")),
    }
}

/// Nearest enclosing `src` directory, else the unit's own directory.
fn rust_crate_root(id: &str) -> String {
    let dir = parent_dir(id);
    let segs: Vec<&str> = dir.split('/').collect();
    match segs.iter().rposition(|s| *s == "src") {
        Some(pos) => segs[..=pos].join("/"),
        None => dir.to_string(),
    }
}

fn rust_candidates(base: &str, segs: &[&str]) -> Vec<String> {
    if segs.is_empty() {
        return ["lib.rs", "main.rs", "mod.rs"]
            .iter()
            .map(|f| join(base, f))
            .chain(std::iter::once(format!("{base}.rs")))
            .collect();
    }
    let mut out = Vec::new();
    for k in (1..=segs.len()).rev() {
        let stem = join(base, &segs[..k].join("/"));
        out.push(format!("{stem}.rs"));
        out.push(format!("{stem}/mod.rs"));
    }
    out
}

fn resolve_rust(index: &UnitIndex, source: &str, kind: ReferenceKind, target: &str) -> Resolution {
    if kind == ReferenceKind::Include {
        let dir = rust_module_dir(source);
        return index
            .probe(rust_candidates(&dir, &[target]).into_iter().take(2))
            .unwrap_or_else(|| Resolution::Unresolved(format!("no file for `mod {target}`")));
    }

    let segs: Vec<&str> = target.split("::").filter(|s| !s.is_empty()).collect();
    let Some((&first, rest)) = segs.split_first() else {
        return Resolution::External;
    };

    let base = match first {
        "crate" => rust_crate_root(source),
        "self" => rust_module_dir(source),
        "super" => {
            let mut dir = rust_module_dir(source);
            let mut rest = rest;
            loop {
                if dir.is_empty() {
                    return escapes_root(target);
                }
                dir = parent_dir(&dir).to_string();
                match rest.split_first() {
                    Some((&"super", tail)) => rest = tail,
                    _ => break,
                }
            }
            return index
                .probe(rust_candidates(&dir, rest))
                .unwrap_or_else(|| not_found(target));
        }
        // Uniform paths: a sibling module named like a crate shadows it.
        _ => {
            let dir = rust_module_dir(source);
            return index
                .probe(rust_candidates(&dir, &segs).into_iter().rev().take(2))
                .unwrap_or(Resolution::External);
        }
    };

    index
        .probe(rust_candidates(&base, rest))
        .unwrap_or_else(|| not_found(target))
}

// --- Python ---

fn python_candidates(stem: &str) -> [String; 2] {
    [format!("{stem}.py"), join(stem, "__init__.py")]
}

fn resolve_python(index: &UnitIndex, source: &str, target: &str) -> Resolution {
    let dots = target.chars().take_while(|c| *c == '.').count();
    let rest = target[dots..].replace('.', "/");

    if dots > 0 {
        let mut dir = parent_dir(source).to_string();
        for _ in 1..dots {
            if dir.is_empty() {
                return escapes_root(target);
            }
            dir = parent_dir(&dir).to_string();
        }
        let candidates: Vec<String> = if rest.is_empty() {
            vec![join(&dir, "__init__.py")]
        } else {
            python_candidates(&join(&dir, &rest)).to_vec()
        };
        return index.probe(candidates).unwrap_or_else(|| not_found(target));
    }

    // Absolute imports: the scan root first, then each enclosing package
    // directory of the importing file (covers `src/` layouts).
    let mut bases = vec![String::new()];
    let mut dir = parent_dir(source);
    let mut ancestors = Vec::new();
    while !dir.is_empty() {
        ancestors.push(dir.to_string());
        dir = parent_dir(dir);
    }
    bases.extend(ancestors.into_iter().rev());

    let candidates = bases.iter().flat_map(|b| python_candidates(&join(b, &rest)));
    if let Some(found) = index.probe(candidates) {
        return found;
    }

    let first = rest.split('/').next().unwrap_or(&rest);
    if bases.iter().any(|b| index.has_module_root(b, first)) {
        not_found(target)
    } else {
        Resolution::External
    }
}

/// `from M import n`: `M.n` when it names a submodule, else `M` itself.
fn resolve_python_from(index: &UnitIndex, source: &str, target: &str) -> Resolution {
    let submodule = resolve_python(index, source, target);
    if matches!(submodule, Resolution::Resolved(_)) {
        return submodule;
    }
    resolve_python(index, source, python_parent_module(target))
}

/// `.b` -> `.`, `..x` -> `..`, `pkg.sub.x` -> `pkg.sub`.
fn python_parent_module(target: &str) -> &str {
    match target.rfind('.') {
        Some(pos) if target[..pos].chars().all(|c| c == '.') => &target[..=pos],
        Some(pos) => &target[..pos],
        None => target,
    }
}

// --- TypeScript / JavaScript ---

const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

fn ts_candidates(path: &str) -> Vec<String> {
    let mut out = vec![path.to_string()];
    out.extend(TS_EXTENSIONS.iter().map(|ext| format!("{path}.{ext}")));
    // ESM sources import `./a.js` while the file on disk is `a.ts`.
    if let Some(stem) = [".js", ".jsx", ".mjs", ".cjs"].iter().find_map(|e| path.strip_suffix(*e)) {
        out.push(format!("{stem}.ts"));
        out.push(format!("{stem}.tsx"));
    }
    out.extend(TS_EXTENSIONS.iter().map(|ext| join(path, &format!("index.{ext}"))));
    out
}

fn resolve_ts(index: &UnitIndex, source: &str, target: &str) -> Resolution {
    let joined = if target.starts_with('.') {
        join(parent_dir(source), target)
    } else if let Some(abs) = target.strip_prefix('/') {
        abs.to_string()
    } else {
        return Resolution::External;
    };
    let Some(path) = normalize_path(&joined) else {
        return escapes_root(target);
    };
    index.probe(ts_candidates(&path)).unwrap_or_else(|| not_found(target))
}

// --- GDScript ---

fn is_identifier(s: &str) -> bool {
    s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn resolve_gdscript(index: &UnitIndex, source: &str, kind: ReferenceKind, target: &str) -> Resolution {
    if kind == ReferenceKind::Extends && is_identifier(target) {
        return index
            .by_name(target)
            .map_or(Resolution::External, |id| Resolution::Resolved(id.to_string()));
    }

    let joined = if let Some(rest) = target.strip_prefix("res://") {
        join(&index.godot_root, rest)
    } else if target.contains("://") {
        return Resolution::External;
    } else {
        join(parent_dir(source), target)
    };
    let Some(path) = normalize_path(&joined) else {
        return escapes_root(target);
    };

    // Scenes, textures and other assets are not graph nodes.
    if Lang::from_path(Path::new(&path)).is_none() {
        return Resolution::External;
    }
    index.probe([path]).unwrap_or_else(|| not_found(target))
}

// --- C# ---

fn resolve_csharp(index: &UnitIndex, kind: ReferenceKind, target: &str) -> Resolution {
    if kind != ReferenceKind::Extends {
        return Resolution::External;
    }
    let bare = target.rsplit('.').next().unwrap_or(target);
    index
        .by_name(bare)
        .map_or(Resolution::External, |id| Resolution::Resolved(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(ids: &[&str]) -> UnitIndex {
        let mut idx = UnitIndex::new("");
        for id in ids {
            idx.insert(id, None);
        }
        idx
    }

    fn r(target: &str, kind: ReferenceKind) -> RawReference {
        RawReference::new(target, kind, 1)
    }

    fn resolved(id: &str) -> Resolution {
        Resolution::Resolved(id.to_string())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/./b/../c").as_deref(), Some("a/c"));
        assert_eq!(normalize_path("../x"), None);
        assert_eq!(normalize_path("a//b/").as_deref(), Some("a/b"));
    }

    #[test]
    fn test_rust_crate_paths() {
        let idx = index(&["src/main.rs", "src/graph/mod.rs", "src/graph/cycles.rs", "src/types.rs"]);
        let res = |t: &str| resolve(&idx, "src/main.rs", Lang::Rust, &r(t, ReferenceKind::Import));
        assert_eq!(res("crate::graph::cycles::find"), resolved("src/graph/cycles.rs"));
        assert_eq!(res("crate::types::Bucket"), resolved("src/types.rs"));
        assert_eq!(res("crate::graph"), resolved("src/graph/mod.rs"));
        assert!(matches!(res("crate::missing::Thing"), Resolution::Unresolved(_)));
        assert_eq!(res("std::collections::HashMap"), Resolution::External);
        assert_eq!(res("serde::Serialize"), Resolution::External);
    }

    #[test]
    fn test_rust_mod_and_super() {
        let idx = index(&["src/lib.rs", "src/a.rs", "src/a/b.rs", "src/a/c.rs", "src/d.rs"]);
        let include = |src: &str, t: &str| resolve(&idx, src, Lang::Rust, &r(t, ReferenceKind::Include));
        assert_eq!(include("src/lib.rs", "a"), resolved("src/a.rs"));
        assert_eq!(include("src/a.rs", "b"), resolved("src/a/b.rs"));
        assert!(matches!(include("src/lib.rs", "gone"), Resolution::Unresolved(_)));

        let import = |src: &str, t: &str| resolve(&idx, src, Lang::Rust, &r(t, ReferenceKind::Import));
        assert_eq!(import("src/a/b.rs", "super::c::run"), resolved("src/a/c.rs"));
        assert_eq!(import("src/a/b.rs", "super::super::d"), resolved("src/d.rs"));
        assert_eq!(import("src/a/b.rs", "super"), resolved("src/a.rs"));
        assert_eq!(import("src/a.rs", "self::b::X"), resolved("src/a/b.rs"));
    }

    #[test]
    fn test_python_absolute_and_relative() {
        let idx = index(&["app/__init__.py", "app/models.py", "app/api/views.py", "src/pkg/core.py", "src/pkg/util.py"]);
        let res = |src: &str, t: &str| resolve(&idx, src, Lang::Python, &r(t, ReferenceKind::Import));
        assert_eq!(res("app/api/views.py", "app.models"), resolved("app/models.py"));
        assert_eq!(res("app/api/views.py", "..models"), resolved("app/models.py"));
        assert_eq!(res("app/models.py", "."), resolved("app/__init__.py"));
        assert_eq!(res("src/pkg/core.py", "pkg.util"), resolved("src/pkg/util.py"));
        assert_eq!(res("app/models.py", "os.path"), Resolution::External);
        assert!(matches!(res("app/models.py", "app.missing"), Resolution::Unresolved(_)));
        assert!(matches!(res("app/models.py", "....far"), Resolution::Unresolved(_)));
    }

    #[test]
    fn test_python_from_import_prefers_submodule() {
        let idx = index(&["pkg/__init__.py", "pkg/a.py", "pkg/b.py", "pkg/models.py"]);
        let res = |t: &str| resolve(&idx, "pkg/a.py", Lang::Python, &r(t, ReferenceKind::FromImport));
        assert_eq!(res(".b"), resolved("pkg/b.py"));
        assert_eq!(res(".helper"), resolved("pkg/__init__.py"));
        assert_eq!(res(".models.User"), resolved("pkg/models.py"));
        assert_eq!(res("pkg.b"), resolved("pkg/b.py"));
        assert_eq!(res("os.path"), Resolution::External);
        assert!(matches!(res(".gone.thing"), Resolution::Unresolved(_)));
    }

    #[test]
    fn test_python_parent_module() {
        assert_eq!(python_parent_module(".b"), ".");
        assert_eq!(python_parent_module("..x"), "..");
        assert_eq!(python_parent_module(".sub.x"), ".sub");
        assert_eq!(python_parent_module("pkg.sub.x"), "pkg.sub");
    }

    #[test]
    fn test_typescript_probing() {
        let idx = index(&["web/app.ts", "web/util/index.ts", "web/lib/math.ts", "web/view.tsx"]);
        let res = |t: &str| resolve(&idx, "web/app.ts", Lang::TypeScript, &r(t, ReferenceKind::Import));
        assert_eq!(res("./util"), resolved("web/util/index.ts"));
        assert_eq!(res("./lib/math"), resolved("web/lib/math.ts"));
        assert_eq!(res("./lib/math.js"), resolved("web/lib/math.ts"));
        assert_eq!(res("./view"), resolved("web/view.tsx"));
        assert_eq!(res("react"), Resolution::External);
        assert!(matches!(res("./nope"), Resolution::Unresolved(_)));
        assert!(matches!(res("../../outside"), Resolution::Unresolved(_)));
    }

    #[test]
    fn test_gdscript_res_paths_and_names() {
        let mut idx = UnitIndex::new("game");
        idx.insert("game/actors/base.gd", Some("BaseActor"));
        idx.insert("game/actors/player.gd", None);
        let res = |t: &str, k: ReferenceKind| resolve(&idx, "game/actors/player.gd", Lang::GdScript, &r(t, k));
        assert_eq!(res("res://actors/base.gd", ReferenceKind::Extends), resolved("game/actors/base.gd"));
        assert_eq!(res("base.gd", ReferenceKind::Preload), resolved("game/actors/base.gd"));
        assert_eq!(res("BaseActor", ReferenceKind::Extends), resolved("game/actors/base.gd"));
        assert_eq!(res("CharacterBody2D", ReferenceKind::Extends), Resolution::External);
        assert_eq!(res("res://ui/hud.tscn", ReferenceKind::Preload), Resolution::External);
        assert!(matches!(res("res://actors/ghost.gd", ReferenceKind::Load), Resolution::Unresolved(_)));
    }

    #[test]
    fn test_csharp_base_class_by_name() {
        let mut idx = UnitIndex::new("");
        idx.insert("Scripts/Entity.cs", Some("Entity"));
        let res = |t: &str, k: ReferenceKind| resolve(&idx, "Scripts/Player.cs", Lang::CSharp, &r(t, k));
        assert_eq!(res("Entity", ReferenceKind::Extends), resolved("Scripts/Entity.cs"));
        assert_eq!(res("Godot.Node", ReferenceKind::Extends), Resolution::External);
        assert_eq!(res("System.Linq", ReferenceKind::Using), Resolution::External);
    }

    #[test]
    fn test_unreadable_target_is_unresolved_with_note() {
        let mut idx = index(&["web/app.ts"]);
        idx.insert_unreadable("web/broken.ts", "permission denied");
        let res = resolve(&idx, "web/app.ts", Lang::TypeScript, &r("./broken", ReferenceKind::Import));
        let Resolution::Unresolved(note) = res else {
            panic!("expected unresolved, got {res:?}");
        };
        assert!(note.contains("permission denied"));
    }
}
