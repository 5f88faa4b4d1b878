//! Text utilities for module processing.
//!
//! Provides BOM stripping and a lightweight scan of import specifiers.

use regex::Regex;

lazy_static! {
    static ref STATIC_IMPORT_RE: Regex = Regex::new(
        r#"(?m)(?:^|[;}\s])(?:import|export)\s*(?:[\w$*{}\s,]+?\s*from\s*)?['"]([^'"\r\n]+)['"]"#
    )
    .unwrap();
    static ref DYNAMIC_IMPORT_RE: Regex =
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"\r\n]+)['"]\s*\)"#).unwrap();
}

/// Drops a leading U+FEFF so the first import line of a module still matches `^import`.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Collects the module specifiers referenced by static imports, re-exports and
/// dynamic `import('...')` calls, in order of first appearance.
///
/// This is a textual scan, not a parse: specifiers inside comments or strings
/// that look like imports are reported too.
pub fn import_specifiers(code: &str) -> Vec<&str> {
    let mut found: Vec<(usize, &str)> = STATIC_IMPORT_RE
        .captures_iter(code)
        .chain(DYNAMIC_IMPORT_RE.captures_iter(code))
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    found.sort_by_key(|(start, _)| *start);

    let mut specifiers: Vec<&str> = Vec::with_capacity(found.len());
    for (_, specifier) in found {
        if !specifiers.contains(&specifier) {
            specifiers.push(specifier);
        }
    }
    specifiers
}
