//! Rewrites `import ... from '../nls.js'` into a namespaced `createLocalize` call.

use std::borrow::Cow;
use std::path::Path;

use regex::Regex;

use crate::path_utils::relative_path;

/// Cheap substring check performed before any regex scan.
const NLS_MARKER: &str = "../nls";

/// Name of the factory exported by the localization shim.
pub const FACTORY_NAME: &str = "createLocalize";

lazy_static! {
    static ref NLS_IMPORT_LINE_RE: Regex =
        Regex::new(r#"(?imR)^[ \t]*import\s+.*nls(?:\.js)?['"];?$"#).unwrap();
    static ref IMPORT_PARTS_RE: Regex =
        Regex::new(r#"(?i)import\s+(.*)\s+from\s+(?:'([^'"]+)'|"([^'"]+)");?"#).unwrap();
}

/// The binding and module path of a matched nls import line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NlsImport<'a> {
    binding: &'a str,
    path: &'a str,
}

impl<'a> NlsImport<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let caps = IMPORT_PARTS_RE.captures(line)?;
        let binding = caps.get(1)?.as_str().trim();
        let path = caps.get(2).or_else(|| caps.get(3))?.as_str();
        Some(Self { binding, path })
    }

    /// True for `import { createLocalize } from '...'`, which this pass emits itself.
    fn is_factory_import(&self) -> bool {
        let compact: String = self.binding.split_whitespace().collect();
        compact == format!("{{{FACTORY_NAME}}}")
    }

    /// Local name the factory result is bound to.
    fn local_binding(&self) -> &'a str {
        if self.binding.starts_with('*') {
            "nls"
        } else {
            self.binding
        }
    }

    fn rebuild(&self, namespace: &str) -> String {
        format!(
            "import {{ {FACTORY_NAME} }} from '{path}';\nconst {binding} = {FACTORY_NAME}('{namespace}');",
            path = self.path,
            binding = self.local_binding(),
        )
    }
}

/// Rewrites the first nls import of `code` for the module at `module_id`.
///
/// Text without a matching import line is returned borrowed and unchanged.
/// Only the first occurrence of the matched line is replaced; identical lines
/// further down the module are left as they are.
pub fn rewrite_nls_import<'a>(code: &'a str, module_id: &str, entry: &Path) -> Cow<'a, str> {
    if !code.contains(NLS_MARKER) {
        return Cow::Borrowed(code);
    }

    // A module that already imports the factory has been rewritten before.
    let lines: Vec<&str> = NLS_IMPORT_LINE_RE
        .find_iter(code)
        .map(|m| m.as_str())
        .collect();
    if lines
        .iter()
        .any(|line| NlsImport::parse(line).is_some_and(|import| import.is_factory_import()))
    {
        return Cow::Borrowed(code);
    }
    let Some(&line) = lines.first() else {
        return Cow::Borrowed(code);
    };

    let Some(import) = NlsImport::parse(line) else {
        return Cow::Borrowed(code);
    };

    let Some((head, tail)) = code.split_once(line) else {
        return Cow::Borrowed(code);
    };

    let namespace = namespace_key(entry, module_id);
    let mut out = String::with_capacity(code.len() + 64);
    out.push_str(head);
    out.push_str(&import.rebuild(&namespace));
    out.push_str(tail);
    Cow::Owned(out)
}

/// Localization namespace of a module: its path relative to `entry`, without
/// the `.js` extension, using `/` separators.
pub fn namespace_key(entry: &Path, module_id: &str) -> String {
    let relative = relative_path(entry, Path::new(module_id));
    let relative = relative.to_string_lossy();
    let relative = relative.strip_suffix(".js").unwrap_or(&relative);
    relative.replace('\\', "/")
}
