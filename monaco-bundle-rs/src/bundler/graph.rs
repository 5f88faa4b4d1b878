//! Module graph construction.
//!
//! Starting from an entry module, follows relative import specifiers through
//! the [`ModuleLoader`] until every reachable module has been loaded.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::loader::{LoadedModule, ModuleLoader};
use super::text::import_specifiers;
use crate::error::BundleError;
use crate::path_utils::normalize_path;

const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];

/// The modules and assets reachable from one entry.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub root: PathBuf,
    pub modules: BTreeMap<PathBuf, LoadedModule>,
    /// Non-script files referenced by imports (stylesheets, fonts, JSON).
    pub assets: BTreeSet<PathBuf>,
    /// Bare specifiers, left for the downstream bundler to resolve.
    pub externals: BTreeSet<String>,
    /// Relative specifiers that did not resolve to a file.
    pub missing: BTreeSet<PathBuf>,
}

impl ModuleGraph {
    pub fn transformed_count(&self) -> usize {
        self.modules.values().filter(|m| m.is_transformed()).count()
    }
}

enum Resolved {
    Module(PathBuf),
    Asset(PathBuf),
    External,
}

fn resolve(specifier: &str, importer: &Path) -> Resolved {
    if !(specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/'))
    {
        return Resolved::External;
    }
    let base = importer.parent().unwrap_or(Path::new(""));
    let path = normalize_path(&base.join(specifier));
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if SCRIPT_EXTENSIONS.contains(&ext) => Resolved::Module(path),
        Some(_) => Resolved::Asset(path),
        None => Resolved::Module(path.with_extension("js")),
    }
}

/// Loads `entry` and every module it reaches through relative imports.
///
/// A missing entry is an error. Missing dependencies are recorded in
/// [`ModuleGraph::missing`] unless a plugin supplies them.
pub fn build_graph(entry: &Path, loader: &ModuleLoader) -> Result<ModuleGraph, BundleError> {
    let root = normalize_path(entry);
    let mut graph = ModuleGraph {
        root: root.clone(),
        ..Default::default()
    };

    let mut queue = VecDeque::from([root]);
    let mut seen: BTreeSet<PathBuf> = queue.iter().cloned().collect();

    while let Some(path) = queue.pop_front() {
        let module = match loader.load(&path) {
            Ok(module) => module,
            Err(BundleError::ModuleNotFound(id)) if path != graph.root => {
                warn!("Unresolved import {id}");
                graph.missing.insert(path);
                continue;
            }
            Err(err) => return Err(err),
        };

        for specifier in import_specifiers(&module.code) {
            match resolve(specifier, &path) {
                Resolved::Module(dep) => {
                    if seen.insert(dep.clone()) {
                        queue.push_back(dep);
                    }
                }
                Resolved::Asset(asset) => {
                    if asset.is_file() {
                        graph.assets.insert(asset);
                    } else {
                        warn!("Missing asset {}", asset.display());
                        graph.missing.insert(asset);
                    }
                }
                Resolved::External => {
                    graph.externals.insert(specifier.to_string());
                }
            }
        }
        graph.modules.insert(path, module);
    }

    debug!(
        "Module graph of {}: {} modules, {} assets, {} externals",
        graph.root.display(),
        graph.modules.len(),
        graph.assets.len(),
        graph.externals.len()
    );
    Ok(graph)
}
