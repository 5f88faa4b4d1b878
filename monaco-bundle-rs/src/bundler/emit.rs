//! Writes the prepared module trees and the bundling manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use super::entries::{entry_stem, EntryOutput, MonacoBundler, SourceKind, StylesOptions};
use super::graph::{build_graph, ModuleGraph};
use super::loader::ModuleLoader;
use crate::error::BundleError;
use crate::nls_inject::ShimVariant;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Everything a downstream bundler needs to emit the prepared entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub shim: ShimVariant,
    pub minify: bool,
    pub target: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub kind: SourceKind,
    pub priority: u32,
    /// Entry module inside the prepared tree.
    pub input: PathBuf,
    pub output: EntryOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<StylesOptions>,
    pub plugins: Vec<&'static str>,
    pub modules: usize,
    pub externals: BTreeSet<String>,
}

/// Summary of a completed build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareReport {
    pub manifest_path: PathBuf,
    pub modules: usize,
    pub rewritten: usize,
    pub assets: usize,
    pub externals: usize,
    pub missing: usize,
}

/// Runs the build pass over every entry of `bundler`.
///
/// The output directory is cleared first. Each entry's graph is written under
/// `<output_dir>/<entry stem>/`, mirroring its layout inside the source directory.
pub fn prepare(bundler: &MonacoBundler) -> Result<PrepareReport, BundleError> {
    let nls = Arc::new(bundler.nls_plugin()?);
    info!(
        "Using localization shim {} for monaco-editor {}",
        nls.variant(),
        bundler.version()
    );

    let output_dir = bundler.output_dir();
    if output_dir.is_dir() {
        fs::remove_dir_all(output_dir).map_err(|err| BundleError::io(output_dir, err))?;
    }
    fs::create_dir_all(output_dir).map_err(|err| BundleError::io(output_dir, err))?;

    let mut report = PrepareReport::default();
    let mut entries = Vec::with_capacity(bundler.entries().len());
    for entry in bundler.entries() {
        let loader = ModuleLoader::new(bundler.entry_plugins(entry, &nls));
        let graph = build_graph(&entry.path, &loader)?;

        let tree_dir = output_dir.join(entry_stem(entry));
        write_graph(&graph, bundler.src_dir(), &tree_dir)?;
        info!(
            "Prepared {} ({} modules, {} rewritten)",
            entry.path.display(),
            graph.modules.len(),
            graph.transformed_count()
        );

        report.modules += graph.modules.len();
        report.rewritten += graph.transformed_count();
        report.assets += graph.assets.len();
        report.externals += graph.externals.len();
        report.missing += graph.missing.len();

        entries.push(ManifestEntry {
            kind: entry.kind,
            priority: entry.priority,
            input: tree_dir.join(relative_to_src(&graph.root, bundler.src_dir())?),
            output: bundler.entry_output(entry),
            styles: bundler.entry_styles(entry),
            plugins: loader.plugin_names(),
            modules: graph.modules.len(),
            externals: graph.externals,
        });
    }

    let manifest = Manifest {
        version: bundler.version().to_string(),
        shim: nls.variant(),
        minify: bundler.options().minify,
        target: bundler.options().target.clone(),
        entries,
    };
    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json).map_err(|err| BundleError::io(&manifest_path, err))?;
    report.manifest_path = manifest_path;

    if report.missing > 0 {
        warn!("{} imports could not be resolved", report.missing);
    }
    Ok(report)
}

fn relative_to_src(path: &Path, src_dir: &Path) -> Result<PathBuf, BundleError> {
    path.strip_prefix(src_dir)
        .map(Path::to_path_buf)
        .map_err(|_| {
            BundleError::SourceDir(format!(
                "{} is outside of {}",
                path.display(),
                src_dir.display()
            ))
        })
}

fn write_graph(graph: &ModuleGraph, src_dir: &Path, tree_dir: &Path) -> Result<(), BundleError> {
    for (path, module) in &graph.modules {
        let target = tree_dir.join(relative_to_src(path, src_dir)?);
        ensure_parent(&target)?;
        fs::write(&target, &module.code).map_err(|err| BundleError::io(&target, err))?;
    }
    for asset in &graph.assets {
        let target = tree_dir.join(relative_to_src(asset, src_dir)?);
        ensure_parent(&target)?;
        fs::copy(asset, &target).map_err(|err| BundleError::io(asset, err))?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), BundleError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|err| BundleError::io(parent, err)),
        None => Ok(()),
    }
}
