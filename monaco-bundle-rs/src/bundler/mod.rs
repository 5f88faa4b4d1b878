//! Build pass that prepares monaco-editor's ESM sources for browser bundling.
//!
//! The pass discovers the editor's entry points, walks each entry's module
//! graph through a chain of [`BuildPlugin`]s, and writes the loaded and
//! transformed modules to a per-entry tree together with a `manifest.json`
//! describing how a downstream bundler should emit each entry.
//!
//! # Architecture
//!
//! - `entries`: source directory validation, entry discovery, and output naming
//! - `loader`: loads modules through plugin `load` and `transform` hooks
//! - `graph`: follows import specifiers from an entry to build its module graph
//! - `emit`: writes the prepared trees and the manifest
//! - `text`: utility functions for source text processing

mod emit;
mod entries;
mod graph;
mod loader;
mod text;

pub use emit::{prepare, Manifest, ManifestEntry, PrepareReport, MANIFEST_FILE_NAME};
pub use entries::{
    BundlerOptions, EntryOutput, MonacoBundler, OutputFormat, PackageJson, SourceEntry,
    SourceKind, StylesOptions,
};
pub use graph::{build_graph, ModuleGraph};
pub use loader::{module_id, LoadedModule, ModuleLoader};
pub use text::{import_specifiers, strip_bom};

use crate::error::BundleError;

/// Hooks a build pass invokes for every module it loads.
///
/// Plugins run in order. The first plugin whose `load` returns content
/// supplies the module; otherwise the module is read from disk. Every
/// `transform` then sees the output of the previous one.
pub trait BuildPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Supplies the content of `module_id`, or `None` to defer.
    fn load(&self, _module_id: &str) -> Result<Option<String>, BundleError> {
        Ok(None)
    }

    /// Rewrites `code`, or returns `None` to leave it unchanged.
    fn transform(&self, _code: &str, _module_id: &str) -> Result<Option<String>, BundleError> {
        Ok(None)
    }
}
