//! Entry discovery and output naming for a monaco-editor package.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSetBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::BuildPlugin;
use crate::error::BundleError;
use crate::nls_inject::{NlsInjectOptions, NlsInjectPlugin};
use crate::path_utils::normalize_path;

const LANGUAGE_WORKER_GLOB: &str = "language/**/*.worker.js";

/// Options for preparing a monaco-editor package.
///
/// Deserializable so a JSON config file can supply any subset of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundlerOptions {
    /// Root of the extracted `monaco-editor` package.
    pub src_dir: PathBuf,
    /// Where prepared trees and the manifest are written. Defaults to `./dist`.
    pub output_dir: Option<PathBuf>,
    /// Directory holding the localization shims. Defaults to the shims shipped with this crate.
    pub shim_dir: Option<PathBuf>,
    /// Whether the downstream bundler should minify.
    pub minify: bool,
    /// ECMAScript target for the downstream bundler.
    pub target: String,
}

impl Default for BundlerOptions {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::new(),
            output_dir: None,
            shim_dir: None,
            minify: true,
            target: "es2022".to_string(),
        }
    }
}

/// The subset of `package.json` the bundler needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageJson {
    /// Reads `package.json` and returns its non-empty `version`.
    pub fn read_version(path: &Path) -> Result<String, BundleError> {
        let invalid = |reason: String| BundleError::InvalidPackage {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|err| BundleError::io(path, err))?;
        let pkg: PackageJson = serde_json::from_str(&text).map_err(|err| invalid(err.to_string()))?;
        match pkg.version {
            Some(version) if !version.trim().is_empty() => Ok(version),
            _ => Err(invalid("missing \"version\" property".to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Main,
    EditorWorker,
    LanguageWorker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub priority: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Umd,
}

/// How the downstream bundler should emit one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOutput {
    pub file: PathBuf,
    pub format: OutputFormat,
    /// Global name of the UMD bundle.
    pub name: String,
    pub inline_dynamic_imports: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_file_names: Option<String>,
}

/// Style injection settings for the main entry's CSS imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesOptions {
    pub mode: String,
    pub container: String,
    pub single_tag: bool,
    pub prepend: bool,
    pub id: String,
}

impl Default for StylesOptions {
    fn default() -> Self {
        Self {
            mode: "inject".to_string(),
            container: "head".to_string(),
            single_tag: true,
            prepend: false,
            id: "monacoEditorStyles".to_string(),
        }
    }
}

/// A validated monaco-editor package and its entry points.
#[derive(Debug, Clone)]
pub struct MonacoBundler {
    options: BundlerOptions,
    src_dir: PathBuf,
    entry_dir: PathBuf,
    output_dir: PathBuf,
    version: String,
    entries: Vec<SourceEntry>,
}

impl MonacoBundler {
    pub fn new(options: BundlerOptions) -> Result<Self, BundleError> {
        let cwd = env::current_dir().map_err(|err| BundleError::io(".", err))?;
        let src_dir = normalize_path(&cwd.join(&options.src_dir));
        let output_dir =
            normalize_path(&cwd.join(options.output_dir.as_deref().unwrap_or(Path::new("dist"))));

        match fs::symlink_metadata(&src_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(BundleError::SourceDir(format!(
                    "{} is not a directory",
                    src_dir.display()
                )))
            }
            Err(_) => {
                return Err(BundleError::SourceDir(format!(
                    "{} does not exist",
                    src_dir.display()
                )))
            }
        }

        // The output directory is cleared before every build pass.
        if src_dir.starts_with(&output_dir) {
            return Err(BundleError::SourceDir(format!(
                "{} is inside the output directory {}",
                src_dir.display(),
                output_dir.display()
            )));
        }

        let version = PackageJson::read_version(&src_dir.join("package.json"))?;
        let entry_dir = src_dir.join("esm").join("vs");

        let mut entries = vec![
            SourceEntry {
                path: entry_dir.join("editor").join("editor.main.js"),
                kind: SourceKind::Main,
                priority: 0,
            },
            SourceEntry {
                path: entry_dir.join("editor").join("editor.worker.js"),
                kind: SourceKind::EditorWorker,
                priority: 10,
            },
        ];
        entries.extend(
            discover_language_workers(&entry_dir)?
                .into_iter()
                .map(|path| SourceEntry {
                    path,
                    kind: SourceKind::LanguageWorker,
                    priority: 50,
                }),
        );
        info!(
            "Found monaco-editor {version} with {} entries in {}",
            entries.len(),
            src_dir.display()
        );

        Ok(Self {
            options,
            src_dir,
            entry_dir,
            output_dir,
            version,
            entries,
        })
    }

    pub fn options(&self) -> &BundlerOptions {
        &self.options
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// `<src_dir>/esm/vs`, the root localization namespaces are relative to.
    pub fn entry_dir(&self) -> &Path {
        &self.entry_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn entry_output(&self, entry: &SourceEntry) -> EntryOutput {
        let stem = entry_stem(entry);
        let file = self.output_dir.join(format!("{stem}.umd.js"));
        match entry.kind {
            SourceKind::Main => EntryOutput {
                file,
                format: OutputFormat::Umd,
                name: "monaco".to_string(),
                inline_dynamic_imports: true,
                asset_file_names: Some("[name][extname]".to_string()),
            },
            SourceKind::EditorWorker | SourceKind::LanguageWorker => EntryOutput {
                file,
                format: OutputFormat::Umd,
                name: format!("monaco-{}", stem.replace('.', "-")),
                inline_dynamic_imports: false,
                asset_file_names: None,
            },
        }
    }

    pub fn entry_styles(&self, entry: &SourceEntry) -> Option<StylesOptions> {
        (entry.kind == SourceKind::Main).then(StylesOptions::default)
    }

    /// Builds the localization pass for this package's version.
    pub fn nls_plugin(&self) -> Result<NlsInjectPlugin, BundleError> {
        let options = NlsInjectOptions {
            entry: self.entry_dir.clone(),
            version: self.version.clone(),
        };
        let plugin = match &self.options.shim_dir {
            Some(dir) => NlsInjectPlugin::with_shim_dir(options, dir)?,
            None => NlsInjectPlugin::new(options)?,
        };
        Ok(plugin)
    }

    /// Plugins run over `entry`'s module graph. Only the main entry is localized.
    pub fn entry_plugins(
        &self,
        entry: &SourceEntry,
        nls: &Arc<NlsInjectPlugin>,
    ) -> Vec<Arc<dyn BuildPlugin>> {
        match entry.kind {
            SourceKind::Main => vec![nls.clone() as Arc<dyn BuildPlugin>],
            SourceKind::EditorWorker | SourceKind::LanguageWorker => Vec::new(),
        }
    }
}

/// File name of an entry without its extension, e.g. `editor.main`.
pub(crate) fn entry_stem(entry: &SourceEntry) -> String {
    entry
        .path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn discover_language_workers(entry_dir: &Path) -> Result<Vec<PathBuf>, BundleError> {
    let glob = Glob::new(LANGUAGE_WORKER_GLOB)
        .map_err(|err| BundleError::Discovery(err.to_string()))?;
    let mut builder = GlobSetBuilder::new();
    builder.add(glob);
    let set = builder
        .build()
        .map_err(|err| BundleError::Discovery(err.to_string()))?;

    let language_dir = entry_dir.join("language");
    if !language_dir.is_dir() {
        debug!("No language directory at {}", language_dir.display());
        return Ok(Vec::new());
    }

    let mut workers = Vec::new();
    for dent in WalkDir::new(&language_dir).follow_links(false) {
        let dent = dent.map_err(|err| BundleError::Discovery(err.to_string()))?;
        if !dent.file_type().is_file() {
            continue;
        }
        let Ok(rel) = dent.path().strip_prefix(entry_dir) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if set.is_match(&rel) {
            workers.push(dent.path().to_path_buf());
        }
    }
    workers.sort();
    Ok(workers)
}
