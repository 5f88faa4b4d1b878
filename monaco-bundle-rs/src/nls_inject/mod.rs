//! Localization injection for monaco-editor's ESM sources.
//!
//! monaco-editor modules load their strings through `import * as nls from '../nls.js'`.
//! This pass replaces that module with a small runtime shim and rewrites each import
//! into a `createLocalize('<namespace>')` call, so translations can be supplied at
//! runtime through `globalThis.MonacoLocales` without rebuilding.
//!
//! - `shim`: picks the runtime shim for the target monaco-editor version
//! - `rewrite`: the per-module text rewrite and namespace computation

mod rewrite;
mod shim;

pub use rewrite::{namespace_key, rewrite_nls_import, FACTORY_NAME};
pub use shim::{default_shim_dir, select_shim, ShimVariant, DEFAULT_SHIM_DIR, THRESHOLD_VERSION};

use crate::bundler::BuildPlugin;
use crate::error::{BundleError, NlsError};
use log::debug;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Module file name the shim is served for.
const NLS_FILE_NAME: &str = "nls.js";

/// Construction options for [`NlsInjectPlugin`].
#[derive(Debug, Clone)]
pub struct NlsInjectOptions {
    /// Root directory namespaces are computed against (`<package>/esm/vs`).
    pub entry: PathBuf,
    /// monaco-editor version being bundled.
    pub version: String,
}

/// The import rewrite pass.
///
/// The shim is selected and read once in the constructor; afterwards the
/// plugin is immutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct NlsInjectPlugin {
    entry: PathBuf,
    variant: ShimVariant,
    shim_source: String,
}

impl NlsInjectPlugin {
    pub fn new(options: NlsInjectOptions) -> Result<Self, NlsError> {
        Self::with_shim_dir(options, &default_shim_dir())
    }

    /// Like [`NlsInjectPlugin::new`], reading the shim payloads from `shim_dir`.
    pub fn with_shim_dir(options: NlsInjectOptions, shim_dir: &Path) -> Result<Self, NlsError> {
        let variant = select_shim(&options.version)?;
        let shim_source = variant.read_from(shim_dir)?;
        debug!(
            "Selected localization shim {variant} for monaco-editor {}",
            options.version
        );
        Ok(Self {
            entry: options.entry,
            variant,
            shim_source,
        })
    }

    pub fn variant(&self) -> ShimVariant {
        self.variant
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Returns the shim source when `module_id` names the nls module.
    pub fn load_shim(&self, module_id: &str) -> Option<&str> {
        let is_nls = module_id
            .strip_suffix(NLS_FILE_NAME)
            .is_some_and(|rest| rest.ends_with('/') || rest.ends_with('\\'));
        is_nls.then_some(self.shim_source.as_str())
    }

    pub fn rewrite<'a>(&self, code: &'a str, module_id: &str) -> Cow<'a, str> {
        rewrite_nls_import(code, module_id, &self.entry)
    }
}

impl BuildPlugin for NlsInjectPlugin {
    fn name(&self) -> &'static str {
        "monaco-nls-inject"
    }

    fn load(&self, module_id: &str) -> Result<Option<String>, BundleError> {
        Ok(self.load_shim(module_id).map(str::to_string))
    }

    fn transform(&self, code: &str, module_id: &str) -> Result<Option<String>, BundleError> {
        Ok(match self.rewrite(code, module_id) {
            Cow::Borrowed(_) => None,
            Cow::Owned(code) => Some(code),
        })
    }
}
