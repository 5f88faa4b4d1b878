//! Selection of the localization runtime shim served in place of `vs/nls.js`.

use crate::error::NlsError;
use semver::Version;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// monaco-editor version at which the localization runtime changed shape.
pub const THRESHOLD_VERSION: &str = "0.50.0";

/// Directory holding the shim payloads shipped with this crate.
pub const DEFAULT_SHIM_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/nls");

/// One of the two localization runtimes this crate ships.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShimVariant {
    /// Runtime for monaco-editor up to and including 0.50.0.
    Legacy,
    /// Runtime for monaco-editor releases after 0.50.0.
    Current,
}

impl ShimVariant {
    pub fn file_name(self) -> &'static str {
        match self {
            ShimVariant::Legacy => "nls-0.50.0.js",
            ShimVariant::Current => "nls.js",
        }
    }

    /// Reads this variant's payload from `shim_dir`.
    pub fn read_from(self, shim_dir: &Path) -> Result<String, NlsError> {
        let path = shim_dir.join(self.file_name());
        fs::read_to_string(&path).map_err(|source| NlsError::ShimRead { path, source })
    }
}

impl fmt::Display for ShimVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Picks the shim for a target monaco-editor version.
///
/// Versions strictly greater than [`THRESHOLD_VERSION`] get
/// [`ShimVariant::Current`]; 0.50.0 itself and everything older get
/// [`ShimVariant::Legacy`]. A version that is not valid semver is an error.
pub fn select_shim(version: &str) -> Result<ShimVariant, NlsError> {
    let target = Version::parse(version.trim()).map_err(|source| NlsError::InvalidVersion {
        version: version.to_string(),
        source,
    })?;
    let threshold = Version::new(0, 50, 0);
    Ok(if target > threshold {
        ShimVariant::Current
    } else {
        ShimVariant::Legacy
    })
}

pub fn default_shim_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SHIM_DIR)
}
