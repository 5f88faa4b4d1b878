use std::path::PathBuf;

/// Failures raised while selecting and loading the localization runtime shim.
#[derive(Debug, thiserror::Error)]
pub enum NlsError {
    #[error("Invalid monaco-editor version `{version}`: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Failed to read localization shim {}: {source}", path.display())]
    ShimRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Source directory error: {0}")]
    SourceDir(String),

    #[error("Invalid package data in {}: {reason}", path.display())]
    InvalidPackage { path: PathBuf, reason: String },

    #[error("Failed to discover entries: {0}")]
    Discovery(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Plugin `{plugin}` failed on {module_id}: {message}")]
    Plugin {
        plugin: &'static str,
        module_id: String,
        message: String,
    },

    #[error(transparent)]
    Nls(#[from] NlsError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NpmError {
    #[error("Invalid package name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Registry error for {name}@{version}: {message}")]
    Registry {
        name: String,
        version: String,
        message: String,
    },

    #[error("Invalid package info returned for {name}@{version}: {reason}")]
    InvalidPackageInfo {
        name: String,
        version: String,
        reason: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Download dir cannot be symbolic link: {}", .0.display())]
    DirIsSymlink(PathBuf),

    #[error("Download dir should be directory: {}", .0.display())]
    DirNotDirectory(PathBuf),

    #[error("Version \"{0}\" exists")]
    VersionExists(String),

    #[error("Version \"{0}\" exists but it's symbolic link")]
    VersionIsSymlink(String),

    #[error("Version \"{0}\" exists but it's not a directory")]
    VersionNotDirectory(String),

    #[error("The download buffer is empty, please try again")]
    EmptyDownload,

    #[error("Checksum mismatch for {tarball}: expected {expected}, got {actual}")]
    Checksum {
        tarball: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Npm(#[from] NpmError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Io {
            path: path.into(),
            source,
        }
    }
}
