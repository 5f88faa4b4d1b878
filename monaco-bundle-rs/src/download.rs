//! Downloads and unpacks a published monaco-editor release.

use std::env;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use sha1::{Digest, Sha1};

use crate::error::DownloadError;
use crate::npm::{NpmRegistry, PackageInfo};

pub const MONACO_PACKAGE: &str = "monaco-editor";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Version or dist-tag to fetch. `latest` when unset.
    pub version: Option<String>,
    /// Absolute download root. `<cwd>/tmp` when unset or relative.
    pub dir: Option<PathBuf>,
    /// Replace an existing `<dir>/<version>` directory.
    pub overwrite: bool,
}

/// Snapshot of an in-flight tarball download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub received: u64,
    pub total: Option<u64>,
    /// 0..=100; stays at 0 when the server sends no length.
    pub percent: f64,
    /// Bytes per second since the download started.
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub package: PackageInfo,
    /// Directory the package was extracted into.
    pub version_dir: PathBuf,
    pub bytes: u64,
}

/// Resolves the download root from the user's choice.
pub fn download_root(dir: Option<&Path>) -> Result<PathBuf, DownloadError> {
    match dir {
        Some(dir) if dir.is_absolute() => Ok(dir.to_path_buf()),
        _ => {
            let cwd = env::current_dir().map_err(|err| DownloadError::io(".", err))?;
            Ok(cwd.join("tmp"))
        }
    }
}

/// Returns whether `dir` already exists, rejecting symlinks and files.
fn check_download_dir(dir: &Path) -> Result<bool, DownloadError> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.file_type().is_symlink() => {
            Err(DownloadError::DirIsSymlink(dir.to_path_buf()))
        }
        Ok(meta) if !meta.is_dir() => Err(DownloadError::DirNotDirectory(dir.to_path_buf())),
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

fn check_version_dir(version_dir: &Path, version: &str, overwrite: bool) -> Result<(), DownloadError> {
    let Ok(meta) = fs::symlink_metadata(version_dir) else {
        return Ok(());
    };
    if meta.file_type().is_symlink() {
        return Err(DownloadError::VersionIsSymlink(version.to_string()));
    }
    if !meta.is_dir() {
        return Err(DownloadError::VersionNotDirectory(version.to_string()));
    }
    if !overwrite {
        return Err(DownloadError::VersionExists(version.to_string()));
    }
    info!("Removing existing {}", version_dir.display());
    fs::remove_dir_all(version_dir).map_err(|err| DownloadError::io(version_dir, err))
}

/// Fetches `monaco-editor` from `registry` and extracts it into `<dir>/<version>`.
///
/// `on_progress` is called after every received chunk.
pub async fn download_monaco(
    registry: &NpmRegistry,
    options: &DownloadOptions,
    mut on_progress: impl FnMut(&DownloadProgress),
) -> Result<DownloadReport, DownloadError> {
    let download_dir = download_root(options.dir.as_deref())?;
    let dir_exists = check_download_dir(&download_dir)?;

    let package = registry
        .fetch_package(MONACO_PACKAGE, options.version.as_deref())
        .await?;

    let version_dir = download_dir.join(&package.version);
    check_version_dir(&version_dir, &package.version, options.overwrite)?;

    let mut response = registry
        .client()
        .get(&package.dist.tarball)
        .send()
        .await?
        .error_for_status()?;
    let total = response.content_length();

    let started = Instant::now();
    let mut hasher = Sha1::new();
    let mut buf: Vec<u8> = Vec::with_capacity(total.unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await? {
        hasher.update(&chunk);
        buf.extend_from_slice(&chunk);

        let received = buf.len() as u64;
        let percent = match total {
            Some(total) if total > 0 => (received as f64 / total as f64 * 100.0).min(100.0),
            _ => 0.0,
        };
        let elapsed = started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            received as f64 / elapsed
        } else {
            0.0
        };
        on_progress(&DownloadProgress {
            received,
            total,
            percent,
            speed,
        });
    }

    if buf.is_empty() {
        return Err(DownloadError::EmptyDownload);
    }

    let actual = format!("{:x}", hasher.finalize());
    if !actual.eq_ignore_ascii_case(package.dist.shasum.trim()) {
        return Err(DownloadError::Checksum {
            tarball: package.dist.tarball.clone(),
            expected: package.dist.shasum.clone(),
            actual,
        });
    }

    if !dir_exists {
        fs::create_dir_all(&download_dir).map_err(|err| DownloadError::io(&download_dir, err))?;
    }
    let tgz_path = download_dir.join(format!("{}.tgz", package.version));
    fs::write(&tgz_path, &buf).map_err(|err| DownloadError::io(&tgz_path, err))?;

    info!("Unzipping {}", tgz_path.display());
    fs::create_dir_all(&version_dir).map_err(|err| DownloadError::io(&version_dir, err))?;
    extract_tarball(&tgz_path, &version_dir)?;

    info!("Deleting {}", tgz_path.display());
    fs::remove_file(&tgz_path).map_err(|err| DownloadError::io(&tgz_path, err))?;

    Ok(DownloadReport {
        package,
        version_dir,
        bytes: buf.len() as u64,
    })
}

/// Extracts a gzipped tarball into `dest`, dropping the leading `package/` component.
pub fn extract_tarball(tgz_path: &Path, dest: &Path) -> Result<usize, DownloadError> {
    let file = File::open(tgz_path).map_err(|err| DownloadError::io(tgz_path, err))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|err| DownloadError::io(tgz_path, err))?;

    let mut count = 0;
    for entry in entries {
        let mut entry = entry.map_err(|err| DownloadError::io(tgz_path, err))?;
        let path = entry
            .path()
            .map_err(|err| DownloadError::io(tgz_path, err))?
            .into_owned();
        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }
        if !stripped
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            warn!("Skipping unsafe archive path {}", path.display());
            continue;
        }

        let target = dest.join(&stripped);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| DownloadError::io(parent, err))?;
        }
        entry
            .unpack(&target)
            .map_err(|err| DownloadError::io(&target, err))?;
        debug!("Extracted {}", stripped.display());
        count += 1;
    }
    Ok(count)
}
