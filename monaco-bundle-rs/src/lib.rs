#![doc = include_str!("../README.md")]

pub mod bundler;
pub mod download;
pub mod error;
pub mod nls_inject;
pub mod npm;
pub mod progress;

mod path_utils;

#[macro_use]
extern crate lazy_static;

pub use bundler::{prepare, BundlerOptions, MonacoBundler, PrepareReport};
pub use download::{download_monaco, DownloadOptions, DownloadProgress};
pub use nls_inject::{select_shim, NlsInjectOptions, NlsInjectPlugin, ShimVariant};
pub use npm::NpmRegistry;
