//! Module loader for the build pass.
//!
//! Serves each module from the first plugin `load` hook that claims it, or from
//! disk, and then runs every plugin's `transform` hook over the source.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::text::strip_bom;
use super::BuildPlugin;
use crate::error::BundleError;

/// A module after the load and transform hooks have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub id: String,
    pub code: String,
    /// Name of the plugin that supplied the content, if not read from disk.
    pub loaded_by: Option<&'static str>,
    /// Names of the plugins whose transform changed the source.
    pub transformed_by: Vec<&'static str>,
}

impl LoadedModule {
    pub fn is_transformed(&self) -> bool {
        !self.transformed_by.is_empty()
    }
}

/// Identifier a module is presented to plugins under: its path as a string.
pub fn module_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub struct ModuleLoader {
    plugins: Vec<Arc<dyn BuildPlugin>>,
}

impl ModuleLoader {
    pub fn new(plugins: Vec<Arc<dyn BuildPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn load(&self, path: &Path) -> Result<LoadedModule, BundleError> {
        let id = module_id(path);

        let mut loaded_by = None;
        let mut code = None;
        for plugin in &self.plugins {
            if let Some(content) = plugin.load(&id)? {
                debug!("{} supplied {id}", plugin.name());
                loaded_by = Some(plugin.name());
                code = Some(content);
                break;
            }
        }
        let mut code = match code {
            Some(code) => code,
            None => read_source(path)?,
        };

        let mut transformed_by = Vec::new();
        for plugin in &self.plugins {
            if let Some(next) = plugin.transform(&code, &id)? {
                debug!("{} transformed {id}", plugin.name());
                transformed_by.push(plugin.name());
                code = next;
            }
        }

        Ok(LoadedModule {
            id,
            code,
            loaded_by,
            transformed_by,
        })
    }
}

fn read_source(path: &Path) -> Result<String, BundleError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(strip_bom(&text).to_string()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(BundleError::ModuleNotFound(module_id(path)))
        }
        Err(err) => Err(BundleError::io(path, err)),
    }
}
