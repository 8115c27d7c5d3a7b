//! Project information for the document's `info` section.
//!
//! Read from `package.json` (its `apidoc` key wins over the top-level
//! fields) and overridden by `swaggee.json`, or by `apidoc.json` when there
//! is none. Each file is looked up in the input directory first, then in the
//! working directory.

use crate::error::{Error, Result};
use crate::openapi_builder::Info;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_FILE: &str = "package.json";
/// Override files in order of preference; only the first one found is read.
pub const OVERRIDE_FILES: [&str; 2] = ["swaggee.json", "apidoc.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub name: String,
    /// Display title; the name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: None,
            version: default_version(),
            description: String::new(),
        }
    }
}

impl PackageInfo {
    /// Loads the project information for sources under `src_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageFile`] if a file exists but is not valid JSON.
    pub fn load(src_dir: &Path) -> Result<Self> {
        let package = read_package_data(src_dir, PACKAGE_FILE)?;

        let mut merged = match package.get("apidoc") {
            Some(Value::Object(apidoc)) => apidoc.clone(),
            _ => Map::new(),
        };
        for (key, fallback) in [("name", ""), ("version", "0.0.0"), ("description", "")] {
            if !merged.contains_key(key) {
                let value = package
                    .get(key)
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(fallback);
                merged.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        let mut overrides = Map::new();
        for filename in OVERRIDE_FILES {
            overrides = read_package_data(src_dir, filename)?;
            if !overrides.is_empty() {
                break;
            }
        }
        if overrides.is_empty() {
            warn!("Please create a {}", OVERRIDE_FILES.join(" or "));
        }
        merged.extend(overrides);

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// The `info` object of the generated document.
    pub fn to_info(&self) -> Info {
        let title = self
            .title
            .as_ref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.name)
            .clone();
        Info {
            title,
            version: self.version.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Reads `filename` from `src_dir`, or from the working directory. A missing
/// file reads as an empty object.
fn read_package_data(src_dir: &Path, filename: &str) -> Result<Map<String, Value>> {
    let candidates = [src_dir.join(filename), PathBuf::from(".").join(filename)];
    let path = match candidates.iter().find(|p| p.is_file()) {
        Some(path) => path,
        None => {
            debug!("{} not found!", filename);
            return Ok(Map::new());
        }
    };

    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|source| Error::PackageFile {
        path: path.clone(),
        source,
    })?;
    debug!("read: {}", path.display());

    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
