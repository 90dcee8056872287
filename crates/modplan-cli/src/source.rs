//! Descriptor discovery and parsing.
//!
//! One descriptor per file. A file is a descriptor iff its name ends in
//! `.module.toml`, `.module.json`, `.module.yaml` or `.module.yml`.
//! Directories named `target` or starting with `.` are not entered.
//! Files are returned in sorted path order so registration order, and
//! therefore every tie-break downstream, does not depend on the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use modplan_core::ModuleDescriptor;
use tracing::{debug, instrument, trace};

/// File formats a descriptor can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
    Yaml,
}

impl DescriptorFormat {
    /// Detect the format from a descriptor file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".module.toml") {
            Some(Self::Toml)
        } else if name.ends_with(".module.json") {
            Some(Self::Json)
        } else if name.ends_with(".module.yaml") || name.ends_with(".module.yml") {
            Some(Self::Yaml)
        } else {
            None
        }
    }
}

/// A parsed descriptor and the file it came from.
#[derive(Debug, Clone)]
pub struct SourcedDescriptor {
    pub path: PathBuf,
    pub descriptor: ModuleDescriptor,
}

/// Find every descriptor file under `root`, sorted by path.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or a directory cannot be
/// read.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("Failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                if !is_skipped_dir(&path) {
                    pending.push(path);
                }
            } else if DescriptorFormat::from_path(&path).is_some() {
                trace!(path = %path.display(), "descriptor file");
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == "target" || name.starts_with('.'))
}

/// Parse one descriptor file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unknown extension,
/// or does not deserialize into a [`ModuleDescriptor`].
pub fn load_descriptor(path: &Path) -> Result<ModuleDescriptor> {
    let Some(format) = DescriptorFormat::from_path(path) else {
        bail!("{} is not a module descriptor file", path.display());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_descriptor(&content, format).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse descriptor text in the given format.
///
/// # Errors
///
/// Returns the underlying deserializer error.
pub fn parse_descriptor(content: &str, format: DescriptorFormat) -> Result<ModuleDescriptor> {
    let descriptor: ModuleDescriptor = match format {
        DescriptorFormat::Toml => toml::from_str(content)?,
        DescriptorFormat::Json => serde_json::from_str(content)?,
        DescriptorFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(descriptor)
}

/// Discover and parse every descriptor under `root`.
///
/// # Errors
///
/// Returns the first discovery or parse failure.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn load_all(root: &Path) -> Result<Vec<SourcedDescriptor>> {
    let paths = discover(root)?;
    let loaded = paths
        .into_iter()
        .map(|path| {
            let descriptor = load_descriptor(&path)?;
            Ok(SourcedDescriptor { path, descriptor })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(descriptors = loaded.len(), "descriptors loaded");
    Ok(loaded)
}
