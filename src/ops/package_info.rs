//! Package metadata finalizer.
//!
//! Runs after install: collects the library artifacts, copies the license
//! and writes the metadata downstream consumers read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;
use crate::core::recipe::Recipe;
use crate::util::fs::{copy_into, glob_files, write_string};

/// Metadata file written at the package root.
pub const METADATA_FILE: &str = "ceres-recipe.json";

/// Directory licenses are copied into.
pub const LICENSE_DIR: &str = "licenses";

/// Extensions of library artifacts.
const LIB_EXTENSIONS: &[&str] = &["a", "lib", "so", "dylib"];

/// What a consumer needs to link against the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Name consumers use in `find_package`
    pub alias: String,
    /// Relative to the package root
    pub include_dirs: Vec<PathBuf>,
    /// Relative to the package root
    pub lib_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub system_libs: Vec<String>,
}

impl PackageInfo {
    pub fn metadata_path(package_dir: &Path) -> PathBuf {
        package_dir.join(METADATA_FILE)
    }

    /// Write the metadata as pretty JSON.
    pub fn write(&self, package_dir: &Path) -> Result<PathBuf> {
        let path = Self::metadata_path(package_dir);
        let json = serde_json::to_string_pretty(self).context("failed to serialize package info")?;
        write_string(&path, &json)?;
        Ok(path)
    }

    pub fn load(package_dir: &Path) -> Result<Self> {
        let path = Self::metadata_path(package_dir);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Library directories of an installed package: `lib`, plus `lib64` when
/// the install produced one.
pub fn lib_dirs(package_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("lib")];
    if package_dir.join("lib64").is_dir() {
        dirs.push(PathBuf::from("lib64"));
    }
    dirs
}

/// Library names found directly inside `lib_dirs`, sorted and deduplicated.
///
/// `libceres.a`, `libceres.so.2` and `ceres.lib` all yield `ceres`.
pub fn collect_libs(package_dir: &Path, lib_dirs: &[PathBuf]) -> Result<Vec<String>> {
    let mut libs = Vec::new();

    for dir in lib_dirs {
        let path = package_dir.join(dir);
        if !path.is_dir() {
            continue;
        }

        let entries = std::fs::read_dir(&path)
            .with_context(|| format!("failed to read directory {}", path.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str().and_then(library_name) {
                libs.push(name);
            }
        }
    }

    libs.sort();
    libs.dedup();
    Ok(libs)
}

/// Link name for a library file, or `None` if it is not a library.
fn library_name(file_name: &str) -> Option<String> {
    let (stem, ext) = split_library_extension(file_name)?;

    let stem = if ext != "lib" {
        stem.strip_prefix("lib").unwrap_or(stem)
    } else {
        stem
    };
    // libceres.2.0.0.dylib
    let stem = stem.split('.').next().unwrap_or(stem);

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

fn split_library_extension(file_name: &str) -> Option<(&str, &str)> {
    // Versioned shared objects: libceres.so.2, libceres.so.2.0.0
    if let Some(idx) = file_name.find(".so.") {
        let version = &file_name[idx + 4..];
        if version.split('.').all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
            return Some((&file_name[..idx], "so"));
        }
    }

    let (stem, ext) = file_name.rsplit_once('.')?;
    LIB_EXTENSIONS.contains(&ext).then_some((stem, ext))
}

/// Copy `LICENSE*` from the source tree into `<package>/licenses`.
///
/// Returns the copied files; empty when the source tree has no license.
pub fn copy_license(source_dir: &Path, package_dir: &Path) -> Result<Vec<PathBuf>> {
    let licenses = glob_files(source_dir, &["LICENSE*", "COPYING*"])?;
    if licenses.is_empty() {
        tracing::debug!("No license file found in {}", source_dir.display());
        return Ok(Vec::new());
    }

    let dest = package_dir.join(LICENSE_DIR);
    licenses.iter().map(|file| copy_into(file, &dest)).collect()
}

/// Verify the package produced libraries and write its metadata.
pub fn finalize(recipe: &Recipe, package_dir: &Path, system_libs: &[String]) -> Result<PackageInfo> {
    let dirs = lib_dirs(package_dir);
    let libs = collect_libs(package_dir, &dirs)?;

    if libs.is_empty() {
        return Err(RecipeError::NoLibrariesProduced {
            package_dir: package_dir.to_path_buf(),
            lib_dirs: dirs.iter().map(|d| package_dir.join(d)).collect(),
        }
        .into());
    }

    tracing::info!("Collected libraries: {}", libs.join(", "));

    let info = PackageInfo {
        name: recipe.name.to_string(),
        version: recipe.version.to_string(),
        alias: recipe.alias.to_string(),
        include_dirs: vec![PathBuf::from("include")],
        lib_dirs: dirs,
        libs,
        system_libs: system_libs.to_vec(),
    };
    info.write(package_dir)?;

    Ok(info)
}
