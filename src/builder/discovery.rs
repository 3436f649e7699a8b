//! Library discovery for linear-algebra backends.
//!
//! Scans a dependency's library directories for files whose name contains
//! the backend's identifying fragment and whose extension matches the
//! requested linkage.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::RecipeError;
use crate::core::options::Linkage;

/// Extensions accepted for shared linkage.
pub const SHARED_EXTENSIONS: &[&str] = &[".so", ".dll", ".dylib"];

/// Extensions accepted for static linkage.
pub const STATIC_EXTENSIONS: &[&str] = &[".a", ".lib"];

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryQuery {
    /// Substring the file name must contain (e.g. `openblas`)
    pub fragment: String,
    pub linkage: Linkage,
}

impl LibraryQuery {
    pub fn new(fragment: impl Into<String>, linkage: Linkage) -> Self {
        LibraryQuery {
            fragment: fragment.into(),
            linkage,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self.linkage {
            Linkage::Shared => SHARED_EXTENSIONS,
            Linkage::Static => STATIC_EXTENSIONS,
        }
    }

    /// Whether a file name satisfies this query.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.contains(&self.fragment)
            && self.extensions().iter().any(|ext| file_name.ends_with(ext))
    }
}

/// Find library files for `query` in `dirs`, then append `system_libs`.
///
/// Directories are scanned in the order given; entries within a directory
/// are visited by file name so the result does not depend on the
/// filesystem's enumeration order. Directories that do not exist are
/// skipped rather than treated as errors, so a prefix may omit `lib64`.
/// No matching file at all is [`RecipeError::BackendNotFound`], even when
/// every directory is missing and regardless of how many system libraries
/// the dependency declares.
pub fn discover_libraries(
    dirs: &[PathBuf],
    query: &LibraryQuery,
    system_libs: &[String],
) -> Result<Vec<String>> {
    let mut found = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::debug!("Skipping missing library directory {}", dir.display());
            continue;
        }
        found.extend(scan_dir(dir, query)?);
    }

    if found.is_empty() {
        return Err(RecipeError::BackendNotFound {
            backend: query.fragment.clone(),
            searched: dirs.to_vec(),
            extensions: query.extensions().iter().map(|e| e.to_string()).collect(),
        }
        .into());
    }

    tracing::debug!("Discovered {} {} libraries", found.len(), query.fragment);

    let mut libs: Vec<String> = found.iter().map(|p| p.display().to_string()).collect();
    libs.extend(system_libs.iter().cloned());
    Ok(libs)
}

fn scan_dir(dir: &Path, query: &LibraryQuery) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if query.matches(name) {
            entries.push(path);
        }
    }

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_static_discovery_filters_by_extension_and_fragment() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("lib");
        fs::create_dir_all(&lib).unwrap();
        touch(&lib, "libopenblas.a");
        touch(&lib, "libopenblas.so");
        touch(&lib, "liblapack.a");
        touch(&lib, "openblas.pc");

        let query = LibraryQuery::new("openblas", Linkage::Static);
        let libs = discover_libraries(&[lib.clone()], &query, &["pthread".to_string()]).unwrap();

        assert_eq!(
            libs,
            vec![lib.join("libopenblas.a").display().to_string(), "pthread".to_string()]
        );
    }

    #[test]
    fn test_shared_discovery_keeps_directory_order() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("lib64");
        let second = tmp.path().join("lib");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        touch(&first, "libopenblas_z.so");
        touch(&first, "libopenblas_a.so");
        touch(&second, "libopenblas.dylib");

        let query = LibraryQuery::new("openblas", Linkage::Shared);
        let libs = discover_libraries(&[first.clone(), second.clone()], &query, &[]).unwrap();

        assert_eq!(
            libs,
            vec![
                first.join("libopenblas_a.so").display().to_string(),
                first.join("libopenblas_z.so").display().to_string(),
                second.join("libopenblas.dylib").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_no_match_is_backend_not_found() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "libopenblas.so");

        let query = LibraryQuery::new("openblas", Linkage::Static);
        let err = discover_libraries(
            &[tmp.path().to_path_buf()],
            &query,
            &["pthread".to_string()],
        )
        .unwrap_err();

        let recipe_err = err.downcast_ref::<RecipeError>().unwrap();
        assert!(matches!(recipe_err, RecipeError::BackendNotFound { .. }));
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("lib");
        fs::create_dir_all(&lib).unwrap();
        touch(&lib, "openblas.lib");

        let query = LibraryQuery::new("openblas", Linkage::Static);
        let libs =
            discover_libraries(&[tmp.path().join("nope"), lib.clone()], &query, &[]).unwrap();
        assert_eq!(libs, vec![lib.join("openblas.lib").display().to_string()]);
    }

    #[test]
    fn test_all_directories_missing_is_backend_not_found() {
        let tmp = TempDir::new().unwrap();
        let dirs = vec![tmp.path().join("lib"), tmp.path().join("lib64")];

        let query = LibraryQuery::new("openblas", Linkage::Static);
        let err = discover_libraries(&dirs, &query, &["pthread".to_string()]).unwrap_err();

        match err.downcast_ref::<RecipeError>() {
            Some(RecipeError::BackendNotFound { searched, .. }) => assert_eq!(searched, &dirs),
            other => panic!("expected BackendNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_query_matches() {
        let query = LibraryQuery::new("openblas", Linkage::Shared);
        assert!(query.matches("libopenblas.so"));
        assert!(query.matches("openblas.dll"));
        assert!(!query.matches("libopenblas.so.0"));
        assert!(!query.matches("libblas.so"));
    }
}
