//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Find files matching glob patterns relative to a base directory.
///
/// Results are sorted and deduplicated.
pub fn glob_files(base: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Copy a file into a directory, keeping its file name.
pub fn copy_into(file: &Path, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let name = file
        .file_name()
        .with_context(|| format!("not a file path: {}", file.display()))?;
    let dst = dir.join(name);
    fs::copy(file, &dst)
        .with_context(|| format!("failed to copy {} to {}", file.display(), dst.display()))?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("LICENSE"), "bsd").unwrap();
        fs::write(tmp.path().join("LICENSE.txt"), "bsd").unwrap();
        fs::write(tmp.path().join("README.md"), "readme").unwrap();

        let files = glob_files(tmp.path(), &["LICENSE*", "LICENSE"]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_copy_into_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("LICENSE");
        fs::write(&src, "content").unwrap();

        let dst = copy_into(&src, &tmp.path().join("pkg/licenses")).unwrap();
        assert_eq!(dst, tmp.path().join("pkg/licenses/LICENSE"));
        assert_eq!(fs::read_to_string(dst).unwrap(), "content");
    }

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/info.json");
        write_string(&path, "{}").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "{}");
    }
}
