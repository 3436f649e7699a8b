//! Test utilities for unit tests.
//!
//! Fixtures build real dependency prefixes and package trees inside a
//! temporary directory; nothing here runs CMake.
//!
//! # Example
//!
//! ```rust,ignore
//! use ceres_recipe::test_support::DependencyFixture;
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let deps = DependencyFixture::standard_set(tmp.path(), &["libopenblas.a"]);
//!     assert!(deps.get("openblas").is_some());
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;

use std::path::{Path, PathBuf};

/// Create a file with `contents`, including parent directories.
pub fn write_file(base: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = base.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent directory");
    }
    std::fs::write(&path, contents).expect("failed to write file");
    path
}
