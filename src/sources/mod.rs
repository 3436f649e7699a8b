//! Source acquisition.
//!
//! The upstream sources come from a fixed git repository at a pinned
//! revision, followed by local patches.

pub mod git;
pub mod patch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::recipe::{DEFAULT_PATCH, PINNED_REV, UPSTREAM_URL};

pub use git::GitCheckout;
pub use patch::{apply_patches, PatchSpec};

/// Where the upstream sources come from and how they are patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSpec {
    /// Git repository URL
    pub url: String,

    /// Full commit SHA to check out
    pub rev: String,

    /// Patches applied in order after checkout
    pub patches: Vec<PatchSpec>,
}

impl Default for SourceSpec {
    fn default() -> Self {
        SourceSpec {
            url: UPSTREAM_URL.to_string(),
            rev: PINNED_REV.to_string(),
            patches: vec![PatchSpec::new(DEFAULT_PATCH)],
        }
    }
}

/// Fetch, check out and patch the sources into `source_dir`.
///
/// Relative patch paths are resolved against `recipe_dir`. Returns the
/// commit that was checked out.
pub fn acquire(spec: &SourceSpec, source_dir: &Path, recipe_dir: &Path) -> Result<String> {
    let mut checkout = GitCheckout::new(&spec.url, &spec.rev, source_dir.to_path_buf())?;
    let commit = checkout.fetch()?;

    let patches: Vec<PatchSpec> = spec
        .patches
        .iter()
        .map(|p| p.resolved(recipe_dir))
        .collect();
    apply_patches(&patches, source_dir)?;

    Ok(commit)
}

/// Default directory for relative patch paths: the current directory.
pub fn default_recipe_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
