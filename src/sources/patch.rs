//! Applying local patches to the upstream checkout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::{read_to_string, write_string};
use crate::util::hash::{sha256_file, verify_sha256};
use crate::util::process::{find_git, ProcessBuilder};

/// Records which patches are applied to a checkout.
const APPLIED_MARKER: &str = ".ceres-recipe-patches";

/// A patch to apply to the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Path to the patch file
    pub file: PathBuf,

    /// Expected SHA256 of the patch file
    #[serde(default)]
    pub sha256: Option<String>,
}

impl PatchSpec {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        PatchSpec {
            file: file.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Resolve a relative patch path against `base`.
    pub fn resolved(&self, base: &Path) -> PatchSpec {
        let file = if self.file.is_absolute() {
            self.file.clone()
        } else {
            base.join(&self.file)
        };
        PatchSpec {
            file,
            sha256: self.sha256.clone(),
        }
    }
}

/// Apply patches in order, skipping ones already recorded as applied.
pub fn apply_patches(patches: &[PatchSpec], source_dir: &Path) -> Result<()> {
    let mut applied = read_applied(source_dir)?;

    for patch in patches {
        if !patch.file.is_file() {
            bail!(
                "patch file not found: {}\n\
                 \n\
                 Place it next to ceres-recipe.toml or list the patches to use under [source].",
                patch.file.display()
            );
        }

        if let Some(ref expected) = patch.sha256 {
            verify_sha256(&patch.file, expected)?;
        }

        let hash = sha256_file(&patch.file)?;
        if applied.contains(&hash) {
            tracing::debug!("Patch already applied: {}", patch.file.display());
            continue;
        }

        apply_single_patch(&patch.file, source_dir)?;
        applied.push(hash);
        write_applied(source_dir, &applied)?;
    }

    Ok(())
}

/// Forget every recorded patch, e.g. after the checkout was reset.
pub fn clear_applied(source_dir: &Path) -> Result<()> {
    let marker = source_dir.join(APPLIED_MARKER);
    if marker.exists() {
        std::fs::remove_file(&marker)
            .with_context(|| format!("failed to remove {}", marker.display()))?;
    }
    Ok(())
}

fn read_applied(source_dir: &Path) -> Result<Vec<String>> {
    let marker = source_dir.join(APPLIED_MARKER);
    if !marker.exists() {
        return Ok(Vec::new());
    }
    Ok(read_to_string(&marker)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

fn write_applied(source_dir: &Path, applied: &[String]) -> Result<()> {
    let mut contents = applied.join("\n");
    contents.push('\n');
    write_string(&source_dir.join(APPLIED_MARKER), &contents)
}

fn apply_single_patch(patch_path: &Path, source_dir: &Path) -> Result<()> {
    tracing::info!("Applying patch: {}", patch_path.display());

    let git = find_git().context("git is required to apply patches")?;

    // First, verify the patch will apply cleanly
    let check = ProcessBuilder::new(&git)
        .args(["apply", "--check"])
        .arg(patch_path)
        .cwd(source_dir)
        .exec()?;

    if !check.status.success() {
        bail!(
            "patch '{}' will not apply cleanly:\n{}",
            patch_path.display(),
            String::from_utf8_lossy(&check.stderr)
        );
    }

    ProcessBuilder::new(&git)
        .arg("apply")
        .arg(patch_path)
        .cwd(source_dir)
        .exec_and_check()
        .with_context(|| format!("failed to apply patch '{}'", patch_path.display()))?;

    Ok(())
}
