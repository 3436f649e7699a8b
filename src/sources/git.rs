//! Git checkout of the upstream sources at a pinned revision.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::{Oid, Repository, ResetType};
use url::Url;

use crate::sources::patch;

/// A checkout of one repository at one commit.
pub struct GitCheckout {
    /// Remote repository URL
    remote: Url,

    /// Commit to check out
    rev: Oid,

    /// Local checkout path
    checkout_path: PathBuf,
}

impl GitCheckout {
    /// Create a checkout description. `rev` must be a full commit SHA;
    /// branches and tags would make the build non-reproducible.
    pub fn new(remote: &str, rev: &str, checkout_path: PathBuf) -> Result<Self> {
        let remote = parse_remote(remote)?;

        if rev.len() != 40 || !rev.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!(
                "revision `{}` is not a full commit SHA (40 hex chars)",
                rev
            );
        }
        let rev = Oid::from_str(rev).with_context(|| format!("invalid revision `{}`", rev))?;

        Ok(GitCheckout {
            remote,
            rev,
            checkout_path,
        })
    }

    /// Clone or update, then check out the pinned commit.
    ///
    /// Returns the checked-out commit SHA.
    pub fn fetch(&mut self) -> Result<String> {
        if self.checkout_path.join(".git").exists() {
            let repo = Repository::open(&self.checkout_path)
                .with_context(|| format!("failed to open {}", self.checkout_path.display()))?;

            if head_commit(&repo) == Some(self.rev) {
                tracing::info!("Sources already at {}", short(self.rev));
                return Ok(self.rev.to_string());
            }
            if repo.find_commit(self.rev).is_err() {
                self.update(&repo)?;
            }
        } else {
            self.clone_fresh()?;
        }

        self.checkout()
    }

    fn clone_fresh(&self) -> Result<()> {
        tracing::info!("Cloning {}", self.remote);

        let parent = self
            .checkout_path
            .parent()
            .context("checkout path has no parent directory")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        if self.checkout_path.exists() {
            bail!(
                "{} exists but is not a git checkout; remove it or choose another work dir",
                self.checkout_path.display()
            );
        }

        // Clone next to the destination and move it into place, so an
        // interrupted clone never looks like a valid checkout.
        let staging = tempfile::Builder::new()
            .prefix(".clone-")
            .tempdir_in(parent)
            .context("failed to create staging directory for clone")?;

        Repository::clone(self.remote.as_str(), staging.path())
            .with_context(|| format!("failed to clone {}", self.remote))?;

        let staged = staging.keep();
        std::fs::rename(&staged, &self.checkout_path).with_context(|| {
            format!(
                "failed to move clone into {}",
                self.checkout_path.display()
            )
        })?;

        Ok(())
    }

    fn update(&self, repo: &Repository) -> Result<()> {
        tracing::info!("Updating {}", self.remote);

        let mut remote = repo
            .find_remote("origin")
            .context("checkout has no `origin` remote")?;
        remote
            .fetch(&["+refs/heads/*:refs/remotes/origin/*"], None, None)
            .with_context(|| format!("failed to fetch from {}", self.remote))?;

        Ok(())
    }

    fn checkout(&self) -> Result<String> {
        let repo = Repository::open(&self.checkout_path)?;

        let commit = repo.find_commit(self.rev).with_context(|| {
            format!(
                "revision {} not found in {}",
                self.rev, self.remote
            )
        })?;

        repo.reset(commit.as_object(), ResetType::Hard, None)
            .with_context(|| format!("failed to check out {}", self.rev))?;
        // Tracked files are pristine again, so earlier patches are gone.
        patch::clear_applied(&self.checkout_path)?;

        tracing::info!("Checked out {}", short(self.rev));
        Ok(commit.id().to_string())
    }
}

fn head_commit(repo: &Repository) -> Option<Oid> {
    repo.head().ok()?.peel_to_commit().ok().map(|c| c.id())
}

fn short(oid: Oid) -> String {
    oid.to_string()[..10].to_string()
}

/// Accept URLs and plain local paths (turned into `file://` URLs).
fn parse_remote(remote: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(remote) {
        return Ok(url);
    }

    let path = Path::new(remote);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map_err(|_| anyhow::anyhow!("invalid repository location `{}`", remote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a repository with two commits and return (path, first, second).
    fn upstream(tmp: &TempDir) -> (PathBuf, Oid, Oid) {
        let path = tmp.path().join("upstream");
        let repo = Repository::init(&path).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();

        let commit = |content: &str, parent: Option<Oid>| -> Oid {
            std::fs::write(path.join("CMakeLists.txt"), content).unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("CMakeLists.txt")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let parents: Vec<git2::Commit> =
                parent.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
            let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
            repo.commit(Some("HEAD"), &sig, &sig, content, &tree, &parent_refs)
                .unwrap()
        };

        let first = commit("project(first)", None);
        let second = commit("project(second)", Some(first));
        (path, first, second)
    }

    #[test]
    fn test_rejects_non_sha_revision() {
        assert!(GitCheckout::new("https://example.com/repo.git", "master", PathBuf::from("x")).is_err());
    }

    #[test]
    fn test_checkout_pinned_commit() {
        let tmp = TempDir::new().unwrap();
        let (remote, first, _) = upstream(&tmp);
        let dest = tmp.path().join("work").join("ceres-solver-2.0.0");

        let mut checkout =
            GitCheckout::new(remote.to_str().unwrap(), &first.to_string(), dest.clone()).unwrap();
        let commit = checkout.fetch().unwrap();

        assert_eq!(commit, first.to_string());
        assert_eq!(
            std::fs::read_to_string(dest.join("CMakeLists.txt")).unwrap(),
            "project(first)"
        );

        // Second fetch reuses the checkout.
        assert_eq!(checkout.fetch().unwrap(), first.to_string());
    }

    #[test]
    fn test_clone_leaves_no_staging_dir() {
        let tmp = TempDir::new().unwrap();
        let (remote, first, _) = upstream(&tmp);
        let work = tmp.path().join("work");
        let dest = work.join("ceres-solver-2.0.0");

        GitCheckout::new(remote.to_str().unwrap(), &first.to_string(), dest.clone())
            .unwrap()
            .fetch()
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(&work)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ceres-solver-2.0.0"]);
    }

    #[test]
    fn test_moves_existing_checkout_to_new_rev() {
        let tmp = TempDir::new().unwrap();
        let (remote, first, second) = upstream(&tmp);
        let dest = tmp.path().join("src");

        GitCheckout::new(remote.to_str().unwrap(), &first.to_string(), dest.clone())
            .unwrap()
            .fetch()
            .unwrap();
        GitCheckout::new(remote.to_str().unwrap(), &second.to_string(), dest.clone())
            .unwrap()
            .fetch()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("CMakeLists.txt")).unwrap(),
            "project(second)"
        );
    }

    #[test]
    fn test_parse_remote_accepts_paths() {
        let url = parse_remote("/tmp/some/repo").unwrap();
        assert_eq!(url.scheme(), "file");
        let url = parse_remote("https://github.com/ceres-solver/ceres-solver.git").unwrap();
        assert_eq!(url.host_str(), Some("github.com"));
    }
}
