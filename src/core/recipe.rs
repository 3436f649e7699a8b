//! Fixed recipe metadata for Ceres Solver.

use serde::Serialize;

/// Package name.
pub const NAME: &str = "ceres-solver";

/// Upstream version the pinned revision belongs to.
pub const VERSION: &str = "2.0.0";

pub const LICENSE: &str = "New BSD";

/// Upstream git repository.
pub const UPSTREAM_URL: &str = "https://github.com/ceres-solver/ceres-solver.git";

/// Pinned upstream revision (27 April 2020).
pub const PINNED_REV: &str = "8c36bcc81fbd4f78a2faa2c914ef40af264f4c31";

/// Patch that makes the upstream build find Eigen3 through the prefix path.
pub const DEFAULT_PATCH: &str = "ceres-solver.patch";

/// Name downstream `find_package` calls use.
pub const CONSUMER_ALIAS: &str = "Ceres";

/// Static description of the recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub name: &'static str,
    pub version: semver::Version,
    pub license: &'static str,
    pub url: &'static str,
    pub alias: &'static str,
}

impl Recipe {
    pub fn ceres() -> Self {
        Recipe {
            name: NAME,
            version: semver::Version::new(2, 0, 0),
            license: LICENSE,
            url: UPSTREAM_URL,
            alias: CONSUMER_ALIAS,
        }
    }

    /// Directory the sources are checked out into, e.g. `ceres-solver-2.0.0`.
    pub fn source_subfolder(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::ceres()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_subfolder() {
        let recipe = Recipe::ceres();
        assert_eq!(recipe.source_subfolder(), "ceres-solver-2.0.0");
        assert_eq!(recipe.version.to_string(), VERSION);
    }

    #[test]
    fn test_pinned_rev_is_full_sha() {
        assert_eq!(PINNED_REV.len(), 40);
        assert!(PINNED_REV.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
