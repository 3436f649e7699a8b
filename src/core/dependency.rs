//! Dependency requirements and their resolved locations.
//!
//! The recipe does not build its dependencies. It declares which ones it
//! needs (depending on the options) and expects each one to be installed
//! under a prefix that the user points at through the config file or the
//! `--dep` flag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;
use crate::core::options::RecipeOptions;

/// Where a dependency lives on disk, as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySpec {
    /// Install prefix of the dependency
    pub root: Option<PathBuf>,

    /// Include directories (absolute, or relative to `root`)
    pub include_dirs: Vec<PathBuf>,

    /// Library directories (absolute, or relative to `root`)
    pub lib_dirs: Vec<PathBuf>,

    /// Link-only system libraries (e.g. `pthread`, `m`)
    pub system_libs: Vec<String>,
}

impl DependencySpec {
    /// A spec with only a root prefix.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        DependencySpec {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Merge another spec into this one (other takes precedence).
    pub fn merge(&mut self, other: DependencySpec) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if !other.include_dirs.is_empty() {
            self.include_dirs = other.include_dirs;
        }
        if !other.lib_dirs.is_empty() {
            self.lib_dirs = other.lib_dirs;
        }
        if !other.system_libs.is_empty() {
            self.system_libs = other.system_libs;
        }
    }
}

/// A dependency with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyInfo {
    pub name: String,
    pub root: PathBuf,
    pub include_paths: Vec<PathBuf>,
    pub lib_paths: Vec<PathBuf>,
    pub system_libs: Vec<String>,
}

impl DependencyInfo {
    /// Resolve a spec into concrete paths.
    ///
    /// Without explicit directories, `include/` and `lib/` (plus `lib64/`
    /// when it exists) under the root are used.
    pub fn from_spec(name: &str, spec: &DependencySpec) -> Option<Self> {
        let root = spec.root.clone()?;

        let include_paths = if spec.include_dirs.is_empty() {
            vec![root.join("include")]
        } else {
            spec.include_dirs.iter().map(|p| absolutize(&root, p)).collect()
        };

        let lib_paths = if spec.lib_dirs.is_empty() {
            let mut dirs = vec![root.join("lib")];
            if root.join("lib64").is_dir() {
                dirs.push(root.join("lib64"));
            }
            dirs
        } else {
            spec.lib_dirs.iter().map(|p| absolutize(&root, p)).collect()
        };

        Some(DependencyInfo {
            name: name.to_string(),
            root,
            include_paths,
            lib_paths,
            system_libs: spec.system_libs.clone(),
        })
    }
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Options the recipe imposes on one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownstreamOption {
    pub dependency: &'static str,
    pub option: &'static str,
    pub value: String,
}

/// Ordered dependency requirements derived from the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirements {
    names: Vec<&'static str>,
    downstream: Vec<DownstreamOption>,
}

impl Requirements {
    /// Compute requirements for the given options.
    pub fn for_options(options: &RecipeOptions) -> Self {
        let mut names = vec!["eigen", "glog", "gflags"];
        let mut downstream = Vec::new();

        if let Some(provider) = options.blas.provided_by() {
            names.push(provider);
            if provider == "openblas" {
                // Ceres needs LAPACK as well; OpenBLAS must ship it.
                downstream.push(DownstreamOption {
                    dependency: provider,
                    option: "build_lapack",
                    value: "true".to_string(),
                });
            }
        }

        Requirements { names, downstream }
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn downstream_options(&self) -> &[DownstreamOption] {
        &self.downstream
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name)
    }
}

/// The resolved dependency set, in requirement order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencySet {
    deps: Vec<DependencyInfo>,
}

impl DependencySet {
    /// Resolve every requirement against the configured specs.
    ///
    /// Fails with every missing name at once rather than the first one.
    pub fn resolve(
        requirements: &Requirements,
        specs: &BTreeMap<String, DependencySpec>,
    ) -> Result<Self, RecipeError> {
        let mut deps = Vec::new();
        let mut missing = Vec::new();

        for name in requirements.names() {
            match specs.get(*name).and_then(|s| DependencyInfo::from_spec(name, s)) {
                Some(info) => {
                    tracing::debug!("Resolved {} at {}", name, info.root.display());
                    deps.push(info);
                }
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(RecipeError::MissingDependencies { missing });
        }

        Ok(DependencySet { deps })
    }

    pub fn from_infos(deps: Vec<DependencyInfo>) -> Self {
        DependencySet { deps }
    }

    pub fn get(&self, name: &str) -> Option<&DependencyInfo> {
        self.deps.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyInfo> {
        self.deps.iter()
    }

    /// Roots of every dependency, in requirement order.
    pub fn roots(&self) -> Vec<&Path> {
        self.deps.iter().map(|d| d.root.as_path()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}
