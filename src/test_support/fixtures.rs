//! Test fixtures for common test scenarios.
//!
//! Dependency prefixes and package trees laid out on disk the way an
//! installed prefix looks, so discovery and packaging run against real
//! files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::dependency::{DependencySet, DependencySpec, Requirements};
use crate::core::options::RecipeOptions;

/// A dependency prefix on disk.
#[derive(Debug, Clone)]
pub struct DependencyFixture {
    /// Dependency name (`eigen`, `openblas`, ...).
    pub name: String,
    /// Include directories relative to the prefix.
    pub include_dirs: Vec<PathBuf>,
    /// Files created under `lib/`.
    pub libs: Vec<String>,
    /// System libraries the dependency links against.
    pub system_libs: Vec<String>,
}

impl DependencyFixture {
    pub fn new(name: impl Into<String>) -> Self {
        DependencyFixture {
            name: name.into(),
            include_dirs: Vec::new(),
            libs: Vec::new(),
            system_libs: Vec::new(),
        }
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn lib(mut self, file: impl Into<String>) -> Self {
        self.libs.push(file.into());
        self
    }

    pub fn system_lib(mut self, lib: impl Into<String>) -> Self {
        self.system_libs.push(lib.into());
        self
    }

    /// Create the prefix under `base` and return its spec.
    pub fn write_to(&self, base: &Path) -> std::io::Result<DependencySpec> {
        let root = base.join(&self.name);
        std::fs::create_dir_all(root.join("include"))?;
        std::fs::create_dir_all(root.join("lib"))?;

        for dir in &self.include_dirs {
            std::fs::create_dir_all(root.join(dir))?;
        }
        for lib in &self.libs {
            std::fs::write(root.join("lib").join(lib), b"")?;
        }

        Ok(DependencySpec {
            root: Some(root),
            include_dirs: self.include_dirs.clone(),
            lib_dirs: Vec::new(),
            system_libs: self.system_libs.clone(),
        })
    }

    /// Specs for eigen, glog, gflags and openblas under `base`.
    ///
    /// `openblas_files` are created in the OpenBLAS `lib/` directory, and
    /// OpenBLAS links `pthread`.
    pub fn standard_specs(base: &Path, openblas_files: &[&str]) -> BTreeMap<String, DependencySpec> {
        let mut openblas = DependencyFixture::new("openblas").system_lib("pthread");
        for file in openblas_files {
            openblas = openblas.lib(*file);
        }

        let fixtures = [
            DependencyFixture::new("eigen").include_dir("include/eigen3"),
            DependencyFixture::new("glog").lib("libglog.a"),
            DependencyFixture::new("gflags").lib("libgflags.a"),
            openblas,
        ];

        fixtures
            .iter()
            .map(|f| {
                let spec = f.write_to(base).expect("failed to create dependency fixture");
                (f.name.clone(), spec)
            })
            .collect()
    }

    /// Resolved set for the default options (OpenBLAS backend).
    pub fn standard_set(base: &Path, openblas_files: &[&str]) -> DependencySet {
        let specs = Self::standard_specs(base, openblas_files);
        let requirements = Requirements::for_options(&RecipeOptions::default());
        DependencySet::resolve(&requirements, &specs).expect("standard fixture must resolve")
    }
}

/// An installed package tree.
#[derive(Debug, Clone, Default)]
pub struct PackageFixture {
    files: Vec<PathBuf>,
}

impl PackageFixture {
    pub fn new() -> Self {
        PackageFixture::default()
    }

    /// Add an empty file at `path`, relative to the package root.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// A typical static install: headers, the library and a license.
    pub fn installed_static() -> Self {
        PackageFixture::new()
            .file("include/ceres/ceres.h")
            .file("lib/libceres.a")
            .file("lib/cmake/Ceres/CeresConfig.cmake")
    }

    pub fn write_to(&self, package_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(package_dir)?;
        for file in &self.files {
            let path = package_dir.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"")?;
        }
        Ok(())
    }
}
