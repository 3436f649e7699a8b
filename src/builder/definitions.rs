//! Translation of recipe options into CMake cache definitions.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::builder::discovery::{discover_libraries, LibraryQuery};
use crate::core::dependency::DependencySet;
use crate::core::options::{BlasVendor, RecipeOptions};
use crate::core::settings::Settings;
use crate::util::hash::Fingerprint;

/// A single CMake cache value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Bool(bool),
    Str(String),
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Bool(true) => write!(f, "ON"),
            CacheValue::Bool(false) => write!(f, "OFF"),
            CacheValue::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for CacheValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<bool> for CacheValue {
    fn from(b: bool) -> Self {
        CacheValue::Bool(b)
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::Str(s)
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::Str(s.to_string())
    }
}

/// The derived build configuration handed to CMake.
///
/// Keys are kept sorted so the rendered argument list is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CMakeDefinitions {
    values: BTreeMap<String, CacheValue>,
}

impl CMakeDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<CacheValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as `-DKEY=VALUE` arguments.
    pub fn to_args(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("-D{}={}", k, v)).collect()
    }

    /// Short fingerprint of the whole mapping.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        for (k, v) in self.iter() {
            fp.update_str(k).update_str(&v.to_string());
        }
        fp.finish_short()
    }
}

/// Derive the CMake definitions for a build.
///
/// Pure apart from the library discovery scan: the same options, settings
/// and dependency set always produce the same mapping. Fails before any
/// external tool runs when the selected backend cannot be found on disk.
pub fn derive_definitions(
    options: &RecipeOptions,
    settings: &Settings,
    deps: &DependencySet,
) -> Result<CMakeDefinitions> {
    let mut defs = CMakeDefinitions::new();

    defs.set("CMAKE_FIND_PACKAGE_NO_PACKAGE_REGISTRY", true);
    defs.set("CMAKE_FIND_PACKAGE_NO_SYSTEM_PACKAGE_REGISTRY", true);
    defs.set("CMAKE_BUILD_TYPE", settings.build_type.as_cmake());
    defs.set("BUILD_SHARED_LIBS", options.shared);
    if let Some(fpic) = options.fpic {
        defs.set("CMAKE_POSITION_INDEPENDENT_CODE", fpic);
    }

    defs.set("BUILD_EXAMPLES", options.examples);
    defs.set("BUILD_TESTING", options.tests);
    defs.set("BUILD_BENCHMARKS", options.benchmarks);
    defs.set("BUILD_DOCUMENTATION", options.documentation);
    defs.set("MINIGLOG", options.miniglog);
    defs.set("GFLAGS", options.gflags);
    defs.set("LAPACK", options.lapack);
    defs.set("CUSTOM_BLAS", options.custom_blas);
    defs.set("EIGENSPARSE", options.eigensparse);
    defs.set("SUITESPARSE", options.suitesparse);
    defs.set("ACCELERATESPARSE", options.acceleratesparse);
    defs.set("CXSPARSE", options.cxsparse);
    defs.set("SCHUR_SPECIALIZATIONS", options.schur);

    // Dependency roots carry the Find*.cmake modules for glog, gflags and eigen.
    let module_paths = deps
        .roots()
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";");
    defs.set("CMAKE_MODULE_PATH", module_paths.clone());
    defs.set("CMAKE_PREFIX_PATH", module_paths);

    if let Some(include) = deps.get("eigen").and_then(|e| e.include_paths.first()) {
        defs.set("EIGEN3_INCLUDE_DIR", include.display().to_string());
    }

    let blas = options.blas.canonical();
    defs.set("BLA_PREFER_PKGCONFIG", options.blas_prefer_pkgconfig);
    defs.set("BLA_STATIC", !options.shared);
    if options.blas_libraries.is_none() {
        defs.set("BLA_VENDOR", blas.as_str());
    }

    // Discovery runs even when both lists are overridden; the overrides
    // replace its result but not its check.
    if blas == BlasVendor::OpenBLAS {
        let openblas = deps
            .get("openblas")
            .context("OpenBLAS selected but the `openblas` dependency is not resolved")?;
        let query = LibraryQuery::new("openblas", options.linkage());
        let libs = discover_libraries(&openblas.lib_paths, &query, &openblas.system_libs)?
            .join(";");
        defs.set("BLAS_LIBRARIES", libs.clone());
        defs.set("LAPACK_LIBRARIES", libs);
    }

    if let Some(ref libs) = options.blas_libraries {
        defs.set("BLAS_LIBRARIES", libs.as_str());
    }
    if let Some(ref libs) = options.lapack_libraries {
        defs.set("LAPACK_LIBRARIES", libs.as_str());
    }

    let mut cxx_flags = Vec::new();
    if let Some(ref march) = options.march {
        cxx_flags.push(format!("-march={}", march));
    }
    if let Some(align) = options.eigen_max_align_bytes {
        cxx_flags.push(format!("-DEIGEN_MAX_ALIGN_BYTES={}", align));
    }
    if !cxx_flags.is_empty() {
        defs.set("CMAKE_CXX_FLAGS", cxx_flags.join(" "));
    }

    tracing::debug!("Derived {} CMake definitions", defs.len());
    Ok(defs)
}
