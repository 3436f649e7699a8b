//! Recipe option schema.
//!
//! Every option has a default. Options are set from `key=value` strings
//! (CLI `-o` flags and the `[options]` table of the config file), then
//! adjusted once against the settings by [`RecipeOptions::configure`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;
use crate::core::settings::Settings;

/// BLAS/LAPACK vendor, spelled the way CMake's `FindBLAS` expects it.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlasVendor {
    #[default]
    OpenBLAS,
    /// Alias for [`BlasVendor::Intel10_64lp`].
    MKL,
    Intel,
    Intel10_64lp,
    Intel10_64lp_seq,
    Intel10_64ilp,
    FLAME,
    Goto,
    #[serde(rename = "ATLAS PhiPACK")]
    AtlasPhiPack,
    Generic,
    All,
}

impl BlasVendor {
    pub const ALL: [BlasVendor; 11] = [
        BlasVendor::OpenBLAS,
        BlasVendor::MKL,
        BlasVendor::Intel,
        BlasVendor::Intel10_64lp,
        BlasVendor::Intel10_64lp_seq,
        BlasVendor::Intel10_64ilp,
        BlasVendor::FLAME,
        BlasVendor::Goto,
        BlasVendor::AtlasPhiPack,
        BlasVendor::Generic,
        BlasVendor::All,
    ];

    /// Rewrite alias vendors to the concrete vendor CMake knows about.
    pub fn canonical(self) -> Self {
        match self {
            BlasVendor::MKL => BlasVendor::Intel10_64lp,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlasVendor::OpenBLAS => "OpenBLAS",
            BlasVendor::MKL => "MKL",
            BlasVendor::Intel => "Intel",
            BlasVendor::Intel10_64lp => "Intel10_64lp",
            BlasVendor::Intel10_64lp_seq => "Intel10_64lp_seq",
            BlasVendor::Intel10_64ilp => "Intel10_64ilp",
            BlasVendor::FLAME => "FLAME",
            BlasVendor::Goto => "Goto",
            BlasVendor::AtlasPhiPack => "ATLAS PhiPACK",
            BlasVendor::Generic => "Generic",
            BlasVendor::All => "All",
        }
    }

    /// Dependency that provides this vendor, when the recipe builds it.
    pub fn provided_by(&self) -> Option<&'static str> {
        match self {
            BlasVendor::OpenBLAS => Some("openblas"),
            _ => None,
        }
    }
}

impl fmt::Display for BlasVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlasVendor {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlasVendor::ALL
            .iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| RecipeError::InvalidOption {
                option: "blas".to_string(),
                value: s.to_string(),
                accepted: BlasVendor::ALL.iter().map(|v| v.to_string()).collect(),
            })
    }
}

/// How the produced and discovered libraries are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Linkage {
    Static,
    Shared,
}

/// Documentation for a single option, used by `ceres-recipe options`.
#[derive(Debug, Clone, Serialize)]
pub struct OptionInfo {
    pub name: &'static str,
    pub default: String,
    pub accepted: String,
}

/// The options record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeOptions {
    /// `None` once removed for compilers without PIC (MSVC).
    pub fpic: Option<bool>,
    pub shared: bool,
    pub examples: bool,
    pub tests: bool,
    pub benchmarks: bool,
    pub documentation: bool,
    pub miniglog: bool,
    pub gflags: bool,
    pub lapack: bool,
    pub custom_blas: bool,
    pub eigensparse: bool,
    pub suitesparse: bool,
    pub acceleratesparse: bool,
    pub cxsparse: bool,
    pub schur: bool,
    pub blas_prefer_pkgconfig: bool,
    pub blas: BlasVendor,
    pub blas_libraries: Option<String>,
    pub lapack_libraries: Option<String>,
    /// Value for `-march=`.
    pub march: Option<String>,
    /// Value for `EIGEN_MAX_ALIGN_BYTES`.
    pub eigen_max_align_bytes: Option<u32>,
}

impl Default for RecipeOptions {
    fn default() -> Self {
        RecipeOptions {
            fpic: Some(true),
            shared: false,
            examples: false,
            tests: false,
            benchmarks: false,
            documentation: false,
            miniglog: false,
            gflags: true,
            lapack: true,
            custom_blas: true,
            eigensparse: true,
            suitesparse: false,
            acceleratesparse: false,
            cxsparse: false,
            schur: false,
            blas_prefer_pkgconfig: false,
            blas: BlasVendor::OpenBLAS,
            blas_libraries: None,
            lapack_libraries: None,
            march: None,
            eigen_max_align_bytes: None,
        }
    }
}

const BOOL_OPTIONS: &[&str] = &[
    "fPIC",
    "shared",
    "examples",
    "tests",
    "benchmarks",
    "documentation",
    "miniglog",
    "gflags",
    "lapack",
    "custom_blas",
    "eigensparse",
    "suitesparse",
    "acceleratesparse",
    "cxsparse",
    "schur",
    "blas_prefer_pkgconfig",
];

const TEXT_OPTIONS: &[&str] = &["blas_libraries", "lapack_libraries", "march"];

impl RecipeOptions {
    /// Names of every option, in schema order.
    pub fn names() -> Vec<&'static str> {
        let mut names = BOOL_OPTIONS.to_vec();
        names.push("blas");
        names.extend_from_slice(TEXT_OPTIONS);
        names.push("eigen_max_align_bytes");
        names
    }

    /// Describe every option with its default and accepted values.
    pub fn describe() -> Vec<OptionInfo> {
        let defaults = RecipeOptions::default();
        RecipeOptions::names()
            .into_iter()
            .map(|name| {
                let accepted = match name {
                    "blas" => BlasVendor::ALL
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    "eigen_max_align_bytes" => "unsigned integer".to_string(),
                    n if TEXT_OPTIONS.contains(&n) => "any text".to_string(),
                    _ => "true, false".to_string(),
                };
                OptionInfo {
                    name,
                    default: defaults.get(name).unwrap_or_else(|| "None".to_string()),
                    accepted,
                }
            })
            .collect()
    }

    /// Current value of an option as text, `None` when unset.
    pub fn get(&self, name: &str) -> Option<String> {
        let b = |v: bool| Some(v.to_string());
        match name {
            "fPIC" => self.fpic.map(|v| v.to_string()),
            "shared" => b(self.shared),
            "examples" => b(self.examples),
            "tests" => b(self.tests),
            "benchmarks" => b(self.benchmarks),
            "documentation" => b(self.documentation),
            "miniglog" => b(self.miniglog),
            "gflags" => b(self.gflags),
            "lapack" => b(self.lapack),
            "custom_blas" => b(self.custom_blas),
            "eigensparse" => b(self.eigensparse),
            "suitesparse" => b(self.suitesparse),
            "acceleratesparse" => b(self.acceleratesparse),
            "cxsparse" => b(self.cxsparse),
            "schur" => b(self.schur),
            "blas_prefer_pkgconfig" => b(self.blas_prefer_pkgconfig),
            "blas" => Some(self.blas.to_string()),
            "blas_libraries" => self.blas_libraries.clone(),
            "lapack_libraries" => self.lapack_libraries.clone(),
            "march" => self.march.clone(),
            "eigen_max_align_bytes" => self.eigen_max_align_bytes.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Parse a `key=value` assignment and apply it.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), RecipeError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| RecipeError::InvalidOption {
                option: assignment.to_string(),
                value: String::new(),
                accepted: vec!["<option>=<value>".to_string()],
            })?;
        self.set(key.trim(), value.trim())
    }

    /// Canonical name of an option key.
    pub fn canonical_key(key: &str) -> &str {
        // Older recipes spelled this one wrong; keep accepting it.
        if key == "acceleratesparese" {
            "acceleratesparse"
        } else {
            key
        }
    }

    /// Set a single option from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), RecipeError> {
        let key = Self::canonical_key(key);

        let flag = || parse_bool(key, value);
        match key {
            "fPIC" => self.fpic = Some(flag()?),
            "shared" => self.shared = flag()?,
            "examples" => self.examples = flag()?,
            "tests" => self.tests = flag()?,
            "benchmarks" => self.benchmarks = flag()?,
            "documentation" => self.documentation = flag()?,
            "miniglog" => self.miniglog = flag()?,
            "gflags" => self.gflags = flag()?,
            "lapack" => self.lapack = flag()?,
            "custom_blas" => self.custom_blas = flag()?,
            "eigensparse" => self.eigensparse = flag()?,
            "suitesparse" => self.suitesparse = flag()?,
            "acceleratesparse" => self.acceleratesparse = flag()?,
            "cxsparse" => self.cxsparse = flag()?,
            "schur" => self.schur = flag()?,
            "blas_prefer_pkgconfig" => self.blas_prefer_pkgconfig = flag()?,
            "blas" => self.blas = value.parse()?,
            "blas_libraries" => self.blas_libraries = parse_text(value),
            "lapack_libraries" => self.lapack_libraries = parse_text(value),
            "march" => self.march = parse_text(value),
            "eigen_max_align_bytes" => {
                self.eigen_max_align_bytes = match parse_text(value) {
                    None => None,
                    Some(v) => Some(v.parse().map_err(|_| RecipeError::InvalidOption {
                        option: key.to_string(),
                        value: value.to_string(),
                        accepted: vec!["unsigned integer".to_string()],
                    })?),
                }
            }
            _ => {
                return Err(RecipeError::UnknownOption {
                    option: key.to_string(),
                    known: RecipeOptions::names()
                        .into_iter()
                        .map(String::from)
                        .collect(),
                })
            }
        }
        Ok(())
    }

    /// Adjust options against the settings.
    ///
    /// Drops `fPIC` for MSVC and rewrites alias backends to their canonical
    /// vendor. Applying it twice yields the same record.
    pub fn configure(mut self, settings: &Settings) -> Self {
        if settings.compiler.is_msvc() {
            self.fpic = None;
        }
        self.blas = self.blas.canonical();
        self
    }

    pub fn linkage(&self) -> Linkage {
        if self.shared {
            Linkage::Shared
        } else {
            Linkage::Static
        }
    }
}

fn parse_bool(option: &str, value: &str) -> Result<bool, RecipeError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(RecipeError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            accepted: vec!["true".to_string(), "false".to_string()],
        }),
    }
}

/// Empty text and the literal `None` both mean "unset".
fn parse_text(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "None" {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Compiler;

    #[test]
    fn test_defaults() {
        let opts = RecipeOptions::default();
        assert_eq!(opts.fpic, Some(true));
        assert!(!opts.shared);
        assert!(opts.gflags);
        assert!(opts.eigensparse);
        assert_eq!(opts.blas, BlasVendor::OpenBLAS);
        assert!(opts.blas_libraries.is_none());
        assert_eq!(opts.linkage(), Linkage::Static);
    }

    #[test]
    fn test_every_option_has_a_default() {
        let described = RecipeOptions::describe();
        assert_eq!(described.len(), RecipeOptions::names().len());
        let blas = described.iter().find(|o| o.name == "blas").unwrap();
        assert_eq!(blas.default, "OpenBLAS");
        assert!(blas.accepted.contains("ATLAS PhiPACK"));
    }

    #[test]
    fn test_mkl_alias_is_canonicalized() {
        let mut opts = RecipeOptions::default();
        opts.set("blas", "MKL").unwrap();
        assert_eq!(opts.blas, BlasVendor::MKL);

        let opts = opts.configure(&Settings::detect().with_compiler(Compiler::Gcc));
        assert_eq!(opts.blas, BlasVendor::Intel10_64lp);
    }

    #[test]
    fn test_configure_is_idempotent() {
        let settings = Settings::detect().with_compiler(Compiler::Msvc);
        let mut opts = RecipeOptions::default();
        opts.set("blas", "mkl").unwrap();

        let once = opts.configure(&settings);
        let twice = once.clone().configure(&settings);
        assert_eq!(once, twice);
        assert_eq!(once.fpic, None);
    }

    #[test]
    fn test_set_from_assignment() {
        let mut opts = RecipeOptions::default();
        opts.apply_assignment("shared=True").unwrap();
        opts.apply_assignment("blas_libraries=/opt/blas/libblas.so").unwrap();
        opts.apply_assignment("eigen_max_align_bytes=32").unwrap();

        assert!(opts.shared);
        assert_eq!(opts.blas_libraries.as_deref(), Some("/opt/blas/libblas.so"));
        assert_eq!(opts.eigen_max_align_bytes, Some(32));
        assert_eq!(opts.linkage(), Linkage::Shared);
    }

    #[test]
    fn test_legacy_option_spelling() {
        let mut opts = RecipeOptions::default();
        opts.set("acceleratesparese", "true").unwrap();
        assert!(opts.acceleratesparse);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut opts = RecipeOptions::default();
        assert!(matches!(
            opts.set("shared", "maybe"),
            Err(RecipeError::InvalidOption { .. })
        ));
        assert!(matches!(
            opts.set("blas", "CuBLAS"),
            Err(RecipeError::InvalidOption { .. })
        ));
        assert!(matches!(
            opts.set("openmp", "true"),
            Err(RecipeError::UnknownOption { .. })
        ));
        assert!(opts.apply_assignment("shared").is_err());
    }

    #[test]
    fn test_none_clears_text_option() {
        let mut opts = RecipeOptions::default();
        opts.set("march", "native").unwrap();
        opts.set("march", "None").unwrap();
        assert!(opts.march.is_none());
    }
}
