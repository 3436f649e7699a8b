//! Host/target settings the recipe is built for.
//!
//! Settings are not options: they describe the environment (operating
//! system, compiler, build type, architecture) and only influence which
//! options exist and how artifacts are named.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system of the build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Macos,
    Windows,
    Other,
}

impl Os {
    /// Operating system of the running host.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::Macos,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => write!(f, "linux"),
            Os::Macos => write!(f, "macos"),
            Os::Windows => write!(f, "windows"),
            Os::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" => Ok(Os::Macos),
            "windows" => Ok(Os::Windows),
            "other" => Ok(Os::Other),
            _ => Err(format!(
                "invalid os '{}'; expected 'linux', 'macos', 'windows' or 'other'",
                s
            )),
        }
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
}

impl Compiler {
    /// Compiler family the host would use by default.
    pub fn host_default() -> Self {
        if cfg!(target_env = "msvc") {
            Compiler::Msvc
        } else if cfg!(target_os = "macos") {
            Compiler::AppleClang
        } else {
            Compiler::Gcc
        }
    }

    /// MSVC-style compilers have no notion of position independent code.
    pub fn is_msvc(&self) -> bool {
        matches!(self, Compiler::Msvc)
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compiler::Gcc => write!(f, "gcc"),
            Compiler::Clang => write!(f, "clang"),
            Compiler::AppleClang => write!(f, "apple-clang"),
            Compiler::Msvc => write!(f, "msvc"),
        }
    }
}

impl FromStr for Compiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "apple-clang" => Ok(Compiler::AppleClang),
            "msvc" | "visual studio" => Ok(Compiler::Msvc),
            _ => Err(format!(
                "invalid compiler '{}'; expected 'gcc', 'clang', 'apple-clang' or 'msvc'",
                s
            )),
        }
    }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    /// The spelling CMake expects in `CMAKE_BUILD_TYPE` and `--config`.
    pub fn as_cmake(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cmake())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(format!(
                "invalid build type '{}'; expected 'Debug', 'Release', 'RelWithDebInfo' or 'MinSizeRel'",
                s
            )),
        }
    }
}

/// The full settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub os: Os,
    pub compiler: Compiler,
    pub build_type: BuildType,
    pub arch: String,
}

impl Settings {
    /// Settings for the running host with a Release build type.
    pub fn detect() -> Self {
        Settings {
            os: Os::host(),
            compiler: Compiler::host_default(),
            build_type: BuildType::default(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_parse() {
        assert_eq!("release".parse::<BuildType>().unwrap(), BuildType::Release);
        assert_eq!(
            "RelWithDebInfo".parse::<BuildType>().unwrap(),
            BuildType::RelWithDebInfo
        );
        assert!("fast".parse::<BuildType>().is_err());
    }

    #[test]
    fn test_compiler_aliases() {
        assert_eq!("Visual Studio".parse::<Compiler>().unwrap(), Compiler::Msvc);
        assert!(Compiler::Msvc.is_msvc());
        assert!(!Compiler::Gcc.is_msvc());
    }

    #[test]
    fn test_detect_defaults_to_release() {
        let settings = Settings::detect();
        assert_eq!(settings.build_type, BuildType::Release);
        assert!(!settings.arch.is_empty());
    }
}
