//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.ceres-recipe/config.toml` - User-wide defaults
//! - Project: `ceres-recipe.toml` in the working directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both. Relative dependency roots resolve
//! against the directory of the file that names them.
//!
//! ```toml
//! [options]
//! shared = true
//! blas = "MKL"
//!
//! [settings]
//! build_type = "RelWithDebInfo"
//!
//! [build]
//! jobs = 8
//! generator = "Ninja"
//!
//! [dependencies.eigen]
//! root = "/opt/eigen"
//! include_dirs = ["include/eigen3"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::dependency::DependencySpec;
use crate::core::errors::RecipeError;
use crate::core::options::RecipeOptions;
use crate::core::settings::{BuildType, Compiler, Os, Settings};
use crate::sources::SourceSpec;

/// File name of the project configuration.
pub const PROJECT_CONFIG_NAME: &str = "ceres-recipe.toml";

/// Recipe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Option overrides (`name = value`)
    pub options: BTreeMap<String, toml::Value>,

    /// Settings overrides
    pub settings: SettingsConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Upstream source and patches
    pub source: Option<SourceSpec>,

    /// Dependency prefixes by name
    pub dependencies: BTreeMap<String, DependencySpec>,
}

/// Settings overrides; anything unset is detected from the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub os: Option<String>,
    pub compiler: Option<String>,
    pub build_type: Option<String>,
    pub arch: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// CMake generator (e.g. "Ninja")
    pub generator: Option<String>,

    /// Directory for sources, build tree and package
    pub work_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.resolve_dependency_roots(dir);
        }
        Ok(config)
    }

    /// Make relative `[dependencies.<name>] root` values absolute against
    /// `base`, the directory of the file they were read from.
    pub fn resolve_dependency_roots(&mut self, base: &Path) {
        for spec in self.dependencies.values_mut() {
            if let Some(root) = spec.root.as_mut() {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        for (key, value) in other.options {
            self.options
                .insert(RecipeOptions::canonical_key(&key).to_string(), value);
        }

        if other.settings.os.is_some() {
            self.settings.os = other.settings.os;
        }
        if other.settings.compiler.is_some() {
            self.settings.compiler = other.settings.compiler;
        }
        if other.settings.build_type.is_some() {
            self.settings.build_type = other.settings.build_type;
        }
        if other.settings.arch.is_some() {
            self.settings.arch = other.settings.arch;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.work_dir.is_some() {
            self.build.work_dir = other.build.work_dir;
        }

        if other.source.is_some() {
            self.source = other.source;
        }

        for (name, spec) in other.dependencies {
            self.dependencies.entry(name).or_default().merge(spec);
        }
    }

    /// Apply the `[options]` table on top of `options`.
    pub fn apply_options(&self, options: &mut RecipeOptions) -> Result<(), RecipeError> {
        for (key, value) in &self.options {
            options.set(key, &option_text(value))?;
        }
        Ok(())
    }

    /// Host settings with the `[settings]` overrides applied.
    pub fn resolve_settings(&self) -> Result<Settings> {
        let mut settings = Settings::detect();
        let invalid = |e: String| anyhow::anyhow!("invalid [settings] entry: {}", e);

        if let Some(ref os) = self.settings.os {
            settings.os = os.parse::<Os>().map_err(invalid)?;
        }
        if let Some(ref compiler) = self.settings.compiler {
            settings.compiler = compiler.parse::<Compiler>().map_err(invalid)?;
        }
        if let Some(ref build_type) = self.settings.build_type {
            settings.build_type = build_type.parse::<BuildType>().map_err(invalid)?;
        }
        if let Some(ref arch) = self.settings.arch {
            settings.arch = arch.clone();
        }

        Ok(settings)
    }

    /// Source spec, falling back to the pinned upstream.
    pub fn source_spec(&self) -> SourceSpec {
        self.source.clone().unwrap_or_default()
    }
}

/// TOML booleans and numbers are accepted as well as strings.
fn option_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (ceres-recipe.toml)
/// 2. Global config (~/.ceres-recipe/config.toml)
/// 3. Defaults
///
/// An unreadable project config is an error; the global one only warns.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load(project_path)?);
    }

    Ok(config)
}

/// Get the global config directory (~/.ceres-recipe).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ceres-recipe"))
}

/// Get the global config path (~/.ceres-recipe/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::BlasVendor;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.options.is_empty());
        assert!(config.build.jobs.is_none());
        assert!(config.source.is_none());
        assert_eq!(config.source_spec(), SourceSpec::default());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(PROJECT_CONFIG_NAME);

        std::fs::write(
            &config_path,
            r#"
[options]
shared = true
blas = "MKL"
eigen_max_align_bytes = 32

[settings]
build_type = "Debug"

[build]
jobs = 8
generator = "Ninja"

[dependencies.openblas]
root = "/opt/openblas"
system_libs = ["pthread", "m"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));

        let mut opts = RecipeOptions::default();
        config.apply_options(&mut opts).unwrap();
        assert!(opts.shared);
        assert_eq!(opts.blas, BlasVendor::MKL);
        assert_eq!(opts.eigen_max_align_bytes, Some(32));

        let settings = config.resolve_settings().unwrap();
        assert_eq!(settings.build_type, BuildType::Debug);

        let openblas = &config.dependencies["openblas"];
        assert_eq!(openblas.root, Some(PathBuf::from("/opt/openblas")));
        assert_eq!(openblas.system_libs, vec!["pthread", "m"]);
    }

    #[test]
    fn test_invalid_option_in_config() {
        let mut config = Config::default();
        config
            .options
            .insert("shared".to_string(), toml::Value::String("sometimes".to_string()));

        let mut opts = RecipeOptions::default();
        assert!(config.apply_options(&mut opts).is_err());
    }

    #[test]
    fn test_invalid_settings_entry() {
        let mut config = Config::default();
        config.settings.build_type = Some("Fastest".to_string());
        let err = config.resolve_settings().unwrap_err();
        assert!(err.to_string().contains("invalid [settings] entry"));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[options]
shared = true
tests = true

[build]
jobs = 2

[dependencies.eigen]
root = "/usr"
include_dirs = ["include/eigen3"]
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[options]
shared = false

[dependencies.eigen]
root = "/opt/eigen"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path).unwrap();

        let mut opts = RecipeOptions::default();
        config.apply_options(&mut opts).unwrap();
        assert!(!opts.shared);
        assert!(opts.tests);
        assert_eq!(config.build.jobs, Some(2));

        let eigen = &config.dependencies["eigen"];
        assert_eq!(eigen.root, Some(PathBuf::from("/opt/eigen")));
        assert_eq!(eigen.include_dirs, vec![PathBuf::from("include/eigen3")]);
    }

    #[test]
    fn test_project_alias_overrides_global_option() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");
        std::fs::write(&global_path, "[options]\nacceleratesparse = true\n").unwrap();
        std::fs::write(&project_path, "[options]\nacceleratesparese = false\n").unwrap();

        let config = load_config(Some(&global_path), &project_path).unwrap();
        assert_eq!(config.options.len(), 1);

        let mut opts = RecipeOptions::default();
        config.apply_options(&mut opts).unwrap();
        assert!(!opts.acceleratesparse);
    }

    #[test]
    fn test_relative_dependency_root_resolves_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        std::fs::create_dir_all(&project_dir).unwrap();
        let project_path = project_dir.join(PROJECT_CONFIG_NAME);
        std::fs::write(
            &project_path,
            r#"
[dependencies.eigen]
root = "deps/eigen"

[dependencies.glog]
root = "/opt/glog"
"#,
        )
        .unwrap();

        let config = load_config(None, &project_path).unwrap();
        assert_eq!(
            config.dependencies["eigen"].root,
            Some(project_dir.join("deps/eigen"))
        );
        assert_eq!(
            config.dependencies["glog"].root,
            Some(PathBuf::from("/opt/glog"))
        );
    }

    #[test]
    fn test_broken_project_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let project_path = tmp.path().join(PROJECT_CONFIG_NAME);
        std::fs::write(&project_path, "[options\nshared = ").unwrap();

        assert!(load_config(None, &project_path).is_err());
    }
}
