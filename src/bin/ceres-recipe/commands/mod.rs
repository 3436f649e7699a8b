//! Command implementations

pub mod build;
pub mod completions;
pub mod definitions;
pub mod options;
pub mod package_info;
pub mod requirements;
pub mod source;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::RecipeArgs;
use ceres_recipe::core::{
    BuildType, Compiler, DependencySet, DependencySpec, RecipeOptions, Requirements, Settings,
};
use ceres_recipe::util::config::{global_config_path, load_config, PROJECT_CONFIG_NAME};
use ceres_recipe::util::Config;

/// Configuration merged from the config files and the command line.
pub struct Loaded {
    pub config: Config,
    pub options: RecipeOptions,
    pub settings: Settings,
    pub dependencies: BTreeMap<String, DependencySpec>,
    /// Directory of the project config; base for relative paths
    pub recipe_dir: PathBuf,
}

impl Loaded {
    pub fn requirements(&self) -> Requirements {
        Requirements::for_options(&self.options)
    }

    pub fn resolve_dependencies(&self) -> Result<DependencySet> {
        Ok(DependencySet::resolve(&self.requirements(), &self.dependencies)?)
    }

    /// CLI value, else `[build] work_dir`, else `<recipe dir>/work`.
    pub fn work_dir(&self, cli: Option<PathBuf>) -> PathBuf {
        let dir = cli
            .or_else(|| self.config.build.work_dir.clone())
            .unwrap_or_else(|| PathBuf::from("work"));
        if dir.is_absolute() {
            dir
        } else {
            self.recipe_dir.join(dir)
        }
    }
}

/// Project config path and the directory it lives in.
pub fn project_config(explicit: Option<&Path>) -> Result<(PathBuf, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let path = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.join(PROJECT_CONFIG_NAME),
    };
    let dir = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
    Ok((path, dir))
}

/// Load config files and apply the command-line overrides on top.
///
/// Precedence: command line, then project config, then global config.
pub fn load(args: &RecipeArgs) -> Result<Loaded> {
    let (project_path, recipe_dir) = project_config(args.config.as_deref())?;
    let config = load_config(global_config_path().as_deref(), &project_path)?;

    let mut settings = config.resolve_settings()?;
    if let Some(ref build_type) = args.build_type {
        settings.build_type = build_type
            .parse::<BuildType>()
            .map_err(|e| anyhow::anyhow!("invalid --build-type: {}", e))?;
    }
    if let Some(ref compiler) = args.compiler {
        settings.compiler = compiler
            .parse::<Compiler>()
            .map_err(|e| anyhow::anyhow!("invalid --compiler: {}", e))?;
    }

    let mut options = RecipeOptions::default();
    config.apply_options(&mut options)?;
    for assignment in &args.options {
        options.apply_assignment(assignment)?;
    }
    let options = options.configure(&settings);

    let mut dependencies = config.dependencies.clone();
    for dep in &args.deps {
        let (name, path) = dep
            .split_once('=')
            .with_context(|| format!("invalid --dep `{}`; expected NAME=PATH", dep))?;
        let root = PathBuf::from(path.trim());
        let root = if root.is_absolute() {
            root
        } else {
            recipe_dir.join(root)
        };
        dependencies
            .entry(name.trim().to_string())
            .or_default()
            .merge(DependencySpec::from_root(root));
    }

    tracing::debug!(
        "Settings: {} {} {} {}",
        settings.os,
        settings.compiler,
        settings.build_type,
        settings.arch
    );

    Ok(Loaded {
        config,
        options,
        settings,
        dependencies,
        recipe_dir,
    })
}
