//! Implementation of `ceres-recipe build`.
//!
//! Runs the whole recipe in order: source, definitions, configure, build,
//! test, install, package. Any failure aborts the run.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use thiserror::Error;

use crate::builder::{derive_definitions, BuildContext, CMakeBuilder, CMakeDefinitions};
use crate::core::dependency::DependencySet;
use crate::core::options::{Linkage, RecipeOptions};
use crate::core::recipe::Recipe;
use crate::ops::package_info::{copy_license, finalize, PackageInfo};
use crate::sources::{self, SourceSpec};
use crate::util::shell::{format_duration, Shell, Status};

/// Pipeline steps, as reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Source,
    Configure,
    Build,
    Test,
    Install,
    Package,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::Source => "source",
            Step::Configure => "configure",
            Step::Build => "build",
            Step::Test => "test",
            Step::Install => "install",
            Step::Package => "package",
        };
        f.write_str(s)
    }
}

/// Context attached to the error of a failed step.
#[derive(Debug, Error)]
#[error("{step} step failed")]
pub struct StepFailed {
    pub step: Step,
}

fn failed(step: Step) -> StepFailed {
    StepFailed { step }
}

/// Result of a recipe run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Checked-out commit, when the source step ran
    pub commit: Option<String>,
    /// CMake/CTest commands issued (or planned, in dry-run mode)
    pub commands: Vec<String>,
    /// Package metadata, unless in dry-run mode
    pub package: Option<PackageInfo>,
}

/// One build of the recipe.
pub struct RecipeBuild {
    recipe: Recipe,
    options: RecipeOptions,
    deps: DependencySet,
    ctx: BuildContext,
    source: SourceSpec,
    /// Base for relative patch paths
    recipe_dir: PathBuf,
    skip_source: bool,
    definitions: OnceLock<CMakeDefinitions>,
}

impl RecipeBuild {
    /// Options are configured against the context's settings here.
    pub fn new(options: RecipeOptions, deps: DependencySet, ctx: BuildContext) -> Self {
        RecipeBuild {
            recipe: Recipe::ceres(),
            options: options.configure(&ctx.settings),
            deps,
            ctx,
            source: SourceSpec::default(),
            recipe_dir: sources::default_recipe_dir(),
            skip_source: false,
            definitions: OnceLock::new(),
        }
    }

    pub fn with_source(mut self, source: SourceSpec, recipe_dir: impl Into<PathBuf>) -> Self {
        self.source = source;
        self.recipe_dir = recipe_dir.into();
        self
    }

    /// Build from an existing checkout without fetching or patching.
    pub fn with_skip_source(mut self, skip: bool) -> Self {
        self.skip_source = skip;
        self
    }

    pub fn options(&self) -> &RecipeOptions {
        &self.options
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// The CMake definitions for this build, derived on first use.
    pub fn definitions(&self) -> Result<&CMakeDefinitions> {
        if let Some(defs) = self.definitions.get() {
            return Ok(defs);
        }
        let defs = derive_definitions(&self.options, &self.ctx.settings, &self.deps)?;
        Ok(self.definitions.get_or_init(|| defs))
    }

    /// Fetch and patch the sources.
    pub fn source(&self, shell: &Shell) -> Result<Option<String>> {
        if self.skip_source {
            if !self.ctx.dry_run && !self.ctx.source_dir.is_dir() {
                bail!(
                    "source directory {} does not exist; run without --skip-source first",
                    self.ctx.source_dir.display()
                );
            }
            shell.status(Status::Skipped, "source step (--skip-source)");
            return Ok(None);
        }

        if self.ctx.dry_run {
            shell.status(
                Status::Skipped,
                format!("fetching {} (dry run)", self.source.url),
            );
            return Ok(None);
        }

        let step = shell.step(
            Status::Fetching,
            format!("{} @ {}", self.source.url, short_rev(&self.source.rev)),
        );
        let commit = sources::acquire(&self.source, &self.ctx.source_dir, &self.recipe_dir)?;
        step.finish();

        if !self.source.patches.is_empty() {
            shell.status(
                Status::Patching,
                format!("{} patch(es) applied", self.source.patches.len()),
            );
        }
        Ok(Some(commit))
    }

    /// Run every step.
    pub fn run(&self, shell: &Shell) -> Result<BuildOutcome> {
        let commit = self.source(shell).context(failed(Step::Source))?;

        // Backend discovery must fail before any external tool runs.
        let defs = self.definitions()?;
        tracing::debug!("Definitions fingerprint {}", defs.fingerprint());

        let mut cmake = CMakeBuilder::new(&self.ctx)?;

        let step = shell.step(Status::Configuring, self.recipe.source_subfolder());
        cmake.configure(defs).context(failed(Step::Configure))?;
        step.finish();

        let step = shell.step(
            Status::Building,
            format!("{} v{} ({})", self.recipe.name, self.recipe.version, self.ctx.build_type()),
        );
        cmake.build().context(failed(Step::Build))?;
        let elapsed = step.finish();
        tracing::info!("Build took {}", format_duration(elapsed));

        if self.options.tests {
            let step = shell.step(Status::Testing, "upstream test suite");
            cmake.test().context(failed(Step::Test))?;
            step.finish();
        }

        let step = shell.step(Status::Installing, self.ctx.package_dir.display());
        cmake.install().context(failed(Step::Install))?;
        step.finish();

        let commands = cmake.history().to_vec();

        if self.ctx.dry_run {
            shell.status(Status::Finished, "dry run, nothing was executed");
            return Ok(BuildOutcome {
                commit,
                commands,
                package: None,
            });
        }

        shell.status(Status::Packaging, self.ctx.package_dir.display());
        let info = self.package(shell).context(failed(Step::Package))?;
        shell.status(
            Status::Finished,
            format!("{} ({})", info.libs.join(", "), self.ctx.package_dir.display()),
        );

        Ok(BuildOutcome {
            commit,
            commands,
            package: Some(info),
        })
    }

    fn package(&self, shell: &Shell) -> Result<PackageInfo> {
        if copy_license(&self.ctx.source_dir, &self.ctx.package_dir)?.is_empty() {
            shell.warn(format!("no license file in {}", self.ctx.source_dir.display()));
        }
        finalize(&self.recipe, &self.ctx.package_dir, &self.link_system_libs())
    }

    /// System libraries consumers must add; only static builds need them.
    fn link_system_libs(&self) -> Vec<String> {
        if self.options.linkage() == Linkage::Shared {
            return Vec::new();
        }
        let mut libs: Vec<String> = Vec::new();
        for lib in self.deps.iter().flat_map(|d| d.system_libs.iter()) {
            if !libs.contains(lib) {
                libs.push(lib.clone());
            }
        }
        libs
    }
}

fn short_rev(rev: &str) -> &str {
    rev.get(..10).unwrap_or(rev)
}
