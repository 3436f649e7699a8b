//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// ceres-recipe - build and package Ceres Solver 2.0.0 with CMake
#[derive(Parser)]
#[command(name = "ceres-recipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (streams CMake output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, configure, build, test, install and package
    Build(BuildArgs),

    /// Fetch the pinned upstream sources and apply the patches
    Source(SourceArgs),

    /// Print the CMake definitions the options produce
    Definitions(DefinitionsArgs),

    /// List every option with its default and accepted values
    Options(OptionsArgs),

    /// Show which dependencies the options require
    Requirements(RequirementsArgs),

    /// Collect libraries from an installed package and write its metadata
    PackageInfo(PackageInfoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options, settings and dependency prefixes shared by most commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RecipeArgs {
    /// Set an option, e.g. `-o shared=true` or `-o blas=MKL`
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Point a dependency at its install prefix, e.g. `--dep eigen=/opt/eigen`
    #[arg(long = "dep", value_name = "NAME=PATH")]
    pub deps: Vec<String>,

    /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
    #[arg(long)]
    pub build_type: Option<String>,

    /// Compiler (gcc, clang, apple-clang, msvc)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Project config file (defaults to ./ceres-recipe.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Directory for sources, build tree and package
    #[arg(long, env = "CERES_RECIPE_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Install prefix (defaults to <work-dir>/package/<build-type>)
    #[arg(long)]
    pub package_dir: Option<PathBuf>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// CMake generator, e.g. Ninja
    #[arg(short = 'G', long)]
    pub generator: Option<String>,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Build an existing checkout without fetching or patching
    #[arg(long)]
    pub skip_source: bool,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Project config file (defaults to ./ceres-recipe.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for sources, build tree and package
    #[arg(long, env = "CERES_RECIPE_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct DefinitionsArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RequirementsArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PackageInfoArgs {
    /// Installed package directory
    pub package_dir: PathBuf,

    /// Copy the license from this source tree
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// System libraries consumers must link
    #[arg(long = "system-lib", value_name = "NAME")]
    pub system_libs: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
