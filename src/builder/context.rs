//! Build context - directories, settings and tool preferences for one run.

use std::path::PathBuf;

use crate::core::recipe::Recipe;
use crate::core::settings::Settings;

/// Everything the build phases need to know about where things go.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root of all recipe output for this run
    pub work_dir: PathBuf,

    /// Upstream checkout (`<work>/ceres-solver-2.0.0`)
    pub source_dir: PathBuf,

    /// CMake binary directory
    pub build_dir: PathBuf,

    /// Install prefix; becomes the package
    pub package_dir: PathBuf,

    pub settings: Settings,

    /// Number of parallel jobs (None = let the generator decide)
    pub jobs: Option<usize>,

    /// CMake generator (None = CMake's default)
    pub generator: Option<String>,

    /// Stream tool output instead of capturing it
    pub verbose: bool,

    /// Record commands without running them
    pub dry_run: bool,
}

impl BuildContext {
    /// Standard layout under `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>, recipe: &Recipe, settings: Settings) -> Self {
        let work_dir = work_dir.into();
        let profile = settings.build_type.as_cmake().to_lowercase();

        BuildContext {
            source_dir: work_dir.join(recipe.source_subfolder()),
            build_dir: work_dir.join("build").join(&profile),
            package_dir: work_dir.join("package").join(&profile),
            work_dir,
            settings,
            jobs: None,
            generator: None,
            verbose: false,
            dry_run: false,
        }
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Install into a different prefix.
    pub fn with_package_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.package_dir = dir.into();
        self
    }

    pub fn build_type(&self) -> &'static str {
        self.settings.build_type.as_cmake()
    }
}
