//! CMake driver for the configure, build, test and install phases.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::builder::context::BuildContext;
use crate::builder::definitions::CMakeDefinitions;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, find_ctest, ProcessBuilder};

/// Oldest CMake the upstream project supports.
pub const MIN_CMAKE_VERSION: semver::Version = semver::Version::new(3, 16, 0);

/// Build phases, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configure,
    Build,
    Test,
    Install,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Build => "build",
            Phase::Test => "test",
            Phase::Install => "install",
        }
    }
}

/// CMake build adapter.
pub struct CMakeBuilder<'a> {
    ctx: &'a BuildContext,
    cmake: PathBuf,
    /// Commands run (or, in dry-run mode, that would have run)
    history: Vec<String>,
}

impl<'a> CMakeBuilder<'a> {
    /// Create a new CMake builder.
    ///
    /// Outside dry-run mode this checks that CMake exists and is recent
    /// enough before any phase runs.
    pub fn new(ctx: &'a BuildContext) -> Result<Self> {
        let cmake = match find_cmake() {
            Some(path) => path,
            None if ctx.dry_run => PathBuf::from("cmake"),
            None => bail!(
                "CMake not found\n\
                 \n\
                 CMake {} or newer is required to build Ceres Solver.\n\
                 Install CMake and ensure it's in your PATH.",
                MIN_CMAKE_VERSION
            ),
        };

        if !ctx.dry_run {
            let version = detect_cmake_version(&cmake)?;
            if version < MIN_CMAKE_VERSION {
                bail!(
                    "CMake {} is too old; version {} or newer is required",
                    version,
                    MIN_CMAKE_VERSION
                );
            }
            tracing::debug!("Using CMake {} at {}", version, cmake.display());
        }

        Ok(CMakeBuilder {
            ctx,
            cmake,
            history: Vec::new(),
        })
    }

    /// Commands issued so far.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Run CMake configuration with the given definitions.
    pub fn configure(&mut self, defs: &CMakeDefinitions) -> Result<()> {
        tracing::info!("Configuring CMake project");
        if !self.ctx.dry_run {
            ensure_dir(&self.ctx.build_dir)?;
        }
        let cmd = self.configure_command(defs);
        self.run(Phase::Configure, cmd)
    }

    /// Run the CMake build.
    pub fn build(&mut self) -> Result<()> {
        tracing::info!("Building CMake project");
        let cmd = self.build_command();
        self.run(Phase::Build, cmd)
    }

    /// Run the upstream test suite through CTest.
    pub fn test(&mut self) -> Result<()> {
        tracing::info!("Running CTest");
        let ctest = match find_ctest() {
            Some(path) => path,
            None if self.ctx.dry_run => PathBuf::from("ctest"),
            None => bail!("ctest not found; it ships with CMake and is needed when tests are enabled"),
        };
        let cmd = self.test_command(ctest);
        self.run(Phase::Test, cmd)
    }

    /// Install into the package directory.
    pub fn install(&mut self) -> Result<()> {
        tracing::info!("Installing into {}", self.ctx.package_dir.display());
        let cmd = self.install_command();
        self.run(Phase::Install, cmd)
    }

    pub fn configure_command(&self, defs: &CMakeDefinitions) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(&self.ctx.source_dir)
            .arg("-B")
            .arg(&self.ctx.build_dir);

        if let Some(ref generator) = self.ctx.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd.arg(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            self.ctx.package_dir.display()
        ))
        .args(defs.to_args())
    }

    pub fn build_command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(&self.ctx.build_dir)
            // Multi-config generators (Visual Studio, Xcode) pick the config here.
            .arg("--config")
            .arg(self.ctx.build_type())
            .arg("--parallel");

        if let Some(jobs) = self.ctx.jobs {
            cmd = cmd.arg(jobs.to_string());
        }
        if self.ctx.verbose {
            cmd = cmd.arg("--verbose");
        }
        cmd
    }

    pub fn test_command(&self, ctest: PathBuf) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(ctest)
            .cwd(&self.ctx.build_dir)
            .arg("-C")
            .arg(self.ctx.build_type())
            .arg("--output-on-failure");

        if let Some(jobs) = self.ctx.jobs {
            cmd = cmd.arg("-j").arg(jobs.to_string());
        }
        cmd
    }

    pub fn install_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--install")
            .arg(&self.ctx.build_dir)
            .arg("--config")
            .arg(self.ctx.build_type())
            .arg("--prefix")
            .arg(&self.ctx.package_dir)
    }

    fn run(&mut self, phase: Phase, cmd: ProcessBuilder) -> Result<()> {
        let command_line = cmd.display_command();
        tracing::debug!("{}: {}", phase.as_str(), command_line);
        self.history.push(command_line);

        if self.ctx.dry_run {
            return Ok(());
        }

        cmd.run(self.ctx.verbose)
            .with_context(|| format!("CMake {} step failed", phase.as_str()))
    }
}

/// Parse the version out of `cmake --version`.
fn detect_cmake_version(cmake: &std::path::Path) -> Result<semver::Version> {
    let output = ProcessBuilder::new(cmake).arg("--version").exec_and_check()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_cmake_version(&stdout)
        .with_context(|| format!("could not parse cmake version from output: {}", stdout))
}

fn parse_cmake_version(stdout: &str) -> Option<semver::Version> {
    let line = stdout.lines().find(|l| l.starts_with("cmake version "))?;
    let version = line.trim_start_matches("cmake version ").trim();
    // Handle versions like "3.20.5-dirty" or "3.28.0-rc1"
    let clean = version.split('-').next().unwrap_or(version);
    clean.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recipe::Recipe;
    use crate::core::settings::Settings;

    fn dry_context() -> BuildContext {
        BuildContext::new("/work", &Recipe::ceres(), Settings::detect())
            .with_jobs(Some(4))
            .with_dry_run(true)
    }

    #[test]
    fn test_parse_cmake_version() {
        let out = "cmake version 3.22.1\n\nCMake suite maintained and supported by Kitware.\n";
        assert_eq!(parse_cmake_version(out), Some(semver::Version::new(3, 22, 1)));
        assert_eq!(
            parse_cmake_version("cmake version 3.28.0-rc1"),
            Some(semver::Version::new(3, 28, 0))
        );
        assert_eq!(parse_cmake_version("ninja 1.11"), None);
    }

    #[test]
    fn test_configure_command_includes_definitions() {
        let ctx = dry_context();
        let builder = CMakeBuilder::new(&ctx).unwrap();

        let mut defs = CMakeDefinitions::new();
        defs.set("LAPACK", true);
        defs.set("BLA_VENDOR", "OpenBLAS");

        let args = builder.configure_command(&defs).get_args().to_vec();
        assert_eq!(args[0], "-S");
        assert!(args.contains(&"-DLAPACK=ON".to_string()));
        assert!(args.contains(&"-DBLA_VENDOR=OpenBLAS".to_string()));
        assert!(args.iter().any(|a| a.starts_with("-DCMAKE_INSTALL_PREFIX=")));
    }

    #[test]
    fn test_phases_run_in_order_in_dry_run() {
        let ctx = dry_context();
        let mut builder = CMakeBuilder::new(&ctx).unwrap();

        builder.configure(&CMakeDefinitions::new()).unwrap();
        builder.build().unwrap();
        builder.test().unwrap();
        builder.install().unwrap();

        let history = builder.history();
        assert_eq!(history.len(), 4);
        assert!(history[0].contains("-S"));
        assert!(history[1].contains("--build"));
        assert!(history[1].ends_with("--parallel 4"));
        assert!(history[2].contains("--output-on-failure"));
        assert!(history[3].contains("--install"));
    }

    #[test]
    fn test_history_records_full_command_line() {
        let ctx = dry_context();
        let mut builder = CMakeBuilder::new(&ctx).unwrap();

        let mut defs = CMakeDefinitions::new();
        defs.set("BLA_VENDOR", "OpenBLAS");
        let expected = builder.configure_command(&defs).display_command();

        builder.configure(&defs).unwrap();
        assert_eq!(builder.history(), &[expected]);
    }
}
