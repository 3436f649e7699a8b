//! High-level operations.
//!
//! This module contains the implementation of the recipe commands.

pub mod package_info;
pub mod recipe_build;

pub use package_info::{collect_libs, copy_license, finalize, lib_dirs, PackageInfo};
pub use recipe_build::{BuildOutcome, RecipeBuild, Step, StepFailed};
