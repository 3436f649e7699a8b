//! ceres-recipe - build and package recipe for Ceres Solver
//!
//! This crate turns a set of recipe options into the CMake configuration
//! for Ceres Solver, fetches and patches the pinned upstream sources,
//! drives CMake through configure, build, test and install, and records
//! what the resulting package provides.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Fixtures for unit tests.
///
/// Only available when compiling tests. Builds dependency prefixes and
/// package trees on disk.
#[cfg(test)]
pub mod test_support;

pub use builder::{derive_definitions, BuildContext, CMakeDefinitions};
pub use core::{
    BlasVendor, DependencySet, DependencySpec, Recipe, RecipeError, RecipeOptions, Requirements,
    Settings,
};
pub use ops::{PackageInfo, RecipeBuild};
