//! Core data structures for the recipe.
//!
//! This module contains the foundational types used throughout the crate:
//! - The option schema and its canonicalization
//! - Host settings (os, compiler, build type)
//! - Dependency requirements and resolved prefixes
//! - Fixed recipe metadata and typed errors

pub mod dependency;
pub mod errors;
pub mod options;
pub mod recipe;
pub mod settings;

pub use dependency::{DependencyInfo, DependencySet, DependencySpec, Requirements};
pub use errors::RecipeError;
pub use options::{BlasVendor, Linkage, RecipeOptions};
pub use recipe::Recipe;
pub use settings::{BuildType, Compiler, Os, Settings};
