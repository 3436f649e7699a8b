//! CMake-facing build layer.
//!
//! Translates options into CMake cache definitions, discovers backend
//! libraries on disk and drives the CMake phases.

pub mod cmake;
pub mod context;
pub mod definitions;
pub mod discovery;

pub use cmake::{CMakeBuilder, Phase};
pub use context::BuildContext;
pub use definitions::{derive_definitions, CMakeDefinitions, CacheValue};
pub use discovery::{discover_libraries, LibraryQuery};
