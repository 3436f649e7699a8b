//! Recipe error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// User-facing failures raised by the recipe itself.
///
/// Everything else (network, compiler, cmake) is propagated as-is through
/// `anyhow` with the external tool's output attached.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum RecipeError {
    #[error("could not find any {backend} libraries")]
    #[diagnostic(
        code(ceres_recipe::configure::backend_not_found),
        help("Install the backend or point the dependency at its prefix; `blas_libraries` overrides do not bypass this check")
    )]
    BackendNotFound {
        backend: String,
        searched: Vec<PathBuf>,
        extensions: Vec<String>,
    },

    #[error("no libraries produced in {}", package_dir.display())]
    #[diagnostic(
        code(ceres_recipe::package::no_libraries),
        help("Check the install step output; the package directory must contain lib/ or lib64/ artifacts")
    )]
    NoLibrariesProduced {
        package_dir: PathBuf,
        lib_dirs: Vec<PathBuf>,
    },

    #[error("missing required dependencies: {}", missing.join(", "))]
    #[diagnostic(code(ceres_recipe::resolve::missing_dependencies))]
    MissingDependencies { missing: Vec<String> },

    #[error("invalid value `{value}` for option `{option}`")]
    #[diagnostic(code(ceres_recipe::options::invalid_value))]
    InvalidOption {
        option: String,
        value: String,
        accepted: Vec<String>,
    },

    #[error("unknown option `{option}`")]
    #[diagnostic(code(ceres_recipe::options::unknown))]
    UnknownOption { option: String, known: Vec<String> },
}

impl RecipeError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RecipeError::BackendNotFound {
                backend,
                searched,
                extensions,
            } => {
                let mut diag =
                    Diagnostic::error(format!("could not find any {} libraries", backend));

                if searched.is_empty() {
                    diag = diag.with_context("the dependency declares no library directories");
                }
                for dir in searched {
                    diag = diag.with_context(format!("searched {}", dir.display()));
                }
                diag = diag.with_context(format!("accepted extensions: {}", extensions.join(" ")));

                diag.with_suggestion(format!(
                    "Set `[dependencies.{}] root` to the prefix the library was installed into",
                    backend
                ))
                .with_suggestion("Or select another vendor with `-o blas=...`")
                .with_suggestion("Toggle `-o shared=...` if only the other linkage is installed")
            }

            RecipeError::NoLibrariesProduced {
                package_dir,
                lib_dirs,
            } => {
                let mut diag = Diagnostic::error("no libraries collected from the package")
                    .with_location(package_dir);
                for dir in lib_dirs {
                    diag = diag.with_context(format!("looked in {}", dir.display()));
                }
                diag.with_suggestion("Re-run the build with `--verbose` and inspect the install step")
            }

            RecipeError::MissingDependencies { missing } => {
                let mut diag = Diagnostic::error("required dependencies are not configured");
                for name in missing {
                    diag = diag.with_context(format!("`{}` has no resolved prefix", name));
                }
                diag.with_suggestion(format!(
                    "Add `[dependencies.{}] root = \"...\"` to ceres-recipe.toml",
                    missing.first().map(String::as_str).unwrap_or("<name>")
                ))
                .with_suggestion("Or pass `--dep <name>=<prefix>` on the command line")
            }

            RecipeError::InvalidOption {
                option,
                value,
                accepted,
            } => Diagnostic::error(format!("invalid value `{}` for option `{}`", value, option))
                .with_context(format!("accepted values: {}", accepted.join(", ")))
                .with_suggestion("Run `ceres-recipe options` to list every option"),

            RecipeError::UnknownOption { option, known } => {
                Diagnostic::error(format!("unknown option `{}`", option))
                    .with_context(format!("known options: {}", known.join(", ")))
            }
        }
    }
}
