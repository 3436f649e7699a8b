//! ceres-recipe CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use ceres_recipe::core::RecipeError;
use ceres_recipe::ops::{Step, StepFailed};
use ceres_recipe::util::diagnostic::{emit, suggestions, Diagnostic};
use ceres_recipe::util::shell::ColorChoice;
use ceres_recipe::util::Shell;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::from_flags(cli.quiet, cli.verbose, color);

    if let Err(e) = run(cli, &shell) {
        report(&e, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("ceres_recipe=debug")
    } else if cli.quiet {
        EnvFilter::new("ceres_recipe=error")
    } else {
        EnvFilter::new("ceres_recipe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Source(args) => commands::source::execute(args, shell),
        Commands::Definitions(args) => commands::definitions::execute(args),
        Commands::Options(args) => commands::options::execute(args),
        Commands::Requirements(args) => commands::requirements::execute(args),
        Commands::PackageInfo(args) => commands::package_info::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print the error, as a diagnostic when the recipe raised it itself.
fn report(err: &anyhow::Error, shell: &Shell) {
    if let Some(recipe_err) = err.downcast_ref::<RecipeError>() {
        let mut diag = recipe_err.to_diagnostic();
        if matches!(recipe_err, RecipeError::MissingDependencies { .. }) {
            diag = diag.with_suggestion(suggestions::MISSING_DEPENDENCY);
        }
        emit(&diag, shell.use_color());
        return;
    }

    if let Some(failed) = err.downcast_ref::<StepFailed>() {
        let suggestion = match failed.step {
            Step::Source => suggestions::FETCH_FAILED,
            _ => suggestions::BUILD_FAILED,
        };
        let mut diag = Diagnostic::error(failed.to_string());
        for cause in err.chain().skip(1) {
            diag = diag.with_context(cause.to_string());
        }
        emit(&diag.with_suggestion(suggestion), shell.use_color());
        return;
    }

    eprintln!("error: {:#}", err);
}
