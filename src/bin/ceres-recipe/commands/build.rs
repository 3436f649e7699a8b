//! `ceres-recipe build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::load;
use ceres_recipe::builder::BuildContext;
use ceres_recipe::core::Recipe;
use ceres_recipe::ops::RecipeBuild;
use ceres_recipe::util::Shell;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let loaded = load(&args.recipe)?;
    let deps = loaded.resolve_dependencies()?;

    let mut ctx = BuildContext::new(
        loaded.work_dir(args.work_dir),
        &Recipe::ceres(),
        loaded.settings.clone(),
    )
    // Jobs and generator: CLI > config
    .with_jobs(args.jobs.or(loaded.config.build.jobs))
    .with_generator(args.generator.or_else(|| loaded.config.build.generator.clone()))
    .with_verbose(shell.is_verbose())
    .with_dry_run(args.dry_run);
    if let Some(dir) = args.package_dir {
        ctx = ctx.with_package_dir(dir);
    }

    let build = RecipeBuild::new(loaded.options.clone(), deps, ctx)
        .with_source(loaded.config.source_spec(), &loaded.recipe_dir)
        .with_skip_source(args.skip_source);

    let outcome = build.run(shell)?;

    if args.dry_run {
        for command in &outcome.commands {
            println!("{}", command);
        }
    }
    if let Some(commit) = outcome.commit {
        tracing::debug!("Built from commit {}", commit);
    }

    Ok(())
}
