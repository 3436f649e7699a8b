//! `ceres-recipe source` command

use anyhow::Result;

use crate::cli::SourceArgs;
use crate::commands::project_config;
use ceres_recipe::core::Recipe;
use ceres_recipe::sources;
use ceres_recipe::util::config::{global_config_path, load_config};
use ceres_recipe::util::{Shell, Status};

pub fn execute(args: SourceArgs, shell: &Shell) -> Result<()> {
    let (project_path, recipe_dir) = project_config(args.config.as_deref())?;
    let config = load_config(global_config_path().as_deref(), &project_path)?;
    let spec = config.source_spec();

    let work_dir = args
        .work_dir
        .or(config.build.work_dir)
        .unwrap_or_else(|| "work".into());
    let work_dir = if work_dir.is_absolute() {
        work_dir
    } else {
        recipe_dir.join(work_dir)
    };
    let source_dir = work_dir.join(Recipe::ceres().source_subfolder());

    let step = shell.step(Status::Fetching, &spec.url);
    let commit = sources::acquire(&spec, &source_dir, &recipe_dir)?;
    step.finish();

    shell.status(
        Status::Finished,
        format!("{} at {}", source_dir.display(), commit),
    );
    println!("{}", commit);

    Ok(())
}
