//! `ceres-recipe requirements` command

use anyhow::{Context, Result};

use crate::cli::RequirementsArgs;
use crate::commands::load;

pub fn execute(args: RequirementsArgs) -> Result<()> {
    let loaded = load(&args.recipe)?;
    let reqs = loaded.requirements();

    if args.json {
        let json = serde_json::to_string_pretty(&reqs).context("failed to serialize requirements")?;
        println!("{}", json);
        return Ok(());
    }

    for name in reqs.names() {
        let location = loaded
            .dependencies
            .get(*name)
            .and_then(|spec| spec.root.as_ref())
            .map(|root| root.display().to_string())
            .unwrap_or_else(|| "(not configured)".to_string());
        println!("{:<10} {}", name, location);
    }
    for opt in reqs.downstream_options() {
        println!("{}:{}={}", opt.dependency, opt.option, opt.value);
    }

    Ok(())
}
