//! `ceres-recipe definitions` command
//!
//! Prints the CMake cache definitions without running CMake.

use anyhow::{Context, Result};

use crate::cli::DefinitionsArgs;
use crate::commands::load;
use ceres_recipe::builder::derive_definitions;

pub fn execute(args: DefinitionsArgs) -> Result<()> {
    let loaded = load(&args.recipe)?;
    let deps = loaded.resolve_dependencies()?;
    let defs = derive_definitions(&loaded.options, &loaded.settings, &deps)?;

    if args.json {
        let json = serde_json::to_string_pretty(&defs).context("failed to serialize definitions")?;
        println!("{}", json);
    } else {
        for (key, value) in defs.iter() {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}
