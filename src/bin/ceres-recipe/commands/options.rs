//! `ceres-recipe options` command

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::OptionsArgs;
use crate::commands::load;
use ceres_recipe::core::RecipeOptions;

#[derive(Serialize)]
struct OptionRow {
    name: &'static str,
    value: Option<String>,
    default: String,
    accepted: String,
}

pub fn execute(args: OptionsArgs) -> Result<()> {
    let loaded = load(&args.recipe)?;

    let rows: Vec<OptionRow> = RecipeOptions::describe()
        .into_iter()
        .map(|info| OptionRow {
            name: info.name,
            value: loaded.options.get(info.name),
            default: info.default,
            accepted: info.accepted,
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("failed to serialize options")?;
        println!("{}", json);
        return Ok(());
    }

    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in &rows {
        let value = row.value.as_deref().unwrap_or("None");
        let marker = if value == row.default { " " } else { "*" };
        println!(
            "{}{:<width$}  {:<14} (default: {}; accepts: {})",
            marker,
            row.name,
            value,
            row.default,
            row.accepted,
            width = width
        );
    }

    Ok(())
}
