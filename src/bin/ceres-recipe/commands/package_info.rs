//! `ceres-recipe package-info` command
//!
//! Finalizes an already installed package directory.

use anyhow::{Context, Result};

use crate::cli::PackageInfoArgs;
use ceres_recipe::core::Recipe;
use ceres_recipe::ops::{copy_license, finalize};
use ceres_recipe::util::{Shell, Status};

pub fn execute(args: PackageInfoArgs, shell: &Shell) -> Result<()> {
    if !args.package_dir.is_dir() {
        anyhow::bail!("package directory {} does not exist", args.package_dir.display());
    }

    if let Some(ref source_dir) = args.source_dir {
        if copy_license(source_dir, &args.package_dir)?.is_empty() {
            shell.warn(format!("no license file in {}", source_dir.display()));
        }
    }

    shell.status(Status::Packaging, args.package_dir.display());
    let info = finalize(&Recipe::ceres(), &args.package_dir, &args.system_libs)?;

    let json = serde_json::to_string_pretty(&info).context("failed to serialize package info")?;
    println!("{}", json);

    Ok(())
}
