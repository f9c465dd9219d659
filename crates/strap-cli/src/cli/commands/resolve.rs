//! Resolve command: show the asset an install would fetch.

use anyhow::Result;
use strap_core::config::StrapConfig;
use strap_core::error::InstallError;
use strap_core::pipeline::InstallPlan;
use strap_core::release;

use super::release_source;

pub fn run_resolve(cfg: &StrapConfig) -> Result<()> {
    let plan = InstallPlan::from_config(cfg)?;
    let descriptor =
        release::resolve_asset(&release_source(cfg), &plan.query).map_err(InstallError::from)?;
    println!("tag:   {}", descriptor.tag);
    println!("asset: {}", descriptor.file_name);
    println!("url:   {}", descriptor.url);
    Ok(())
}
