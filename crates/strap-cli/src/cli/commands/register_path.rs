//! Register-path command: add the install directory to PATH on its own.

use anyhow::Result;
use strap_core::config::StrapConfig;
use strap_core::error::InstallError;
use strap_core::path_env;
use strap_core::pipeline::InstallPlan;

use super::install::print_registration;

pub fn run_register_path(cfg: &StrapConfig) -> Result<()> {
    let plan = InstallPlan::from_config(cfg)?;
    let store = path_env::host_store(&cfg.binary);
    let registration = path_env::register_path(store.as_ref(), &plan.install_dir, plan.scope)
        .map_err(InstallError::from)?;
    print_registration(registration, &plan);
    Ok(())
}
