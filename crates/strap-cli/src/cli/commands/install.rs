//! Install command: run the whole pipeline with progress on stdout.

use anyhow::Result;
use strap_core::config::StrapConfig;
use strap_core::error::Stage;
use strap_core::path_env::{self, Registration, Scope};
use strap_core::pipeline::{InstallPlan, Installer, StageEvent};
use strap_core::platform;
use strap_core::transport::Transport;

use super::release_source;

pub fn run_install(cfg: &StrapConfig, skip_path: bool) -> Result<()> {
    let mut plan = InstallPlan::from_config(cfg)?;
    plan.register_path = !skip_path;

    if plan.scope == Scope::Machine && !platform::is_elevated() {
        tracing::warn!("machine scope requested without elevated rights");
        println!("note: machine scope usually needs administrator/root rights");
    }

    let source = release_source(cfg);
    let transport = Transport::from_config(&cfg.timeouts, &cfg.fallback);
    let store = path_env::host_store(&cfg.binary);
    let installer = Installer::new(&source, &transport, store.as_ref());

    println!(
        "Installing {} ({}) into {}",
        cfg.binary,
        plan.query.version,
        plan.install_dir.display()
    );
    let report = installer.run(&plan, &mut |event| print_event(event, &plan))?;

    println!(
        "Installed {} {} -> {}",
        cfg.binary,
        report.tag,
        report.executable.display()
    );
    Ok(())
}

fn print_event(event: &StageEvent, plan: &InstallPlan) {
    match event {
        StageEvent::Started(stage) => {
            tracing::info!(stage = %stage, "stage started");
            if *stage == Stage::Resolve {
                println!("Resolving {} release...", plan.query.version);
            }
        }
        StageEvent::Resolved(d) => println!("  {} ({})", d.file_name, d.tag),
        StageEvent::Downloaded { path, outcome } => {
            if outcome.failed_attempts > 0 {
                println!("  downloaded {} bytes via fallback ({})", outcome.bytes, outcome.strategy);
            } else {
                println!("  downloaded {} bytes to {}", outcome.bytes, path.display());
            }
        }
        StageEvent::Extracted { executable } => println!("  extracted {}", executable.display()),
        StageEvent::Verified { version } => println!("  verified: {version}"),
        StageEvent::Registered { registration, .. } => print_registration(*registration, plan),
        StageEvent::PathSkipped => println!("  PATH left unchanged (--skip-path)"),
    }
}

pub(super) fn print_registration(registration: Registration, plan: &InstallPlan) {
    match registration {
        Registration::Added => {
            println!(
                "  added {} to the {} PATH",
                plan.install_dir.display(),
                plan.scope
            );
            println!("  Restart your terminal (or log in again) for the new PATH to take effect.");
        }
        Registration::AlreadyPresent => println!(
            "  {} is already on the {} PATH",
            plan.install_dir.display(),
            plan.scope
        ),
    }
}
