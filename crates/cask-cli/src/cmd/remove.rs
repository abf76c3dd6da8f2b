//! Uninstall and zap commands
use anyhow::{Context, Result};
use cask_core::Reporter;
use cask_core::lifecycle::PurgePlan;
use std::path::{Path, PathBuf};

use crate::ui::Output;

fn apps_dir(appdir: Option<&Path>) -> PathBuf {
    appdir.map_or_else(cask_core::applications_dir, Path::to_path_buf)
}

fn run(plan: &PurgePlan, action: &str, dry_run: bool, output: &Output) -> Result<()> {
    let report = plan
        .execute(dry_run, output)
        .with_context(|| format!("Failed to {action} {}", plan.identifier))?;

    if report.removed.is_empty() {
        output.info(&format!("Nothing to {action} for {}", plan.identifier));
    } else if dry_run {
        output.info(&format!(
            "Dry run: {} path(s) would be removed for {}",
            report.removed.len(),
            plan.identifier
        ));
    } else {
        output.success(&format!(
            "Removed {} path(s) for {} ({} already absent)",
            report.removed.len(),
            plan.identifier,
            report.absent.len()
        ));
    }
    Ok(())
}

/// Remove the installed application bundle only
pub fn uninstall(path: &Path, appdir: Option<&Path>, dry_run: bool, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let plan = PurgePlan::uninstall(&manifest, &apps_dir(appdir));
    run(&plan, "uninstall", dry_run, output)
}

/// Remove the application bundle and every zap path
pub fn zap(path: &Path, appdir: Option<&Path>, dry_run: bool, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let plan = PurgePlan::zap_for_user(&manifest, &apps_dir(appdir))?;
    run(&plan, "zap", dry_run, output)
}
