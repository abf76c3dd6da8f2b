//! Import command
use anyhow::{Context, Result};
use cask_core::Reporter;
use cask_core::import;
use std::path::Path;

use crate::ui::Output;

/// Convert a Homebrew cask into a manifest
pub fn import(source: &Path, dest: Option<&Path>, dry_run: bool, output: &Output) -> Result<()> {
    let (raw, manifest) =
        import::import_file(source).with_context(|| format!("Failed to import {}", source.display()))?;
    let toml = import::to_toml(&raw)?;

    match dest {
        Some(dest) if !dry_run => {
            if dest.exists() {
                anyhow::bail!("Manifest already exists: {}", dest.display());
            }
            std::fs::write(dest, &toml).with_context(|| format!("Failed to write {}", dest.display()))?;
            output.success(&format!(
                "Imported {} into {}",
                manifest.identifier(),
                dest.display()
            ));
        }
        _ => print!("{toml}"),
    }

    if manifest.is_unchecked() {
        output.warning(&format!(
            "{} has no checksum (no_check); consider pinning a sha256",
            manifest.identifier()
        ));
    }

    Ok(())
}
