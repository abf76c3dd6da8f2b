//! Verify command
use anyhow::{Context, Result};
use cask_core::Reporter;
use cask_core::lifecycle::Pending;
use std::path::Path;

use crate::ui::Output;

/// Verify a downloaded file against the manifest's checksum.
///
/// Fails on a digest mismatch; succeeds with a warning when the manifest
/// opted out of verification.
pub fn verify(path: &Path, file: &Path, version: Option<&str>, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let resolved = Pending::new(&manifest).resolve(version)?;
    let checked = match resolved.verify_file(file) {
        Ok(checked) => checked,
        Err(e) => {
            output.error(&format!("{}: do not install this file", file.display()));
            return Err(e).with_context(|| format!("Verification failed for {}", file.display()));
        }
    };

    let verification = checked.verification();
    if verification.unverified() {
        output.warning(&format!(
            "{} was NOT verified: {} declares sha256 no_check (actual {})",
            file.display(),
            manifest.identifier(),
            verification.actual
        ));
    } else {
        output.success(&format!("{} matches {}", file.display(), verification.actual));
    }

    Ok(())
}
