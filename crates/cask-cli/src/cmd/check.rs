//! Check command
use anyhow::Result;
use cask_core::Reporter;
use cask_core::interpolate::render_current;
use std::path::Path;

use crate::ui::Output;

/// Validate a manifest and print a summary
pub fn check(path: &Path, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let resolved = render_current(&manifest)?;

    output.success(&format!("Manifest is valid: {}", path.display()));
    output.field("Token", manifest.identifier());
    output.field("Name", manifest.display_name());
    output.field("Version", manifest.version());
    output.field("URL", &resolved.download_url);
    output.field("App", manifest.install_artifact());
    if let Some(bundle_id) = manifest.bundle_id() {
        output.field("Bundle ID", bundle_id);
    }
    output.field("SHA256", manifest.checksum());
    output.field("Zap paths", manifest.cleanup_paths().len());

    if manifest.is_unchecked() {
        output.warning(&format!(
            "{} opts out of checksum verification (sha256 = \"no_check\"); downloads will not be verified",
            manifest.identifier()
        ));
    }

    Ok(())
}
