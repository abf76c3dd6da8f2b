//! Resolve command
use anyhow::Result;
use cask_core::Reporter;
use cask_core::lifecycle::Pending;
use std::path::Path;

use crate::ui::Output;

/// Render the download URL for a version
pub fn resolve(path: &Path, version: Option<&str>, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let resolved = Pending::new(&manifest).resolve(version)?;
    let artifact = resolved.artifact();

    // The URL alone on stdout, so it can be piped into a downloader;
    // everything else goes to stderr.
    println!("{}", artifact.download_url);

    output.detail("Version", &artifact.version);
    output.detail("App", &artifact.install_artifact_name);
    if let Some(cache) = cask_core::cache_path() {
        output.detail("Cache", cache.join(artifact.file_name()).display());
    }
    if manifest.is_unchecked() {
        output.warning("integrity not verified: manifest declares sha256 no_check");
    }

    Ok(())
}
