//! Livecheck command
use anyhow::Result;
use cask_core::Reporter;
use cask_core::livecheck;
use std::path::Path;

use crate::ui::Output;

/// Show where new versions are discovered, optionally comparing a tag
pub fn livecheck(path: &Path, latest: Option<&str>, output: &Output) -> Result<()> {
    let manifest = super::load(path)?;
    let Some(descriptor) = manifest.livecheck() else {
        output.info(&format!("{} has no livecheck block", manifest.identifier()));
        return Ok(());
    };

    output.field("Strategy", format!("{:?}", descriptor.strategy));
    if let Some(source) = livecheck::source_url(&manifest) {
        output.field("Source", source);
    }
    if let Some(api) = livecheck::release_api_url(&manifest) {
        output.field("API", api);
    }

    if let Some(tag) = latest {
        let candidate = livecheck::version_from_tag(tag);
        if livecheck::is_newer(manifest.version(), tag) {
            output.warning(&format!(
                "{} is outdated: {} -> {candidate}",
                manifest.identifier(),
                manifest.version()
            ));
        } else {
            output.success(&format!(
                "{} {} is up to date",
                manifest.identifier(),
                manifest.version()
            ));
        }
    }

    Ok(())
}
