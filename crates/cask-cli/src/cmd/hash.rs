//! Hash command
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Print the SHA256 of files, `sha256sum` style
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let digest = cask_core::digest_file(file)
            .with_context(|| format!("Failed to hash {}", file.display()))?;
        println!("{digest}  {}", file.display());
    }
    Ok(())
}
