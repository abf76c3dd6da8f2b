pub mod check;
pub mod hash;
pub mod import;
pub mod livecheck;
pub mod remove;
pub mod resolve;
pub mod verify;

use anyhow::{Context, Result};
use cask_schema::Manifest;
use std::path::Path;

/// Load and validate a manifest, naming the file on failure.
pub(crate) fn load(path: &Path) -> Result<Manifest> {
    tracing::debug!(path = %path.display(), "loading manifest");
    Manifest::from_file(path).with_context(|| format!("Failed to load manifest {}", path.display()))
}
