//! Importers for translating external package definitions into cask TOML.

/// Homebrew Cask DSL importer.
pub mod homebrew;

use std::path::Path;

use cask_schema::{Manifest, RawManifest, SchemaError};
use thiserror::Error;

/// Errors that can occur while importing a foreign definition.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension does not name a known source format.
    #[error("Unknown import source: {0}")]
    UnknownSource(String),

    /// A stanza every manifest needs was not found.
    #[error("missing `{0}` stanza")]
    MissingStanza(&'static str),

    /// A stanza uses a form the importer does not understand.
    #[error("unsupported `{stanza}` stanza on line {line}: {text}")]
    Unsupported {
        /// Stanza keyword.
        stanza: &'static str,
        /// 1-based line number.
        line: usize,
        /// The offending source line.
        text: String,
    },

    /// The converted manifest does not validate.
    #[error("imported manifest is invalid: {0}")]
    Schema(#[from] SchemaError),

    /// The manifest could not be written as TOML.
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Import a file, picking the importer from its extension.
///
/// # Errors
///
/// Returns [`ImportError`] if the file cannot be read, converted, or the
/// result does not validate.
pub fn import_file(path: &Path) -> Result<(RawManifest, Manifest), ImportError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("rb") => {
            let raw = homebrew::parse_cask(&content)?;
            let manifest = Manifest::from_raw(raw.clone())?;
            tracing::debug!(identifier = %manifest.identifier(), path = %path.display(), "imported cask");
            Ok((raw, manifest))
        }
        _ => Err(ImportError::UnknownSource(path.display().to_string())),
    }
}

/// Render a raw manifest as pretty TOML.
///
/// # Errors
///
/// Returns [`ImportError::Serialize`] if serialization fails.
pub fn to_toml(raw: &RawManifest) -> Result<String, ImportError> {
    Ok(toml::to_string_pretty(raw)?)
}
