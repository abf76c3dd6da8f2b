//! Shared manifest model for cask.
//!
//! A [`Manifest`] describes one installable application bundle: where to
//! fetch it for a given version, how to verify it, what to place into the
//! applications directory, and which user-data paths a full purge removes.

pub mod hash;
pub mod manifest;
pub mod template;
pub mod types;

// Re-exports
pub use hash::*;
pub use manifest::{Manifest, RawManifest, RawZap, SchemaError};
pub use template::{Bindings, Placeholder, Template, TemplateSyntaxError, UnboundPlaceholder};
pub use types::*;

/// Literal used in manifests to opt out of checksum verification.
pub const NO_CHECK: &str = "no_check";
