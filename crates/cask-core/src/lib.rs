//! Resolution, verification and purge engine for cask manifests.
//!
//! - [`interpolate`] renders download URLs for a version
//! - [`integrity`] checks downloaded content against the manifest digest
//! - [`lifecycle`] models an install from resolution to purge
//! - [`import`] converts Homebrew casks into manifests

pub mod import;
pub mod integrity;
pub mod interpolate;
pub mod lifecycle;
pub mod livecheck;
pub mod paths;
pub mod reporter;

pub use cask_schema as schema;
pub use integrity::{IntegrityError, Verification, VerificationStatus, digest_file, verify, verify_file};
pub use interpolate::{ResolvedArtifact, TemplateError, render};
pub use lifecycle::{PurgePlan, PurgeReport, purge_paths};
pub use paths::*;
pub use reporter::{NullReporter, Reporter};
