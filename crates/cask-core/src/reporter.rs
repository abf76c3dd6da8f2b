//! Reporter trait for dependency injection
//!
//! Lets lifecycle operations report status without being coupled to a
//! specific terminal implementation.

use std::path::Path;

use cask_schema::Identifier;

/// Sink for user-facing status messages.
pub trait Reporter: Send + Sync {
    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// A path belonging to `id` was removed (or would be, on a dry run).
    fn removing(&self, id: &Identifier, path: &Path, dry_run: bool);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn removing(&self, id: &Identifier, path: &Path, dry_run: bool) {
        (**self).removing(id, path, dry_run);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn removing(&self, _: &Identifier, _: &Path, _: bool) {}
}
