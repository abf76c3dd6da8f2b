//! Install lifecycle typestate and purge planning.
//!
//! ```text
//! Pending --[resolve()]--> Resolved --[verify()]--> Checked --[mark_installed()]--> Installed
//!                                                                                     |
//!                                                                               [purge()]
//!                                                                                     v
//!                                                                                 PurgePlan
//! ```
//!
//! Each state is a separate type, so content can never be verified before a
//! download URL was resolved, and a purge is only reachable from an install.
//! None of the transitions touch the network or the filesystem except
//! [`Resolved::verify_file`] and [`PurgePlan::execute`].

use std::io;
use std::path::{Path, PathBuf};

use cask_schema::{Bindings, Identifier, Manifest};
use thiserror::Error;

use crate::integrity::{self, IntegrityError, Verification};
use crate::interpolate::{self, ResolvedArtifact, TemplateError};
use crate::paths::expand_home;
use crate::reporter::Reporter;

/// Errors raised by lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The download URL could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Downloaded content failed verification.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// The current user's home directory could not be determined.
    #[error("Could not determine home directory")]
    NoHome,

    /// A path could not be removed.
    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        /// Path being removed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// Expand the manifest's cleanup templates into absolute paths.
///
/// `#{token}` becomes the identifier, `#{bundle_id}` the bundle identifier and
/// a leading `~` is expanded against `home`. Declaration order is kept.
pub fn purge_paths(manifest: &Manifest, home: &Path) -> Vec<PathBuf> {
    let bindings = Bindings {
        version: None,
        token: Some(manifest.identifier().as_str()),
        bundle_id: manifest.bundle_id(),
    };

    manifest
        .cleanup_paths()
        .iter()
        .filter_map(|template| match template.expand(&bindings) {
            Ok(path) => Some(expand_home(&path, home)),
            // Manifest validation rejects templates that cannot be bound.
            Err(e) => {
                tracing::error!(template = %template, "skipping cleanup path: {e}");
                None
            }
        })
        .collect()
}

/// [`purge_paths`] against the current user's home directory.
///
/// # Errors
///
/// Returns [`LifecycleError::NoHome`] if the home directory is unknown.
pub fn purge_paths_for_user(manifest: &Manifest) -> Result<Vec<PathBuf>, LifecycleError> {
    let home = dirs::home_dir().ok_or(LifecycleError::NoHome)?;
    Ok(purge_paths(manifest, &home))
}

/// Remove a file, symlink or directory tree.
///
/// Returns `Ok(false)` when nothing exists at `path`.
///
/// # Errors
///
/// Returns the I/O error for anything other than a missing path.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        // Raced with another remover.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// State 1: a manifest selected for install, no version chosen yet.
#[derive(Debug)]
pub struct Pending<'m> {
    manifest: &'m Manifest,
}

/// State 2: download URL and artifact name are known.
#[derive(Debug)]
pub struct Resolved<'m> {
    manifest: &'m Manifest,
    artifact: ResolvedArtifact,
}

/// State 3: downloaded content has passed the checksum policy.
///
/// Covers both verified and explicitly unverified content; see
/// [`Checked::verification`].
#[derive(Debug)]
pub struct Checked<'m> {
    manifest: &'m Manifest,
    artifact: ResolvedArtifact,
    verification: Verification,
}

/// State 4: the bundle has been placed into the applications directory.
#[derive(Debug)]
pub struct Installed<'m> {
    manifest: &'m Manifest,
    artifact: ResolvedArtifact,
    verification: Verification,
    target: PathBuf,
}

impl<'m> Pending<'m> {
    /// Start an install flow for `manifest`.
    pub fn new(manifest: &'m Manifest) -> Self {
        Self { manifest }
    }

    /// Render the download URL for `version`, or the manifest's own version.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the version is empty or the URL is invalid.
    pub fn resolve(self, version: Option<&str>) -> Result<Resolved<'m>, TemplateError> {
        let version = version.unwrap_or_else(|| self.manifest.version().as_str());
        let artifact = interpolate::render(self.manifest, version)?;
        Ok(Resolved {
            manifest: self.manifest,
            artifact,
        })
    }
}

impl<'m> Resolved<'m> {
    /// What to fetch.
    pub fn artifact(&self) -> &ResolvedArtifact {
        &self.artifact
    }

    /// Check downloaded bytes against the manifest's checksum policy.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Mismatch`] on a digest mismatch; the flow
    /// ends here and nothing may be installed.
    pub fn verify(self, bytes: &[u8]) -> Result<Checked<'m>, IntegrityError> {
        let verification = integrity::verify(bytes, self.manifest.checksum())?;
        Ok(self.checked(verification))
    }

    /// Check a downloaded file against the manifest's checksum policy.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError`] on a read failure or digest mismatch.
    pub fn verify_file(self, path: &Path) -> Result<Checked<'m>, IntegrityError> {
        let verification = integrity::verify_file(path, self.manifest.checksum())?;
        Ok(self.checked(verification))
    }

    fn checked(self, verification: Verification) -> Checked<'m> {
        Checked {
            manifest: self.manifest,
            artifact: self.artifact,
            verification,
        }
    }
}

impl<'m> Checked<'m> {
    /// The verification outcome; check [`Verification::unverified`] to warn.
    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    /// The artifact that was checked.
    pub fn artifact(&self) -> &ResolvedArtifact {
        &self.artifact
    }

    /// Record that the bundle now lives in `apps_dir`.
    pub fn mark_installed(self, apps_dir: &Path) -> Installed<'m> {
        let target = apps_dir.join(&self.artifact.install_artifact_name);
        tracing::info!(
            identifier = %self.manifest.identifier(),
            version = %self.artifact.version,
            target = %target.display(),
            unverified = self.verification.unverified(),
            "installed"
        );
        Installed {
            manifest: self.manifest,
            artifact: self.artifact,
            verification: self.verification,
            target,
        }
    }
}

impl Installed<'_> {
    /// Installed bundle path; the only thing an ordinary uninstall removes.
    pub fn uninstall_target(&self) -> &Path {
        &self.target
    }

    /// The installed artifact.
    pub fn artifact(&self) -> &ResolvedArtifact {
        &self.artifact
    }

    /// Verification outcome recorded at install time.
    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    /// Plan a full purge: the bundle plus every cleanup path.
    pub fn purge(self, home: &Path) -> PurgePlan {
        PurgePlan {
            identifier: self.manifest.identifier().clone(),
            paths: purge_paths(self.manifest, home),
            artifact: self.target,
        }
    }
}

/// Everything a purge (or a plain uninstall) removes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgePlan {
    /// Package the paths belong to.
    pub identifier: Identifier,
    /// Installed bundle, removed first.
    pub artifact: PathBuf,
    /// Cleanup paths, removed after the bundle.
    pub paths: Vec<PathBuf>,
}

/// What [`PurgePlan::execute`] found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Paths that existed and were removed (or would be, on a dry run).
    pub removed: Vec<PathBuf>,
    /// Paths that did not exist.
    pub absent: Vec<PathBuf>,
}

impl PurgePlan {
    /// Full purge for a bundle installed outside the current process.
    pub fn zap(manifest: &Manifest, apps_dir: &Path, home: &Path) -> Self {
        Self {
            identifier: manifest.identifier().clone(),
            artifact: apps_dir.join(install_name(manifest)),
            paths: purge_paths(manifest, home),
        }
    }

    /// [`PurgePlan::zap`] against the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NoHome`] if the home directory is unknown.
    pub fn zap_for_user(manifest: &Manifest, apps_dir: &Path) -> Result<Self, LifecycleError> {
        Ok(Self {
            identifier: manifest.identifier().clone(),
            artifact: apps_dir.join(install_name(manifest)),
            paths: purge_paths_for_user(manifest)?,
        })
    }

    /// Ordinary uninstall: only the installed bundle.
    pub fn uninstall(manifest: &Manifest, apps_dir: &Path) -> Self {
        Self {
            identifier: manifest.identifier().clone(),
            artifact: apps_dir.join(install_name(manifest)),
            paths: Vec::new(),
        }
    }

    /// All targets in removal order.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.artifact.as_path()).chain(self.paths.iter().map(PathBuf::as_path))
    }

    /// Remove every target. Missing paths are recorded, not treated as errors,
    /// so running a plan twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Remove`] for the first path that exists but
    /// cannot be removed.
    pub fn execute<R: Reporter + ?Sized>(
        &self,
        dry_run: bool,
        reporter: &R,
    ) -> Result<PurgeReport, LifecycleError> {
        let mut report = PurgeReport::default();

        for path in self.targets() {
            let present = if dry_run {
                std::fs::symlink_metadata(path).is_ok()
            } else {
                remove_path(path).map_err(|source| LifecycleError::Remove {
                    path: path.to_path_buf(),
                    source,
                })?
            };

            if present {
                reporter.removing(&self.identifier, path, dry_run);
                tracing::debug!(identifier = %self.identifier, path = %path.display(), dry_run, "removed");
                report.removed.push(path.to_path_buf());
            } else {
                tracing::debug!(identifier = %self.identifier, path = %path.display(), "already absent");
                report.absent.push(path.to_path_buf());
            }
        }

        Ok(report)
    }
}

fn install_name(manifest: &Manifest) -> &str {
    manifest
        .install_artifact()
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use cask_schema::Sha256Digest;

    const CLEANPDF: &str = r##"
token = "cleanpdf"
version = "2.0.0"
sha256 = "no_check"
url = "https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip"
name = "Clean PDF"
app = "CleanPDF.app"
bundle_id = "us.jamescampbell.cleanpdf"

[zap]
trash = [
    "~/Library/Application Support/#{bundle_id}",
    "~/Library/Caches/#{bundle_id}",
    "~/Library/Preferences/#{bundle_id}.plist",
    "~/Library/Logs/#{token}",
]
"##;

    fn cleanpdf() -> Manifest {
        Manifest::parse(CLEANPDF).unwrap()
    }

    #[test]
    fn purge_paths_expand_in_order() {
        let home = Path::new("/Users/me");
        let paths = purge_paths(&cleanpdf(), home);
        assert_eq!(
            paths,
            vec![
                home.join("Library/Application Support/us.jamescampbell.cleanpdf"),
                home.join("Library/Caches/us.jamescampbell.cleanpdf"),
                home.join("Library/Preferences/us.jamescampbell.cleanpdf.plist"),
                home.join("Library/Logs/cleanpdf"),
            ]
        );
        assert_eq!(paths, purge_paths(&cleanpdf(), home));
    }

    #[test]
    fn full_flow_reaches_purge() {
        let m = cleanpdf();
        let resolved = Pending::new(&m).resolve(Some("2.1.0")).unwrap();
        assert_eq!(
            resolved.artifact().download_url.as_str(),
            "https://github.com/james-see/cleanpdfapp/releases/download/v2.1.0/CleanPDF-macos-v2.1.0.zip"
        );

        let checked = resolved.verify(b"zip bytes").unwrap();
        assert!(checked.verification().unverified());

        let installed = checked.mark_installed(Path::new("/Applications"));
        assert_eq!(
            installed.uninstall_target(),
            Path::new("/Applications/CleanPDF.app")
        );

        let plan = installed.purge(Path::new("/Users/me"));
        assert_eq!(plan.artifact, PathBuf::from("/Applications/CleanPDF.app"));
        assert_eq!(plan.paths.len(), 4);
        assert_eq!(plan.targets().count(), 5);
    }

    #[test]
    fn mismatch_stops_the_flow() {
        let m = Manifest::parse(&CLEANPDF.replace(
            "sha256 = \"no_check\"",
            &format!("sha256 = \"{}\"", Sha256Digest::compute(b"expected")),
        ))
        .unwrap();
        let resolved = Pending::new(&m).resolve(None).unwrap();
        assert!(matches!(
            resolved.verify(b"other"),
            Err(IntegrityError::Mismatch { .. })
        ));
    }

    #[test]
    fn execute_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        let apps = tempfile::tempdir().unwrap();
        let m = cleanpdf();

        let bundle = apps.path().join("CleanPDF.app/Contents");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join("Info.plist"), "<plist/>").unwrap();
        let support = home
            .path()
            .join("Library/Application Support/us.jamescampbell.cleanpdf");
        std::fs::create_dir_all(&support).unwrap();
        let prefs = home.path().join("Library/Preferences");
        std::fs::create_dir_all(&prefs).unwrap();
        std::fs::write(prefs.join("us.jamescampbell.cleanpdf.plist"), "").unwrap();

        let plan = PurgePlan::zap(&m, apps.path(), home.path());

        let dry = plan.execute(true, &NullReporter).unwrap();
        assert_eq!(dry.removed.len(), 3);
        assert!(support.exists());

        let first = plan.execute(false, &NullReporter).unwrap();
        assert_eq!(first.removed.len(), 3);
        assert_eq!(first.absent.len(), 2);
        assert!(!apps.path().join("CleanPDF.app").exists());
        assert!(!support.exists());
        assert!(!prefs.join("us.jamescampbell.cleanpdf.plist").exists());

        let second = plan.execute(false, &NullReporter).unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(second.absent.len(), 5);
    }

    #[test]
    fn uninstall_keeps_user_data() {
        let home = tempfile::tempdir().unwrap();
        let apps = tempfile::tempdir().unwrap();
        let m = cleanpdf();

        std::fs::create_dir_all(apps.path().join("CleanPDF.app")).unwrap();
        let caches = home.path().join("Library/Caches/us.jamescampbell.cleanpdf");
        std::fs::create_dir_all(&caches).unwrap();

        let report = PurgePlan::uninstall(&m, apps.path())
            .execute(false, &NullReporter)
            .unwrap();
        assert_eq!(report.removed, vec![apps.path().join("CleanPDF.app")]);
        assert!(caches.exists());
    }

    #[test]
    fn zap_for_user_uses_home_directory() {
        let m = cleanpdf();
        let apps = Path::new("/Applications");
        let Some(home) = dirs::home_dir() else {
            assert!(matches!(
                PurgePlan::zap_for_user(&m, apps),
                Err(LifecycleError::NoHome)
            ));
            return;
        };
        let plan = PurgePlan::zap_for_user(&m, apps).unwrap();
        assert_eq!(plan, PurgePlan::zap(&m, apps, &home));
        assert_eq!(plan.paths, purge_paths_for_user(&m).unwrap());
    }

    #[test]
    fn remove_path_handles_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_path(&dir.path().join("nope")).unwrap());
        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();
        assert!(remove_path(&file).unwrap());
        assert!(!file.exists());
    }
}
