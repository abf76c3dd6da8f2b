//! Integrity verification of downloaded artifacts.
//!
//! Content is hashed with SHA256 and compared against the manifest's
//! [`ChecksumPolicy`]. A mismatch under `Verified` is always an error and the
//! caller must not continue with the install. `Unchecked` never fails; the
//! result is flagged so the caller can warn the user.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cask_schema::{ChecksumPolicy, Sha256Digest};
use sha2::{Digest, Sha256};
use thiserror::Error;

const CHUNK_SIZE: usize = 64 * 1024;

/// Errors raised while verifying content.
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The content does not hash to the declared digest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    Mismatch {
        /// Digest declared by the manifest.
        expected: Sha256Digest,
        /// Digest of the content actually received.
        actual: Sha256Digest,
    },

    /// The content could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the content was checked against a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The digest matched.
    Verified,
    /// The manifest opted out; integrity was not verified.
    Unverified,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Whether a digest comparison took place.
    pub status: VerificationStatus,
    /// SHA256 of the content, computed in both cases.
    pub actual: Sha256Digest,
}

impl Verification {
    /// `true` when the manifest opted out of verification and the user should be warned.
    pub fn unverified(&self) -> bool {
        self.status == VerificationStatus::Unverified
    }
}

fn check(actual: Sha256Digest, policy: &ChecksumPolicy) -> Result<Verification, IntegrityError> {
    match policy {
        ChecksumPolicy::Verified(expected) if *expected == actual => {
            tracing::debug!(digest = %actual, "checksum verified");
            Ok(Verification {
                status: VerificationStatus::Verified,
                actual,
            })
        }
        ChecksumPolicy::Verified(expected) => Err(IntegrityError::Mismatch {
            expected: expected.clone(),
            actual,
        }),
        ChecksumPolicy::Unchecked => {
            tracing::warn!(digest = %actual, "checksum not verified (no_check)");
            Ok(Verification {
                status: VerificationStatus::Unverified,
                actual,
            })
        }
    }
}

/// Verify an in-memory buffer against `policy`.
///
/// # Errors
///
/// Returns [`IntegrityError::Mismatch`] when a declared digest does not match.
pub fn verify(bytes: &[u8], policy: &ChecksumPolicy) -> Result<Verification, IntegrityError> {
    check(Sha256Digest::compute(bytes), policy)
}

/// SHA256 of a stream, read in fixed-size chunks.
///
/// # Errors
///
/// Returns the underlying I/O error if reading fails.
pub fn digest_reader<R: Read>(mut reader: R) -> std::io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// SHA256 of a file on disk.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> std::io::Result<Sha256Digest> {
    digest_reader(File::open(path)?)
}

/// Verify a stream against `policy`.
///
/// # Errors
///
/// Returns [`IntegrityError::Io`] if reading fails, or
/// [`IntegrityError::Mismatch`] when a declared digest does not match.
pub fn verify_reader<R: Read>(reader: R, policy: &ChecksumPolicy) -> Result<Verification, IntegrityError> {
    check(digest_reader(reader)?, policy)
}

/// Verify a downloaded file on disk.
///
/// # Errors
///
/// See [`verify_reader`].
pub fn verify_file(path: &Path, policy: &ChecksumPolicy) -> Result<Verification, IntegrityError> {
    check(digest_file(path)?, policy)
}
