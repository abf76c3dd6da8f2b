//! Core value types shared by manifests and the engine.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::hash::Sha256Digest;

/// A normalized package identifier (the cask token), e.g. `cleanpdf`.
///
/// Identifiers are lowercase and limited to `[a-z0-9]` plus `-`, `_`, `.`
/// and `@`, starting with an alphanumeric character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier, normalizing the input to lowercase.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the input is empty or contains
    /// characters outside the identifier alphabet.
    pub fn new(name: &str) -> Result<Self, String> {
        let normalized = name.trim().to_lowercase();
        let mut chars = normalized.chars();
        match chars.next() {
            None => return Err("identifier must not be empty".to_string()),
            Some(c) if !c.is_ascii_alphanumeric() => {
                return Err(format!("identifier must start with a letter or digit, got '{c}'"));
            }
            Some(_) => {}
        }
        if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || "-_.@".contains(*c))) {
            return Err(format!("identifier contains invalid character '{bad}'"));
        }
        Ok(Self(normalized))
    }

    /// Return the normalized identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

/// A version string as written in the manifest.
///
/// Versions that parse as semver compare by semver rules. Anything else is
/// split into numeric and alphabetic runs (`1.10` → `1`, `10`;
/// `2.0beta3` → `2`, `0`, `beta`, `3`) which are compared in turn, numbers
/// numerically. Versions that compare equal component-wise but are spelled
/// differently (`2.1` and `2.1.0`) fall back to string order so that the
/// ordering agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Num(&'a str),
    Alpha(&'a str),
}

impl Ord for Part<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Leading zeros are trimmed, so a longer run is a larger number.
            (Part::Num(a), Part::Num(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Part::Alpha(a), Part::Alpha(b)) => a.cmp(b),
            (Part::Num(_), Part::Alpha(_)) => Ordering::Greater,
            (Part::Alpha(_), Part::Num(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for Part<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parts(version: &str) -> Vec<Part<'_>> {
    let mut out = Vec::new();
    let mut rest = version;
    while let Some(start) = rest.find(|c: char| c.is_ascii_alphanumeric()) {
        rest = &rest[start..];
        let numeric = rest.starts_with(|c: char| c.is_ascii_digit());
        let len = rest
            .find(|c: char| {
                if numeric {
                    !c.is_ascii_digit()
                } else {
                    !c.is_ascii_alphabetic()
                }
            })
            .unwrap_or(rest.len());
        let run = &rest[..len];
        out.push(if numeric {
            let trimmed = run.trim_start_matches('0');
            Part::Num(if trimmed.is_empty() { "0" } else { trimmed })
        } else {
            Part::Alpha(run)
        });
        rest = &rest[len..];
    }
    out
}

fn compare_parts(a: &[Part<'_>], b: &[Part<'_>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    // The longer side wins on any non-zero number and loses on a
    // pre-release tag (`1.0` > `1.0beta`, `1.0.1` > `1.0`, `1.0.0` == `1.0`).
    let tail_order = |tail: &[Part<'_>]| match tail.first() {
        None => Ordering::Equal,
        Some(Part::Alpha(_)) => Ordering::Less,
        Some(Part::Num(_)) if tail.iter().all(|p| *p == Part::Num("0")) => Ordering::Equal,
        Some(Part::Num(_)) => Ordering::Greater,
    };
    match a.len().cmp(&b.len()) {
        Ordering::Greater => tail_order(&a[b.len()..]),
        Ordering::Less => tail_order(&b[a.len()..]).reverse(),
        Ordering::Equal => Ordering::Equal,
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_release(other).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare the releases two versions denote, ignoring spelling:
    /// `2.1` and `2.1.0` are `Equal` here but not under [`Ord`].
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        let (a, b) = (self.without_prefix(), other.without_prefix());
        match (semver::Version::parse(a), semver::Version::parse(b)) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => compare_parts(&parts(a), &parts(b)),
        }
    }

    fn without_prefix(&self) -> &str {
        self.0
            .strip_prefix('v')
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How downloaded content is checked before installation.
///
/// `Unchecked` is an explicit, auditable opt-out (`sha256 = "no_check"`),
/// never the result of a missing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Content must hash to this digest.
    Verified(Sha256Digest),
    /// The manifest author opted out of verification.
    Unchecked,
}

impl ChecksumPolicy {
    /// Parse the manifest form: a 64-hex digest or the `no_check` literal.
    ///
    /// # Errors
    ///
    /// Returns the digest validation error for anything else.
    pub fn parse(s: &str) -> Result<Self, crate::DigestError> {
        let trimmed = s.trim();
        if trimmed == crate::NO_CHECK || trimmed == ":no_check" {
            Ok(Self::Unchecked)
        } else {
            Sha256Digest::new(trimmed).map(Self::Verified)
        }
    }

    /// Returns `true` for the explicit opt-out.
    pub fn is_unchecked(&self) -> bool {
        matches!(self, Self::Unchecked)
    }
}

impl std::fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified(d) => write!(f, "{d}"),
            Self::Unchecked => write!(f, "{}", crate::NO_CHECK),
        }
    }
}

/// Where the livecheck strategy looks for new versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LivecheckSource {
    /// Reuse the manifest's download URL (`url :url` in a cask).
    ManifestUrl,
    /// A dedicated URL.
    Url(String),
}

impl From<String> for LivecheckSource {
    fn from(s: String) -> Self {
        match s.trim_start_matches(':') {
            "url" => Self::ManifestUrl,
            _ => Self::Url(s),
        }
    }
}

impl From<LivecheckSource> for String {
    fn from(src: LivecheckSource) -> Self {
        match src {
            LivecheckSource::ManifestUrl => "url".to_string(),
            LivecheckSource::Url(u) => u,
        }
    }
}

/// Upstream version discovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivecheckStrategy {
    /// The repository's latest (non-prerelease) GitHub release.
    GithubLatest,
    /// All GitHub releases, including prereleases.
    GithubReleases,
    /// Regex match against a page body.
    PageMatch,
    /// Regex match against response headers.
    HeaderMatch,
    /// Git tags of the source repository.
    Git,
}

impl std::str::FromStr for LivecheckStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches(':') {
            "github_latest" => Ok(Self::GithubLatest),
            "github_releases" => Ok(Self::GithubReleases),
            "page_match" => Ok(Self::PageMatch),
            "header_match" => Ok(Self::HeaderMatch),
            "git" => Ok(Self::Git),
            other => Err(format!("unknown livecheck strategy '{other}'")),
        }
    }
}

/// Descriptor used only to discover future versions; has no effect on install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Livecheck {
    /// Where to look.
    pub url: LivecheckSource,
    /// How to interpret what is found there.
    pub strategy: LivecheckStrategy,
}
