//! Manifest parsing and validation.
//!
//! Manifests are written in TOML:
//!
//! ```toml
//! token = "cleanpdf"
//! version = "2.0.0"
//! sha256 = "no_check"
//! url = "https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip"
//! name = "Clean PDF"
//! desc = "View and wipe metadata from PDF files"
//! homepage = "https://james-see.github.io/cleanpdfapp/"
//! app = "CleanPDF.app"
//! bundle_id = "us.jamescampbell.cleanpdf"
//!
//! [livecheck]
//! url = "url"
//! strategy = "github_latest"
//!
//! [zap]
//! trash = [
//!     "~/Library/Application Support/#{bundle_id}",
//!     "~/Library/Caches/#{bundle_id}",
//!     "~/Library/Preferences/#{bundle_id}.plist",
//! ]
//! ```
//!
//! The file is first deserialized into a [`RawManifest`] where every field is
//! optional, then validated into a [`Manifest`]. Validation either succeeds
//! completely or returns a [`SchemaError`] naming the offending field.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::template::{Bindings, Placeholder, Template};
use crate::types::{ChecksumPolicy, Identifier, Livecheck, Version};

/// Errors that can occur when loading or validating a manifest.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// An I/O error occurred while reading a manifest file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field is present but its value is unusable.
    #[error("invalid `{field}` {value:?}: {reason}")]
    InvalidField {
        /// Manifest key.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The download URL template never mentions the version.
    #[error("`url` template {template:?} has no {} placeholder", Placeholder::Version)]
    MissingPlaceholder {
        /// The template as written.
        template: String,
    },
}

impl SchemaError {
    fn invalid(field: &'static str, value: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// `[zap]` table: paths removed only on a full purge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawZap {
    /// Path templates, removed in order.
    #[serde(default)]
    pub trash: Vec<String>,
}

/// Unvalidated manifest, exactly as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawManifest {
    /// Package identifier.
    pub token: Option<String>,
    /// Current version.
    pub version: Option<String>,
    /// Hex digest or `no_check`.
    pub sha256: Option<String>,
    /// Download URL template.
    pub url: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// One-line description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Project homepage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Application bundle to install.
    pub app: Option<String>,
    /// Reverse-domain bundle identifier used by zap templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Version discovery descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livecheck: Option<Livecheck>,
    /// Purge targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zap: Option<RawZap>,
}

/// A validated, immutable package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    identifier: Identifier,
    version: Version,
    checksum: ChecksumPolicy,
    url: Template,
    display_name: String,
    description: String,
    homepage: String,
    livecheck: Option<Livecheck>,
    install_artifact: String,
    bundle_id: Option<String>,
    cleanup: Vec<Template>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SchemaError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(v) => Err(SchemaError::invalid(field, &v, "must not be empty")),
        None => Err(SchemaError::MissingField(field)),
    }
}

/// Reverse-domain identifier: at least two dot-separated labels of
/// `[A-Za-z0-9_-]`, none of them empty.
fn is_bundle_id(s: &str) -> bool {
    let labels: Vec<&str> = s.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Parse `s` as an absolute `http(s)` URL with a host.
///
/// # Errors
///
/// Returns a human-readable reason when the URL is malformed or unsupported.
pub fn parse_download_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(url)
}

impl Manifest {
    /// Parse a manifest from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Io` if the file cannot be read, or any
    /// validation error from [`Manifest::parse`].
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Parse` if the TOML is malformed, or any
    /// validation error from [`Manifest::from_raw`].
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        let raw: RawManifest = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    /// Validate a raw manifest.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] encountered; no partial manifest is
    /// produced.
    pub fn from_raw(raw: RawManifest) -> Result<Self, SchemaError> {
        let token = required(raw.token, "token")?;
        let identifier = Identifier::new(&token).map_err(|e| SchemaError::invalid("token", &token, e))?;

        let version = required(raw.version, "version")?;
        if version.chars().any(char::is_whitespace) {
            return Err(SchemaError::invalid("version", &version, "must not contain whitespace"));
        }
        let version = Version::new(&version);

        let sha256 = raw.sha256.ok_or(SchemaError::MissingField("sha256"))?;
        let checksum =
            ChecksumPolicy::parse(&sha256).map_err(|e| SchemaError::invalid("sha256", &sha256, e))?;

        let url_src = required(raw.url, "url")?;
        let url = Template::parse(&url_src).map_err(|e| SchemaError::invalid("url", &url_src, e))?;
        if !url.contains(Placeholder::Version) {
            return Err(SchemaError::MissingPlaceholder { template: url_src });
        }
        if let Some(other) = url.placeholders().into_iter().find(|p| *p != Placeholder::Version) {
            return Err(SchemaError::invalid(
                "url",
                &url_src,
                format!("only {} may appear, found {other}", Placeholder::Version),
            ));
        }
        let rendered = url
            .expand(&Bindings {
                version: Some(version.as_str()),
                ..Bindings::default()
            })
            .map_err(|e| SchemaError::invalid("url", &url_src, e))?;
        parse_download_url(&rendered).map_err(|e| SchemaError::invalid("url", &rendered, e))?;

        let display_name = required(raw.name, "name")?;

        let install_artifact = required(raw.app, "app")?;
        if !install_artifact.ends_with(".app") {
            return Err(SchemaError::invalid(
                "app",
                &install_artifact,
                "must name a .app bundle",
            ));
        }

        let bundle_id = match raw.bundle_id {
            Some(b) if !is_bundle_id(&b) => {
                return Err(SchemaError::invalid(
                    "bundle_id",
                    &b,
                    "expected a reverse-domain identifier such as com.example.app",
                ));
            }
            other => other,
        };

        let cleanup = raw
            .zap
            .unwrap_or_default()
            .trash
            .iter()
            .map(|p| Self::cleanup_template(p, bundle_id.is_some()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            identifier,
            version,
            checksum,
            url,
            display_name,
            description: raw.desc.unwrap_or_default(),
            homepage: raw.homepage.unwrap_or_default(),
            livecheck: raw.livecheck,
            install_artifact,
            bundle_id,
            cleanup,
        })
    }

    fn cleanup_template(path: &str, has_bundle_id: bool) -> Result<Template, SchemaError> {
        let template = Template::parse(path).map_err(|e| SchemaError::invalid("zap.trash", path, e))?;
        if template.contains(Placeholder::Version) {
            return Err(SchemaError::invalid(
                "zap.trash",
                path,
                format!("{} is not allowed in cleanup paths", Placeholder::Version),
            ));
        }
        if template.contains(Placeholder::BundleId) && !has_bundle_id {
            return Err(SchemaError::invalid(
                "zap.trash",
                path,
                format!("{} used but `bundle_id` is not set", Placeholder::BundleId),
            ));
        }
        let Some(relative) = path.strip_prefix("~/").or_else(|| path.strip_prefix('/')) else {
            return Err(SchemaError::invalid(
                "zap.trash",
                path,
                "must be absolute or start with ~/",
            ));
        };
        let mut components = relative.split('/').filter(|c| !c.is_empty()).peekable();
        if components.peek().is_none() {
            return Err(SchemaError::invalid(
                "zap.trash",
                path,
                "must name a path below the home or root directory",
            ));
        }
        if components.any(|c| c == "." || c == ".." || c == "~") {
            return Err(SchemaError::invalid(
                "zap.trash",
                path,
                "must not contain `.`, `..` or `~` components",
            ));
        }
        Ok(template)
    }

    /// Package identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Version declared by the manifest.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Checksum policy for the downloaded artifact.
    pub fn checksum(&self) -> &ChecksumPolicy {
        &self.checksum
    }

    /// Returns `true` when the manifest opted out of integrity verification.
    pub fn is_unchecked(&self) -> bool {
        self.checksum.is_unchecked()
    }

    /// Download URL template.
    pub fn url_template(&self) -> &Template {
        &self.url
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// One-line description; may be empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Project homepage; may be empty.
    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Version discovery descriptor, if any.
    pub fn livecheck(&self) -> Option<&Livecheck> {
        self.livecheck.as_ref()
    }

    /// Bundle placed into the applications directory, as written.
    pub fn install_artifact(&self) -> &str {
        &self.install_artifact
    }

    /// Reverse-domain bundle identifier, if declared.
    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    /// Cleanup templates, in declaration order.
    pub fn cleanup_paths(&self) -> &[Template] {
        &self.cleanup
    }
}
