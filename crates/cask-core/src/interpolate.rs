//! Version interpolation: turns a manifest's URL template into a concrete
//! download URL for one version.

use cask_schema::manifest::parse_download_url;
use cask_schema::{Bindings, Identifier, Manifest, UnboundPlaceholder, Version};
use thiserror::Error;
use url::Url;

/// Errors raised while rendering a download URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The requested version was empty.
    #[error("version must not be empty")]
    EmptyVersion,

    /// Substitution produced something that is not a download URL.
    #[error("rendered URL {url:?} is invalid: {reason}")]
    InvalidUrl {
        /// The rendered string.
        url: String,
        /// Why the URL parser rejected it.
        reason: String,
    },

    /// The template referenced a value the interpolator does not supply.
    #[error(transparent)]
    Unbound(#[from] UnboundPlaceholder),
}

/// A manifest rendered for one concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Package the artifact belongs to.
    pub identifier: Identifier,
    /// Version substituted into the template.
    pub version: Version,
    /// Where to fetch the release archive.
    pub download_url: Url,
    /// Bundle name placed into the applications directory.
    pub install_artifact_name: String,
}

impl ResolvedArtifact {
    /// File name of the download, taken from the last URL path segment.
    pub fn file_name(&self) -> &str {
        crate::paths::filename_from_url(self.download_url.path())
    }
}

/// Render `manifest` for `version`, replacing every `#{version}`.
///
/// # Errors
///
/// Returns [`TemplateError::EmptyVersion`] for an empty version and
/// [`TemplateError::InvalidUrl`] when the result does not parse as an
/// `http(s)` URL.
pub fn render(manifest: &Manifest, version: &str) -> Result<ResolvedArtifact, TemplateError> {
    if version.trim().is_empty() {
        return Err(TemplateError::EmptyVersion);
    }

    let rendered = manifest.url_template().expand(&Bindings {
        version: Some(version),
        ..Bindings::default()
    })?;
    let download_url = parse_download_url(&rendered).map_err(|reason| TemplateError::InvalidUrl {
        url: rendered.clone(),
        reason,
    })?;

    let install_artifact_name = manifest
        .install_artifact()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    tracing::debug!(
        identifier = %manifest.identifier(),
        version,
        url = %download_url,
        "rendered download url"
    );

    Ok(ResolvedArtifact {
        identifier: manifest.identifier().clone(),
        version: Version::new(version),
        download_url,
        install_artifact_name,
    })
}

/// Render `manifest` for the version it declares.
///
/// # Errors
///
/// See [`render`].
pub fn render_current(manifest: &Manifest) -> Result<ResolvedArtifact, TemplateError> {
    render(manifest, manifest.version().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn manifest(url: &str, version: &str) -> Manifest {
        Manifest::parse(&format!(
            r#"
token = "app"
version = "{version}"
sha256 = "no_check"
url = "{url}"
name = "App"
app = "Nested/App.app"
"#
        ))
        .unwrap()
    }

    #[test]
    fn renders_every_occurrence() {
        let m = manifest("https://host/v#{version}/App-#{version}.zip", "1.0.0");
        let resolved = render(&m, "2.0.0").unwrap();
        assert_eq!(
            resolved.download_url.as_str(),
            "https://host/v2.0.0/App-2.0.0.zip"
        );
        assert_eq!(resolved.version.as_str(), "2.0.0");
        assert_eq!(resolved.install_artifact_name, "App.app");
        assert_eq!(resolved.file_name(), "App-2.0.0.zip");
    }

    #[test]
    fn render_current_uses_declared_version() {
        let m = manifest("https://host/v#{version}/App.zip", "3.1");
        assert_eq!(
            render_current(&m).unwrap().download_url.as_str(),
            "https://host/v3.1/App.zip"
        );
    }

    #[test]
    fn empty_version_is_rejected() {
        let m = manifest("https://host/#{version}.zip", "1.0");
        assert_eq!(render(&m, ""), Err(TemplateError::EmptyVersion));
        assert_eq!(render(&m, "  "), Err(TemplateError::EmptyVersion));
    }

    #[test]
    fn invalid_result_is_template_error() {
        let m = manifest("https://#{version}/App.zip", "example.com");
        assert!(matches!(
            render(&m, "bad host"),
            Err(TemplateError::InvalidUrl { url, .. }) if url == "https://bad host/App.zip"
        ));
    }

    proptest! {
        #[test]
        fn render_is_deterministic(version in "[A-Za-z0-9][A-Za-z0-9._-]{0,20}") {
            let m = manifest("https://host/v#{version}/App-#{version}.zip", "1.0.0");
            let first = render(&m, &version).unwrap();
            let second = render(&m, &version).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                first.download_url.as_str(),
                format!("https://host/v{version}/App-{version}.zip")
            );
        }
    }
}
