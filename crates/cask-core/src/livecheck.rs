//! Livecheck descriptor helpers.
//!
//! Only computes where an external checker should look; never performs I/O.

use std::cmp::Ordering;
use std::sync::LazyLock;

use cask_schema::{LivecheckSource, LivecheckStrategy, Manifest, Version};
use regex::Regex;

static GITHUB_REPO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/]+)/([^/#?]+)").expect("valid regex"));

/// The URL the livecheck strategy inspects, if the manifest declares one.
pub fn source_url(manifest: &Manifest) -> Option<String> {
    match &manifest.livecheck()?.url {
        LivecheckSource::ManifestUrl => crate::interpolate::render_current(manifest)
            .ok()
            .map(|r| r.download_url.to_string()),
        LivecheckSource::Url(u) => Some(u.clone()),
    }
}

/// `(owner, repo)` of the GitHub repository behind `url`.
pub fn github_repository(url: &str) -> Option<(String, String)> {
    let caps = GITHUB_REPO.captures(url)?;
    let owner = caps[1].to_string();
    let repo = caps[2].trim_end_matches(".git").to_string();
    Some((owner, repo))
}

/// GitHub REST endpoint queried for the declared strategy.
///
/// Returns `None` for non-GitHub strategies or sources.
pub fn release_api_url(manifest: &Manifest) -> Option<String> {
    let strategy = manifest.livecheck()?.strategy;
    let (owner, repo) = github_repository(&source_url(manifest)?)?;
    match strategy {
        LivecheckStrategy::GithubLatest => Some(format!(
            "https://api.github.com/repos/{owner}/{repo}/releases/latest"
        )),
        LivecheckStrategy::GithubReleases => {
            Some(format!("https://api.github.com/repos/{owner}/{repo}/releases"))
        }
        _ => None,
    }
}

/// Strip the conventional `v` prefix from a release tag.
pub fn version_from_tag(tag: &str) -> &str {
    tag.strip_prefix('v')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(tag)
}

/// `true` when `candidate` (a tag or version) is a later release than `current`.
pub fn is_newer(current: &Version, candidate: &str) -> bool {
    Version::new(version_from_tag(candidate)).cmp_release(current) == Ordering::Greater
}
