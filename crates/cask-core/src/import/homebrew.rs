use std::collections::HashMap;
use std::sync::LazyLock;

use cask_schema::{Livecheck, LivecheckSource, LivecheckStrategy, NO_CHECK, RawManifest, RawZap};
use regex::Regex;

use super::ImportError;

static CASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^cask\s+"([^"]+)"\s+do$"#).expect("valid regex"));
static STRING_STANZA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(version|url|name|desc|homepage|app)\s+"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});
static SHA256: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^sha256\s+(?::no_check|"([0-9A-Fa-f]{64})")$"#).expect("valid regex")
});
static LIVECHECK_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^url\s+(?::url|"([^"]*)")"#).expect("valid regex"));
static STRATEGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^strategy\s+(:[a-z_]+)").expect("valid regex"));
static OPENS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdo(\s*\|[^|]*\|)?$").expect("valid regex"));
static ZAP_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)(trash|delete|rmdir):\s*(\[[^\]]*\]|"(?:[^"\\]|\\.)*")"#).expect("valid regex")
});
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));
static BUNDLE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+){2,}$").expect("valid regex")
});

/// Suffixes macOS appends to a bundle identifier in per-app files.
const BUNDLE_SUFFIXES: &[&str] = &[".plist", ".savedState"];

/// Strip a trailing `#` comment, ignoring `#` inside double-quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn unescape(s: &str) -> String {
    s.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Net count of `[` over `]` outside strings.
fn bracket_depth(s: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Parse a Homebrew Cask definition into a raw manifest.
///
/// Supports the stanzas a single-app cask uses: `version`, `sha256`
/// (digest or `:no_check`), `url`, `name`, `desc`, `homepage`, a
/// `livecheck` block, `app` and `zap`. Literal bundle identifiers and tokens
/// in zap paths are rewritten to `#{bundle_id}` / `#{token}`.
///
/// # Errors
///
/// Returns [`ImportError::MissingStanza`] when a required stanza is absent and
/// [`ImportError::Unsupported`] for forms such as `version :latest` or
/// per-architecture digests.
pub fn parse_cask(source: &str) -> Result<RawManifest, ImportError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, strip_comment(l).trim()))
        .filter(|(_, l)| !l.is_empty());

    let mut raw = RawManifest::default();
    let mut trash = Vec::new();

    while let Some((no, line)) = lines.next() {
        if let Some(caps) = CASK.captures(line) {
            raw.token = Some(caps[1].to_string());
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        match keyword {
            "livecheck" if OPENS_BLOCK.is_match(line) => {
                raw.livecheck = parse_livecheck(&mut lines)?;
            }
            "zap" => {
                let mut stanza = line.to_string();
                while bracket_depth(&stanza) > 0 || stanza.ends_with(',') {
                    let Some((_, next)) = lines.next() else { break };
                    stanza.push(' ');
                    stanza.push_str(next);
                }
                trash.extend(parse_zap(&stanza));
            }
            "sha256" => {
                let caps = SHA256.captures(line).ok_or_else(|| unsupported("sha256", no, line))?;
                raw.sha256 = Some(caps.get(1).map_or_else(|| NO_CHECK.to_string(), |m| m.as_str().to_string()));
            }
            "version" | "url" | "name" | "desc" | "homepage" | "app" => {
                let Some(caps) = STRING_STANZA.captures(line) else {
                    return Err(unsupported(stanza_name(keyword), no, line));
                };
                let value = Some(unescape(&caps[2]));
                let slot = match keyword {
                    "version" => &mut raw.version,
                    "url" => &mut raw.url,
                    "name" => &mut raw.name,
                    "desc" => &mut raw.desc,
                    "homepage" => &mut raw.homepage,
                    _ => &mut raw.app,
                };
                // First occurrence wins (casks may list several names).
                if slot.is_none() {
                    *slot = value;
                }
            }
            "end" => {}
            _ => tracing::debug!(line = no, "ignoring stanza: {line}"),
        }
    }

    let token = raw.token.clone().ok_or(ImportError::MissingStanza("cask"))?;
    for (value, stanza) in [
        (&raw.version, "version"),
        (&raw.sha256, "sha256"),
        (&raw.url, "url"),
        (&raw.name, "name"),
        (&raw.app, "app"),
    ] {
        if value.is_none() {
            return Err(ImportError::MissingStanza(stanza));
        }
    }

    if !trash.is_empty() {
        let (bundle_id, trash) = templatize(&token, trash);
        raw.bundle_id = bundle_id;
        raw.zap = Some(RawZap { trash });
    }

    Ok(raw)
}

fn stanza_name(keyword: &str) -> &'static str {
    match keyword {
        "version" => "version",
        "url" => "url",
        "name" => "name",
        "desc" => "desc",
        "homepage" => "homepage",
        _ => "app",
    }
}

fn unsupported(stanza: &'static str, line: usize, text: &str) -> ImportError {
    ImportError::Unsupported {
        stanza,
        line,
        text: text.to_string(),
    }
}

fn parse_livecheck<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<Option<Livecheck>, ImportError> {
    let mut url = None;
    let mut strategy = None;
    let mut depth = 0usize;

    for (no, line) in lines.by_ref() {
        if line == "end" {
            if depth == 0 {
                break;
            }
            depth -= 1;
            continue;
        }

        if depth == 0 {
            if let Some(caps) = LIVECHECK_URL.captures(line) {
                url = Some(caps.get(1).map_or(LivecheckSource::ManifestUrl, |m| {
                    LivecheckSource::Url(m.as_str().to_string())
                }));
            } else if let Some(caps) = STRATEGY.captures(line) {
                let parsed = caps[1]
                    .parse::<LivecheckStrategy>()
                    .map_err(|_| unsupported("livecheck", no, line))?;
                strategy = Some(parsed);
            }
        }

        if OPENS_BLOCK.is_match(line) {
            depth += 1;
        }
    }

    let Some(strategy) = strategy else {
        tracing::warn!("livecheck block without a strategy; dropping it");
        return Ok(None);
    };

    Ok(Some(Livecheck {
        url: url.unwrap_or(LivecheckSource::ManifestUrl),
        strategy,
    }))
}

fn parse_zap(stanza: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for caps in ZAP_KEY.captures_iter(stanza) {
        if &caps[1] == "rmdir" {
            // Only removes empty directories; not a purge target.
            tracing::debug!("skipping zap rmdir entries");
            continue;
        }
        paths.extend(QUOTED.captures_iter(&caps[2]).map(|q| unescape(&q[1])));
    }
    paths
}

fn bundle_candidate(component: &str) -> &str {
    BUNDLE_SUFFIXES
        .iter()
        .find_map(|s| component.strip_suffix(s))
        .unwrap_or(component)
}

/// Pick the most common reverse-domain component as the bundle id and
/// rewrite literal occurrences into placeholders.
fn templatize(token: &str, paths: Vec<String>) -> (Option<String>, Vec<String>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for path in &paths {
        for component in path.split('/') {
            let candidate = bundle_candidate(component);
            if BUNDLE_ID.is_match(candidate) {
                *counts.entry(candidate).or_default() += 1;
            }
        }
    }

    let bundle_id = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(id, _)| id.to_string());

    let rewritten = paths
        .iter()
        .map(|path| {
            path.split('/')
                .map(|component| rewrite_component(component, token, bundle_id.as_deref()))
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();

    (bundle_id, rewritten)
}

fn rewrite_component(component: &str, token: &str, bundle_id: Option<&str>) -> String {
    if let Some(rest) = bundle_id.and_then(|b| component.strip_prefix(b)) {
        if rest.is_empty() || rest.starts_with('.') {
            return format!("#{{bundle_id}}{rest}");
        }
    }
    if component == token {
        return "#{token}".to_string();
    }
    component.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_schema::Manifest;

    const CLEANPDF_RB: &str = r##"# Homebrew Cask formula for Clean PDF
# Copy this file to your homebrew-tap repository: Casks/cleanpdf.rb

cask "cleanpdf" do
  version "2.0.0"
  sha256 :no_check # Update with actual SHA256 after first release

  url "https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip"
  name "Clean PDF"
  desc "View and wipe metadata from PDF files"
  homepage "https://james-see.github.io/cleanpdfapp/"

  livecheck do
    url :url
    strategy :github_latest
  end

  app "CleanPDF.app"

  zap trash: [
    "~/Library/Application Support/us.jamescampbell.cleanpdf",
    "~/Library/Caches/us.jamescampbell.cleanpdf",
    "~/Library/Preferences/us.jamescampbell.cleanpdf.plist",
  ]
end
"##;

    #[test]
    fn imports_cleanpdf_cask() {
        let raw = parse_cask(CLEANPDF_RB).unwrap();
        assert_eq!(raw.token.as_deref(), Some("cleanpdf"));
        assert_eq!(raw.version.as_deref(), Some("2.0.0"));
        assert_eq!(raw.sha256.as_deref(), Some(NO_CHECK));
        assert_eq!(
            raw.url.as_deref(),
            Some("https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip")
        );
        assert_eq!(raw.name.as_deref(), Some("Clean PDF"));
        assert_eq!(raw.app.as_deref(), Some("CleanPDF.app"));
        assert_eq!(raw.bundle_id.as_deref(), Some("us.jamescampbell.cleanpdf"));
        assert_eq!(
            raw.livecheck,
            Some(Livecheck {
                url: LivecheckSource::ManifestUrl,
                strategy: LivecheckStrategy::GithubLatest,
            })
        );
        assert_eq!(
            raw.zap.as_ref().unwrap().trash,
            vec![
                "~/Library/Application Support/#{bundle_id}",
                "~/Library/Caches/#{bundle_id}",
                "~/Library/Preferences/#{bundle_id}.plist",
            ]
        );

        let manifest = Manifest::from_raw(raw).unwrap();
        assert!(manifest.is_unchecked());
    }

    #[test]
    fn imported_manifest_survives_toml_round_trip() {
        let raw = parse_cask(CLEANPDF_RB).unwrap();
        let text = crate::import::to_toml(&raw).unwrap();
        let reparsed = Manifest::parse(&text).unwrap();
        assert_eq!(reparsed, Manifest::from_raw(raw).unwrap());
    }

    #[test]
    fn digest_and_token_paths() {
        let digest = "A".repeat(64);
        let src = format!(
            r#"cask "tool" do
  version "1.2"
  sha256 "{digest}"
  url "https://example.com/tool-#{{version}}.dmg",
      verified: "example.com/"
  name "Tool"
  name "Tool Pro"
  app "Tool.app"
  zap trash: "~/Library/Logs/tool",
      rmdir: "~/Library/Tool"
end
"#
        );
        let raw = parse_cask(&src).unwrap();
        assert_eq!(raw.sha256.as_deref(), Some(digest.as_str()));
        assert_eq!(raw.name.as_deref(), Some("Tool"));
        assert!(raw.bundle_id.is_none());
        assert_eq!(raw.zap.unwrap().trash, vec!["~/Library/Logs/#{token}"]);
    }

    #[test]
    fn rejects_unsupported_forms() {
        let src = "cask \"x\" do\n  version :latest\nend\n";
        assert!(matches!(
            parse_cask(src),
            Err(ImportError::Unsupported { stanza: "version", line: 2, .. })
        ));

        let src = "cask \"x\" do\n  sha256 arm: \"a\", intel: \"b\"\nend\n";
        assert!(matches!(
            parse_cask(src),
            Err(ImportError::Unsupported { stanza: "sha256", .. })
        ));
    }

    #[test]
    fn reports_missing_stanza() {
        let src = "cask \"x\" do\n  version \"1\"\n  sha256 :no_check\n  url \"https://e.com/#{version}\"\n  name \"X\"\nend\n";
        assert!(matches!(parse_cask(src), Err(ImportError::MissingStanza("app"))));
        assert!(matches!(parse_cask(""), Err(ImportError::MissingStanza("cask"))));
    }

    #[test]
    fn nested_livecheck_blocks_are_skipped() {
        let src = r#"cask "x" do
  version "1"
  sha256 :no_check
  url "https://e.com/#{version}.zip"
  name "X"
  livecheck do
    url "https://e.com/appcast.xml"
    strategy :page_match do |page|
      page.scan(/v(\d+)/).map { |m| m[0] }
    end
  end
  app "X.app"
end
"#;
        let raw = parse_cask(src).unwrap();
        assert_eq!(
            raw.livecheck,
            Some(Livecheck {
                url: LivecheckSource::Url("https://e.com/appcast.xml".to_string()),
                strategy: LivecheckStrategy::PageMatch,
            })
        );
        assert_eq!(raw.app.as_deref(), Some("X.app"));
    }

    #[test]
    fn comments_inside_strings_survive() {
        assert_eq!(strip_comment(r#"url "a#{version}" # note"#), r#"url "a#{version}" "#);
    }
}
