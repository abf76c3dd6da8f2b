//! End-to-end tests driving the `cask` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CLEANPDF_TOML: &str = r##"
token = "cleanpdf"
version = "2.0.0"
sha256 = "no_check"
url = "https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip"
name = "Clean PDF"
desc = "View and wipe metadata from PDF files"
homepage = "https://james-see.github.io/cleanpdfapp/"
app = "CleanPDF.app"
bundle_id = "us.jamescampbell.cleanpdf"

[livecheck]
url = "url"
strategy = "github_latest"

[zap]
trash = [
    "~/Library/Application Support/#{bundle_id}",
    "~/Library/Caches/#{bundle_id}",
    "~/Library/Preferences/#{bundle_id}.plist",
]
"##;

const CLEANPDF_RB: &str = r##"cask "cleanpdf" do
  version "2.0.0"
  sha256 :no_check

  url "https://github.com/james-see/cleanpdfapp/releases/download/v#{version}/CleanPDF-macos-v#{version}.zip"
  name "Clean PDF"
  desc "View and wipe metadata from PDF files"
  homepage "https://james-see.github.io/cleanpdfapp/"

  app "CleanPDF.app"

  zap trash: [
    "~/Library/Application Support/us.jamescampbell.cleanpdf",
    "~/Library/Preferences/us.jamescampbell.cleanpdf.plist",
  ]
end
"##;

/// Test context with an isolated HOME and applications directory
struct TestContext {
    temp_dir: TempDir,
    appdir: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let appdir = temp_dir.path().join("Applications");
        std::fs::create_dir_all(&appdir).expect("failed to create appdir");
        Self { temp_dir, appdir }
    }

    fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home().join(name);
        std::fs::write(&path, content).expect("failed to write fixture");
        path
    }

    fn manifest(&self) -> PathBuf {
        self.write("cleanpdf.toml", CLEANPDF_TOML)
    }

    fn cask_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cask"));
        cmd.env("HOME", self.home());
        cmd.env("CASK_HOME", self.home().join(".cask"));
        cmd.env("CASK_APPDIR", &self.appdir);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cask_cmd()
            .args(args)
            .output()
            .expect("failed to run cask")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_check_warns_about_no_check() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let output = ctx.run(&["check", arg(&manifest)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("cleanpdf"));
    assert!(stderr(&output).contains("no_check"));
}

#[test]
fn test_check_rejects_invalid_manifest() {
    let ctx = TestContext::new();
    let broken = CLEANPDF_TOML.replace("v#{version}/CleanPDF-macos-v#{version}", "latest/CleanPDF");
    let manifest = ctx.write("broken.toml", &broken);
    let output = ctx.run(&["check", arg(&manifest)]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("#{version}"));
}

#[test]
fn test_resolve_renders_requested_version() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let output = ctx.run(&["--quiet", "resolve", arg(&manifest), "--version", "2.1.0"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "https://github.com/james-see/cleanpdfapp/releases/download/v2.1.0/CleanPDF-macos-v2.1.0.zip"
    );
}

#[test]
fn test_resolve_stdout_is_only_the_url() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let output = ctx.run(&["resolve", arg(&manifest)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "https://github.com/james-see/cleanpdfapp/releases/download/v2.0.0/CleanPDF-macos-v2.0.0.zip\n"
    );
    let details = stderr(&output);
    assert!(details.contains("CleanPDF.app"));
    assert!(details.contains("CleanPDF-macos-v2.0.0.zip"));
}

#[test]
fn test_resolve_rejects_empty_version() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let output = ctx.run(&["resolve", arg(&manifest), "--version", " "]);
    assert!(!output.status.success());
}

#[test]
fn test_verify_fails_on_mismatch() {
    let ctx = TestContext::new();
    let digest = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    let pinned = CLEANPDF_TOML.replace(
        "sha256 = \"no_check\"",
        &format!("sha256 = \"{digest}\""),
    );
    let manifest = ctx.write("pinned.toml", &pinned);

    let good = ctx.write("good.zip", "hello world");
    let output = ctx.run(&["verify", arg(&manifest), arg(&good)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let bad = ctx.write("bad.zip", "hello world!");
    let output = ctx.run(&["verify", arg(&manifest), arg(&bad)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("mismatch"));
}

#[test]
fn test_verify_unchecked_warns() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let file = ctx.write("CleanPDF.zip", "anything");
    let output = ctx.run(&["verify", arg(&manifest), arg(&file)]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("NOT verified"));
}

#[test]
fn test_zap_removes_bundle_and_user_data() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();

    let bundle = ctx.appdir.join("CleanPDF.app");
    std::fs::create_dir_all(bundle.join("Contents")).unwrap();
    let support = ctx
        .home()
        .join("Library/Application Support/us.jamescampbell.cleanpdf");
    std::fs::create_dir_all(&support).unwrap();
    std::fs::write(support.join("state.json"), "{}").unwrap();
    let prefs = ctx
        .home()
        .join("Library/Preferences/us.jamescampbell.cleanpdf.plist");
    std::fs::create_dir_all(prefs.parent().unwrap()).unwrap();
    std::fs::write(&prefs, "plist").unwrap();

    // Dry run leaves everything in place
    let output = ctx.run(&["--dry-run", "zap", arg(&manifest)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("would remove"));
    assert!(bundle.exists() && support.exists() && prefs.exists());

    let output = ctx.run(&["zap", arg(&manifest)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!bundle.exists());
    assert!(!support.exists());
    assert!(!prefs.exists());

    // Second run finds nothing and still succeeds
    let output = ctx.run(&["zap", arg(&manifest)]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Nothing to zap"));
}

#[test]
fn test_uninstall_keeps_user_data() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();

    let bundle = ctx.appdir.join("CleanPDF.app");
    std::fs::create_dir_all(&bundle).unwrap();
    let caches = ctx.home().join("Library/Caches/us.jamescampbell.cleanpdf");
    std::fs::create_dir_all(&caches).unwrap();

    let output = ctx.run(&["uninstall", arg(&manifest)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!bundle.exists());
    assert!(caches.exists());
}

#[test]
fn test_livecheck_reports_release_endpoint() {
    let ctx = TestContext::new();
    let manifest = ctx.manifest();
    let output = ctx.run(&["livecheck", arg(&manifest), "--latest", "v2.1.0"]);

    assert!(output.status.success());
    assert!(
        stdout(&output)
            .contains("https://api.github.com/repos/james-see/cleanpdfapp/releases/latest")
    );
    assert!(stderr(&output).contains("outdated"));
}

#[test]
fn test_import_homebrew_cask() {
    let ctx = TestContext::new();
    let source = ctx.write("cleanpdf.rb", CLEANPDF_RB);
    let dest = ctx.home().join("imported.toml");

    let output = ctx.run(&["import", arg(&source), "-o", arg(&dest)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let manifest = cask_schema::Manifest::from_file(&dest).expect("imported manifest loads");
    assert_eq!(manifest.identifier().as_str(), "cleanpdf");
    assert_eq!(manifest.bundle_id(), Some("us.jamescampbell.cleanpdf"));
    assert!(manifest.is_unchecked());

    // Refuses to overwrite
    let output = ctx.run(&["import", arg(&source), "-o", arg(&dest)]);
    assert!(!output.status.success());
}

#[test]
fn test_hash_command() {
    let ctx = TestContext::new();
    let file = ctx.write("test.txt", "hello world");
    let output = ctx.run(&["hash", arg(&file)]);

    assert!(output.status.success());
    assert!(
        stdout(&output)
            .starts_with("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
    );
}
