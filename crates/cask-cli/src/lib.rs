//! cask - resolve, verify and purge macOS application casks
//!
//! Thin command-line front end over `cask-core`. The tool never downloads
//! anything itself: it renders download URLs, verifies files fetched by
//! another program, and removes installed bundles and their user data.
//!
//! # Manifest lifecycle
//!
//! ```text
//! Pending --resolve--> Resolved --verify--> Checked --> Installed --zap--> purged
//! ```

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cask")]
#[command(author, version, about = "cask - resolve, verify and purge macOS application casks")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a manifest and print a summary
    Check {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
    },
    /// Render the download URL for a version
    Resolve {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
        /// Version to render (defaults to the manifest's version)
        #[arg(long)]
        version: Option<String>,
    },
    /// Verify a downloaded file against the manifest's checksum
    Verify {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
        /// Downloaded artifact
        file: PathBuf,
        /// Version the file was downloaded for
        #[arg(long)]
        version: Option<String>,
    },
    /// Remove the installed application bundle only
    Uninstall {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
        /// Applications directory
        #[arg(long, env = "CASK_APPDIR")]
        appdir: Option<PathBuf>,
    },
    /// Remove the application bundle and all of its user data
    Zap {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
        /// Applications directory
        #[arg(long, env = "CASK_APPDIR")]
        appdir: Option<PathBuf>,
    },
    /// Show where new versions are discovered
    Livecheck {
        /// Path to the manifest (.toml)
        manifest: PathBuf,
        /// Compare against this upstream tag or version
        #[arg(long)]
        latest: Option<String>,
    },
    /// Convert a Homebrew cask (.rb) into a manifest
    Import {
        /// Homebrew cask file
        source: PathBuf,
        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the SHA256 of files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
