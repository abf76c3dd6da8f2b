//! cask - resolve, verify and purge macOS application casks

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cask_cli::cmd;
use cask_cli::ui::Output;
use cask_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dry_run = cli.dry_run;
    let output = Output::new(cli.quiet);

    match cli.command {
        Commands::Check { manifest } => cmd::check::check(&manifest, &output),
        Commands::Resolve { manifest, version } => {
            cmd::resolve::resolve(&manifest, version.as_deref(), &output)
        }
        Commands::Verify {
            manifest,
            file,
            version,
        } => cmd::verify::verify(&manifest, &file, version.as_deref(), &output),
        Commands::Uninstall { manifest, appdir } => {
            cmd::remove::uninstall(&manifest, appdir.as_deref(), dry_run, &output)
        }
        Commands::Zap { manifest, appdir } => {
            cmd::remove::zap(&manifest, appdir.as_deref(), dry_run, &output)
        }
        Commands::Livecheck { manifest, latest } => {
            cmd::livecheck::livecheck(&manifest, latest.as_deref(), &output)
        }
        Commands::Import { source, output: out } => {
            cmd::import::import(&source, out.as_deref(), dry_run, &output)
        }
        Commands::Hash { files } => cmd::hash::hash(&files),
    }
}
