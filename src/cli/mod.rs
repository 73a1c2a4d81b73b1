//! Command-line interface.
//!
//! ```text
//! aggregate-cli install -c conf.json [--force] [--yes] [--include-pre-releases]
//!                       [--custom-url URL --custom-version VERSION]
//! aggregate-cli update  -c conf.json [--force] [--yes] [--include-pre-releases]
//!                       [--requested-version VERSION]
//! aggregate-cli list    [--include-pre-releases]
//! ```
//!
//! `--verbose` is global and raises the log level to `debug`. `RUST_LOG`
//! overrides it. Logs go to stderr.

pub mod common;
pub mod install;
pub mod list;
pub mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::deploy::DeployOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "aggregate-cli",
    about = "Install and update ODK Aggregate",
    version,
    long_about = "Installs ODK Aggregate releases into Tomcat, updates them with a backup of the \
                  current deployment, and lists the releases available for installation."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install ODK Aggregate.
    Install(install::InstallCommand),
    /// Update ODK Aggregate, backing up the current deployment first.
    Update(update::UpdateCommand),
    /// List available versions.
    List(list::ListCommand),
}

impl Cli {
    /// Sets up the global tracing subscriber.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .try_init();
    }

    pub async fn execute(self) -> Result<()> {
        let outcome = match self.command {
            Commands::Install(cmd) => cmd.execute(self.verbose).await?,
            Commands::Update(cmd) => cmd.execute(self.verbose).await?,
            Commands::List(cmd) => return cmd.execute().await,
        };

        match outcome {
            DeployOutcome::Completed {
                version,
                stages,
            } => {
                tracing::debug!("Completed {} stages", stages.len());
                println!();
                println!("Aggregate {version} is ready");
            }
            DeployOutcome::Cancelled => {
                tracing::debug!("Operation cancelled");
            }
        }
        Ok(())
    }
}
