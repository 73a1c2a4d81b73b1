//! Arguments shared by the deploying commands.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::EnvironmentConfiguration;
use crate::constants::CONFIG_PATH_ENV;
use crate::core::ExecutionContext;
use crate::version::VersionCode;

/// Flags accepted by both `install` and `update`.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "PATH", env = CONFIG_PATH_ENV)]
    pub configuration: PathBuf,

    /// Deploy even when the selected version is already installed.
    #[arg(short, long)]
    pub force: bool,

    /// Answer yes to every confirmation prompt.
    #[arg(short = 'y', long = "yes")]
    pub always_yes: bool,

    /// Consider pre-release versions too.
    #[arg(short = 'p', long)]
    pub include_pre_releases: bool,
}

impl DeployArgs {
    pub async fn load_configuration(&self) -> Result<EnvironmentConfiguration> {
        EnvironmentConfiguration::load(&self.configuration).await
    }

    /// System execution context honouring these flags.
    pub fn execution_context(&self, verbose: bool) -> ExecutionContext {
        ExecutionContext::system().verbose(verbose).always_yes(self.always_yes)
    }
}

/// Parses a user-supplied version. Unlike catalog tags, it must follow the
/// version grammar.
pub fn parse_version_argument(flag: &str, value: Option<&str>) -> Result<Option<VersionCode>> {
    value
        .map(|literal| {
            VersionCode::parse(literal).with_context(|| format!("Invalid value for {flag}"))
        })
        .transpose()
}
