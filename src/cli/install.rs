//! `install`: deploy Aggregate on a host that doesn't have it yet.

use anyhow::Result;
use clap::Args;

use crate::cli::common::{DeployArgs, parse_version_argument};
use crate::core::ExecutionContext;
use crate::deploy::{DeployOutcome, DeploymentOrchestrator};
use crate::releases::{ReleaseCatalog, ReleaseSource};
use crate::selector::VersionIntent;

#[derive(Args, Debug, Clone)]
pub struct InstallCommand {
    #[command(flatten)]
    pub deploy: DeployArgs,

    /// URL of a custom Aggregate WAR package. Requires --custom-version.
    #[arg(long, value_name = "URL")]
    pub custom_url: Option<String>,

    /// Version the custom package corresponds to. Requires --custom-url.
    #[arg(long, value_name = "VERSION")]
    pub custom_version: Option<String>,
}

impl InstallCommand {
    pub async fn execute(self, verbose: bool) -> Result<DeployOutcome> {
        let ctx = self.deploy.execution_context(verbose);
        let catalog = ReleaseCatalog::new()?;
        self.execute_with(&ctx, &catalog).await
    }

    /// Runs the installation with explicit capabilities.
    pub async fn execute_with<S: ReleaseSource>(
        self,
        ctx: &ExecutionContext,
        source: &S,
    ) -> Result<DeployOutcome> {
        let custom_version = parse_version_argument("--custom-version", self.custom_version.as_deref())?;
        let intent = VersionIntent::latest(self.deploy.include_pre_releases)
            .with_custom(custom_version, self.custom_url)?;

        let config = self.deploy.load_configuration().await?;
        DeploymentOrchestrator::new(ctx, &config, source).install(&intent, self.deploy.force).await
    }
}
