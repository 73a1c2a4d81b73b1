//! `update`: replace the installed Aggregate with another release.

use anyhow::Result;
use clap::Args;

use crate::cli::common::{DeployArgs, parse_version_argument};
use crate::core::ExecutionContext;
use crate::deploy::{DeployOutcome, DeploymentOrchestrator};
use crate::releases::{ReleaseCatalog, ReleaseSource};
use crate::selector::VersionIntent;

#[derive(Args, Debug, Clone)]
pub struct UpdateCommand {
    #[command(flatten)]
    pub deploy: DeployArgs,

    /// Version to update to. Defaults to the latest release.
    #[arg(short, long, value_name = "VERSION")]
    pub requested_version: Option<String>,
}

impl UpdateCommand {
    pub async fn execute(self, verbose: bool) -> Result<DeployOutcome> {
        let ctx = self.deploy.execution_context(verbose);
        let catalog = ReleaseCatalog::new()?;
        self.execute_with(&ctx, &catalog).await
    }

    pub async fn execute_with<S: ReleaseSource>(
        self,
        ctx: &ExecutionContext,
        source: &S,
    ) -> Result<DeployOutcome> {
        let requested =
            parse_version_argument("--requested-version", self.requested_version.as_deref())?;
        let intent = VersionIntent::latest(self.deploy.include_pre_releases).with_requested(requested);

        let config = self.deploy.load_configuration().await?;
        DeploymentOrchestrator::new(ctx, &config, source).update(&intent, self.deploy.force).await
    }
}
