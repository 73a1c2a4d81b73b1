//! Install and update pipelines.
//!
//! [`DeploymentOrchestrator`] runs one operation end to end:
//!
//! 1. **Validation**: superuser check, installed-state preconditions and
//!    target resolution. Nothing on disk changes before this passes.
//! 2. **Confirmation**: a summary is printed and the user must answer yes,
//!    unless always-yes mode is on. Any other answer cancels the run, which
//!    is not an error.
//! 3. **Stages**: the [`Stage`]s of the operation run strictly in order,
//!    each bracketed by its label and `done`. The first failing stage stops
//!    the pipeline. Completed stages are not rolled back, so a failure after
//!    `Stopping Tomcat` leaves the service stopped and the webapp as the
//!    failed stage left it.
//!
//! The installed version recorded in the state file changes only in the
//! `Finalized` stage, after the package and configuration are in place.

pub mod backup;
pub mod stage;

pub use backup::{BackupManager, BackupRecord};
pub use stage::Stage;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{ConfigurationRenderer, EnvironmentConfiguration};
use crate::core::{AggregateError, ExecutionContext};
use crate::releases::ReleaseSource;
use crate::releases::package::{download_package, extract_package};
use crate::selector::{ResolvedTarget, VersionIntent, VersionSelector};
use crate::utils::{ShellCommand, atomic_write, remove_dir_all};
use crate::version::VersionCode;

/// How a run ended, when it didn't fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Every stage succeeded and `version` is now installed.
    Completed {
        version: VersionCode,
        stages: Vec<Stage>,
    },
    /// The user declined at the confirmation prompt.
    Cancelled,
}

/// Runs install and update operations against one configuration.
pub struct DeploymentOrchestrator<'a, S> {
    ctx: &'a ExecutionContext,
    config: &'a EnvironmentConfiguration,
    source: &'a S,
}

impl<'a, S: ReleaseSource> DeploymentOrchestrator<'a, S> {
    pub const fn new(
        ctx: &'a ExecutionContext,
        config: &'a EnvironmentConfiguration,
        source: &'a S,
    ) -> Self {
        Self {
            ctx,
            config,
            source,
        }
    }

    /// Installs the target of `intent` on a host without a deployment.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::PrivilegeRequired`] when not running as root
    /// - [`AggregateError::AlreadyInstalled`] when a version is recorded and
    ///   `force` is false
    /// - selection errors, then the first stage failure
    pub async fn install(&self, intent: &VersionIntent, force: bool) -> Result<DeployOutcome> {
        self.ctx.require_superuser().await?;

        let state = self.config.state_file();
        if !force && let Some(installed) = state.read()? {
            return Err(AggregateError::AlreadyInstalled {
                version: installed.to_string(),
            }
            .into());
        }

        let target = self.resolve(intent).await?;

        self.ctx.out("Installing ODK Aggregate");
        self.ctx.out("");
        self.ctx.out("Please, read carefully:");
        self.ctx.out(
            "- The ROOT webapp will be replaced with the latest available Aggregate release or a custom build you provide.",
        );
        self.ctx.out("- Tomcat will be stopped during the whole process.");
        self.ctx.out("");
        self.ctx.out("Version information:");
        self.ctx.out(format!("- Selected for the installation: {} ({})", target.version, target.origin));
        self.ctx.out("");

        if !self.ctx.confirm("Are you ready to continue?").await? {
            info!("Installation cancelled by the user");
            return Ok(DeployOutcome::Cancelled);
        }

        self.ctx.out(format!("Installing Aggregate {} from {}", target.version, target.download_url));
        self.ctx.out("");

        self.run(&Stage::INSTALL, &target).await
    }

    /// Replaces the installed version with the target of `intent`, backing
    /// up the current deployment first.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::PrivilegeRequired`] when not running as root
    /// - [`AggregateError::NotInstalled`] when no version is recorded
    /// - [`AggregateError::NoActionNeeded`] when the target is already
    ///   installed and `force` is false
    /// - selection errors, then the first stage failure
    pub async fn update(&self, intent: &VersionIntent, force: bool) -> Result<DeployOutcome> {
        self.ctx.require_superuser().await?;

        let installed = self.config.state_file().read()?.ok_or(AggregateError::NotInstalled)?;
        let target = self.resolve(intent).await?;

        if installed == target.version && !force {
            return Err(AggregateError::NoActionNeeded {
                version: installed.to_string(),
            }
            .into());
        }

        self.ctx.out("Updating ODK Aggregate");
        self.ctx.out("");
        self.ctx.out("Please, read carefully:");
        self.ctx.out(format!(
            "- A backup of the currently deployed Aggregate will be created at {}",
            self.config.backup_path().display()
        ));
        self.ctx.out("- The ROOT webapp will be replaced with the selected Aggregate release.");
        self.ctx.out("- Tomcat will be stopped during the whole process.");
        self.ctx.out("");
        self.ctx.out("Version information:");
        self.ctx.out(format!("- Currently installed: {installed}"));
        self.ctx.out(format!("- Selected for the update: {} ({})", target.version, target.origin));
        self.ctx.out("");

        if !self.ctx.confirm("Are you ready to continue?").await? {
            info!("Update cancelled by the user");
            return Ok(DeployOutcome::Cancelled);
        }

        self.run(&Stage::UPDATE, &target).await
    }

    async fn resolve(&self, intent: &VersionIntent) -> Result<ResolvedTarget> {
        VersionSelector::new(self.source)
            .resolve(intent)
            .await
            .context("Failed to select the version to deploy")
    }

    async fn run(&self, stages: &[Stage], target: &ResolvedTarget) -> Result<DeployOutcome> {
        let mut completed = Vec::with_capacity(stages.len());

        for &stage in stages {
            self.ctx.stage_started(stage.label());
            debug!("Stage '{}' started", stage);

            if let Err(e) = self.run_stage(stage, target).await {
                let reason = format!("{e:#}");
                tracing::error!("Stage '{}' failed: {}", stage, reason);
                return Err(e.context(AggregateError::StageFailed {
                    stage: stage.label().to_string(),
                    reason,
                }));
            }

            self.ctx.stage_done();
            completed.push(stage);
        }

        info!("Aggregate {} deployed", target.version);
        Ok(DeployOutcome::Completed {
            version: target.version.clone(),
            stages: completed,
        })
    }

    async fn run_stage(&self, stage: Stage, target: &ResolvedTarget) -> Result<()> {
        let root = self.config.root_webapp_path();
        let service = &self.config.tomcat.service_name;

        match stage {
            Stage::BackingUp => {
                let record = BackupManager::for_configuration(self.config)
                    .backup(
                        &root,
                        &[
                            self.config.jdbc_configuration_path(),
                            self.config.security_configuration_path(),
                        ],
                        chrono::Local::now().naive_local(),
                    )
                    .await?;
                info!("Backup written to {} ({} entries)", record.archive.display(), record.entries);
            }
            Stage::Stopped => {
                self.ctx.execute(&ShellCommand::service_stop(service)).await?;
            }
            Stage::Cleaned => {
                let path = root.clone();
                tokio::task::spawn_blocking(move || remove_dir_all(&path))
                    .await
                    .context("Cleanup task panicked")??;
                debug!("Removed {}", root.display());
            }
            Stage::Deployed => {
                let package = download_package(&target.download_url).await?;
                extract_package(package.path(), &root).await?;
                package.cleanup();
            }
            Stage::Configured => {
                let renderer = ConfigurationRenderer::new()?;
                let jdbc = self.config.jdbc_configuration_path();
                atomic_write(&jdbc, renderer.render_jdbc(self.config)?.as_bytes())?;
                debug!("Wrote {}", jdbc.display());
                let security = self.config.security_configuration_path();
                atomic_write(&security, renderer.render_security(self.config)?.as_bytes())?;
                debug!("Wrote {}", security.display());
            }
            Stage::Finalized => {
                self.ctx
                    .execute(&ShellCommand::chown_recursive(
                        &self.config.tomcat.uid,
                        &self.config.tomcat.gid,
                        &root,
                    ))
                    .await?;
                self.config.state_file().write(&target.version)?;
            }
            Stage::Started => {
                self.ctx.execute(&ShellCommand::service_start(service)).await?;
            }
        }

        Ok(())
    }
}
