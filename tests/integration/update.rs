use aggregate_cli::cli::common::DeployArgs;
use aggregate_cli::cli::update::UpdateCommand;
use aggregate_cli::core::AggregateError;
use aggregate_cli::deploy::{DeployOutcome, DeploymentOrchestrator, Stage};
use aggregate_cli::selector::VersionIntent;
use aggregate_cli::test_utils::{RecordingRunner, StaticReleases, TestDeployment};
use aggregate_cli::version::VersionCode;
use mockito::{Server, ServerGuard};
use std::io::Read;
use std::path::PathBuf;

use crate::{aggregate_war, test_context, test_context_with};

fn update_command(deployment: &TestDeployment, requested: Option<&str>) -> UpdateCommand {
    UpdateCommand {
        deploy: DeployArgs {
            configuration: deployment.config_path.clone(),
            force: false,
            always_yes: false,
            include_pre_releases: false,
        },
        requested_version: requested.map(str::to_string),
    }
}

fn custom_intent(version: &str, url: String) -> VersionIntent {
    VersionIntent::latest(false)
        .with_custom(Some(VersionCode::parse(version).unwrap()), Some(url))
        .unwrap()
}

async fn serve_war(version: &str) -> (ServerGuard, String) {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/aggregate.war")
        .with_status(200)
        .with_body(aggregate_war(version))
        .create_async()
        .await;
    let url = format!("{}/aggregate.war", server.url());
    (server, url)
}

fn backup_archive(deployment: &TestDeployment) -> PathBuf {
    let archives: Vec<PathBuf> = deployment
        .backups()
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "zip"))
        .collect();
    assert_eq!(archives.len(), 1, "expected exactly one backup archive");
    archives.into_iter().next().unwrap()
}

fn is_stage_failure(err: &anyhow::Error, label: &str) -> bool {
    matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::StageFailed { stage, .. }) if stage == label
    )
}

#[tokio::test]
async fn test_update_backs_up_before_replacing() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (_server, url) = serve_war("v2.0.3").await;
    let (ctx, runner, _) = test_context(&["y"]);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let outcome = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", url), false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Completed {
            version: VersionCode::parse("v2.0.3").unwrap(),
            stages: Stage::UPDATE.to_vec(),
        }
    );

    // The archive holds the previous deployment
    let archive_path = backup_archive(&deployment);
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
    let mut previous = String::new();
    archive.by_name("ROOT/index.html").unwrap().read_to_string(&mut previous).unwrap();
    assert_eq!(previous, "Aggregate v2.0.0");

    // and was written before the new package landed
    let archived_at = std::fs::metadata(&archive_path).unwrap().modified().unwrap();
    let deployed_at = std::fs::metadata(deployment.root().join("index.html")).unwrap().modified().unwrap();
    assert!(archived_at <= deployed_at);

    // Configuration files are copied next to the archive
    let stem = archive_path.file_stem().unwrap().to_owned();
    let copied_jdbc = deployment.config.backup_path().join(stem).join("jdbc.properties");
    assert_eq!(std::fs::read_to_string(copied_jdbc).unwrap(), "jdbc.schema=previous\n");

    assert_eq!(
        std::fs::read_to_string(deployment.root().join("index.html")).unwrap(),
        "Aggregate v2.0.3"
    );
    let jdbc = std::fs::read_to_string(deployment.config.jdbc_configuration_path()).unwrap();
    assert!(jdbc.contains("jdbc.schema=aggregate"));
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.3"));
    assert_eq!(
        runner.side_effects(),
        [
            "service tomcat8 stop".to_string(),
            format!("chown -R tomcat8:tomcat8 {}", deployment.root().display()),
            "service tomcat8 start".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_update_to_installed_version_does_nothing() {
    let deployment = TestDeployment::new().with_installed("v2.0.3");
    let (ctx, runner, prompter) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false), ("v2.0.2", false)]);

    let err = update_command(&deployment, None).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::NoActionNeeded { version }) if version == "v2.0.3"
    ));
    assert!(runner.side_effects().is_empty());
    assert!(prompter.prompts().is_empty());
    assert!(deployment.backups().is_empty());
    assert_eq!(
        std::fs::read_to_string(deployment.root().join("index.html")).unwrap(),
        "Aggregate v2.0.3"
    );
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.3"));
}

#[tokio::test]
async fn test_update_legacy_state_file_compares_by_version() {
    // A state file without the leading "v" still names the same version
    let deployment = TestDeployment::new().with_installed("2.0.3");
    let (ctx, runner, _) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let err = update_command(&deployment, None).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::NoActionNeeded { .. })
    ));
    assert!(runner.side_effects().is_empty());
}

#[tokio::test]
async fn test_update_without_installation() {
    let deployment = TestDeployment::new();
    let (ctx, runner, _) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let err = update_command(&deployment, None).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::NotInstalled)
    ));
    assert!(runner.side_effects().is_empty());
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_update_requested_version_unavailable() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (ctx, runner, prompter) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false), ("v2.0.2", false), ("v2.1.0-beta.0", true)]);

    // Pre-releases are filtered out before the requested version is matched
    let err = update_command(&deployment, Some("v2.1.0-beta.0"))
        .execute_with(&ctx, &source)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::RequestedVersionUnavailable { requested, .. }) if requested == "v2.1.0-beta.0"
    ));
    assert!(runner.side_effects().is_empty());
    assert!(prompter.prompts().is_empty());
}

#[tokio::test]
async fn test_update_declined_leaves_deployment_untouched() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (ctx, runner, prompter) = test_context(&[""]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let outcome = update_command(&deployment, None).execute_with(&ctx, &source).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Cancelled);
    assert_eq!(prompter.prompts().len(), 1);
    assert!(runner.side_effects().is_empty());
    assert!(deployment.backups().is_empty());
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.0"));
}

#[tokio::test]
async fn test_update_stops_at_failed_download() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let mut server = Server::new_async().await;
    server.mock("GET", "/missing.war").with_status(404).create_async().await;

    let (ctx, runner, _) = test_context(&["yes"]);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let err = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", format!("{}/missing.war", server.url())), false)
        .await
        .unwrap_err();

    assert!(is_stage_failure(&err, "Deploying Aggregate"));
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<AggregateError>(),
        Some(AggregateError::NetworkError { .. })
    )));

    // Nothing after the failed stage ran
    assert_eq!(runner.side_effects(), ["service tomcat8 stop"]);
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.0"));
    // No rollback: the backup stays and the webapp is gone
    assert_eq!(deployment.backups().len(), 2);
    assert!(!deployment.root().join("index.html").exists());
}

#[tokio::test]
async fn test_update_failed_start_after_finalizing() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (_server, url) = serve_war("v2.0.3").await;
    let (ctx, runner, _) =
        test_context_with(RecordingRunner::new().fail_on("service tomcat8 start", 3), &["yes"]);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let err = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", url), false)
        .await
        .unwrap_err();

    assert!(is_stage_failure(&err, "Starting Tomcat"));
    assert!(err.chain().any(|cause| matches!(
        cause.downcast_ref::<AggregateError>(),
        Some(AggregateError::CommandFailed { .. })
    )));
    assert_eq!(runner.side_effects().last().map(String::as_str), Some("service tomcat8 start"));
    // The state file was written by the preceding stage
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.3"));
}

#[tokio::test]
async fn test_update_failed_chown_keeps_recorded_version() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (_server, url) = serve_war("v2.0.3").await;
    let chown = format!("chown -R tomcat8:tomcat8 {}", deployment.root().display());
    let (ctx, runner, _) = test_context_with(RecordingRunner::new().fail_on(&chown, 1), &["yes"]);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let err = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", url), false)
        .await
        .unwrap_err();

    assert!(is_stage_failure(&err, "Completing installation & cleanup"));
    assert!(!runner.side_effects().contains(&"service tomcat8 start".to_string()));
    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.0"));
}

#[tokio::test]
async fn test_update_stop_failure_is_ignored() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (_server, url) = serve_war("v2.0.3").await;
    let (ctx, runner, _) =
        test_context_with(RecordingRunner::new().fail_on("service tomcat8 stop", 1), &["yes"]);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let outcome = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", url), false)
        .await
        .unwrap();

    assert!(matches!(outcome, DeployOutcome::Completed { .. }));
    assert_eq!(runner.side_effects().len(), 3);
}

#[tokio::test]
async fn test_forced_update_redeploys_installed_version() {
    let deployment = TestDeployment::new().with_installed("v2.0.3");
    let (_server, url) = serve_war("v2.0.3").await;
    let (ctx, _, _) = test_context(&[]);
    let ctx = ctx.always_yes(true);
    let config = deployment.config.clone();
    let source = StaticReleases::unreachable();

    let outcome = DeploymentOrchestrator::new(&ctx, &config, &source)
        .update(&custom_intent("v2.0.3", url), true)
        .await
        .unwrap();

    assert!(matches!(outcome, DeployOutcome::Completed { .. }));
    assert_eq!(backup_archive(&deployment).parent(), Some(deployment.config.backup_path().as_path()));
}
