use aggregate_cli::cli::common::DeployArgs;
use aggregate_cli::cli::install::InstallCommand;
use aggregate_cli::core::AggregateError;
use aggregate_cli::deploy::{DeployOutcome, Stage};
use aggregate_cli::test_utils::{StaticReleases, TestDeployment};
use aggregate_cli::version::VersionCode;
use mockito::Server;

use crate::{aggregate_war, test_context, test_context_with};

fn install_command(deployment: &TestDeployment) -> InstallCommand {
    InstallCommand {
        deploy: DeployArgs {
            configuration: deployment.config_path.clone(),
            force: false,
            always_yes: false,
            include_pre_releases: false,
        },
        custom_url: None,
        custom_version: None,
    }
}

#[tokio::test]
async fn test_install_custom_build() {
    let deployment = TestDeployment::new();
    let mut server = Server::new_async().await;
    let war = server
        .mock("GET", "/builds/aggregate.war")
        .with_status(200)
        .with_body(aggregate_war("v2.0.4-beta.0"))
        .create_async()
        .await;

    let mut command = install_command(&deployment);
    command.custom_url = Some(format!("{}/builds/aggregate.war", server.url()));
    command.custom_version = Some("v2.0.4-beta.0".to_string());

    let (ctx, runner, prompter) = test_context(&["yes"]);
    // Custom builds never touch the catalog
    let source = StaticReleases::unreachable();

    let outcome = command.execute_with(&ctx, &source).await.unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Completed {
            version: VersionCode::parse("v2.0.4-beta.0").unwrap(),
            stages: Stage::INSTALL.to_vec(),
        }
    );
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(prompter.prompts(), ["Are you ready to continue? (yes/NO): "]);
    war.assert_async().await;

    let root = deployment.root();
    assert_eq!(
        runner.commands(),
        [
            "whoami".to_string(),
            "service tomcat8 stop".to_string(),
            format!("chown -R tomcat8:tomcat8 {}", root.display()),
            "service tomcat8 start".to_string(),
        ]
    );

    assert_eq!(std::fs::read_to_string(root.join("index.html")).unwrap(), "Aggregate v2.0.4-beta.0");
    let jdbc = std::fs::read_to_string(deployment.config.jdbc_configuration_path()).unwrap();
    assert!(jdbc.contains("jdbc.url=jdbc:postgresql://127.0.0.1:5432/aggregate"));
    let security = std::fs::read_to_string(deployment.config.security_configuration_path()).unwrap();
    assert!(security.contains("security.server.securePort=443"));
    // The packaged files next to the rendered ones survive
    assert!(root.join("WEB-INF/classes/logging.properties").exists());

    assert_eq!(deployment.installed_version().as_deref(), Some("v2.0.4-beta.0"));
    // Install never backs up
    assert!(deployment.backups().is_empty());
}

#[tokio::test]
async fn test_install_refuses_existing_deployment() {
    let deployment = TestDeployment::new().with_installed("v2.0.0");
    let (ctx, runner, prompter) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let err = install_command(&deployment).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::AlreadyInstalled { version }) if version == "v2.0.0"
    ));
    assert!(runner.side_effects().is_empty());
    assert!(prompter.prompts().is_empty());
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_install_cancelled_at_prompt() {
    let deployment = TestDeployment::new();
    let (ctx, runner, prompter) = test_context(&["no"]);
    let source = StaticReleases::new(&[("v2.0.3", false), ("v2.1.0-beta.0", true)]);

    let outcome = install_command(&deployment).execute_with(&ctx, &source).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Cancelled);
    assert_eq!(prompter.prompts().len(), 1);
    assert!(runner.side_effects().is_empty());
    assert!(!deployment.root().exists());
    assert_eq!(deployment.installed_version(), None);
}

#[tokio::test]
async fn test_install_unrecognized_answers_then_end_of_input_cancels() {
    let deployment = TestDeployment::new();
    let (ctx, runner, prompter) = test_context(&["maybe", "later"]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let outcome = install_command(&deployment).execute_with(&ctx, &source).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Cancelled);
    assert_eq!(prompter.prompts().len(), 3);
    assert!(runner.side_effects().is_empty());
}

#[tokio::test]
async fn test_install_requires_superuser() {
    let deployment = TestDeployment::new();
    let (ctx, runner, prompter) =
        test_context_with(aggregate_cli::test_utils::RecordingRunner::new().identity("odk"), &["yes"]);
    let source = StaticReleases::new(&[("v2.0.3", false)]);

    let err = install_command(&deployment).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::PrivilegeRequired { identity }) if identity == "odk"
    ));
    assert_eq!(runner.commands(), ["whoami"]);
    assert!(prompter.prompts().is_empty());
}

#[tokio::test]
async fn test_install_custom_url_without_version() {
    let deployment = TestDeployment::new();
    let mut command = install_command(&deployment);
    command.custom_url = Some("https://example.org/aggregate.war".to_string());

    let (ctx, runner, _) = test_context(&["yes"]);
    let err = command.execute_with(&ctx, &StaticReleases::unreachable()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::MissingPairedArgument { .. })
    ));
    // Rejected before anything runs, even the identity query
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_install_without_releases() {
    let deployment = TestDeployment::new();
    let (ctx, runner, prompter) = test_context(&["yes"]);
    let source = StaticReleases::new(&[("v1.4.15", false), ("v2.1.0-beta.0", true)]);

    let err = install_command(&deployment).execute_with(&ctx, &source).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AggregateError>(),
        Some(AggregateError::NoReleasesFound)
    ));
    assert!(runner.side_effects().is_empty());
    assert!(prompter.prompts().is_empty());
}
