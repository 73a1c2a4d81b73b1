use assert_cmd::Command;
use mockito::Server;
use predicates::prelude::*;
use tempfile::TempDir;

fn aggregate_cli() -> Command {
    let mut cmd = Command::cargo_bin("aggregate-cli").unwrap();
    cmd.env_remove("AGGREGATE_CLI_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_operations() {
    aggregate_cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_missing_configuration_prints_template() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nowhere.json");

    aggregate_cli()
        .args(["install", "-c"])
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("\"webappsPath\""))
        .stderr(predicate::str::contains("Need help? Ask at https://forum.getodk.org/c/support"));
}

#[test]
fn test_configuration_path_from_environment() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("from-env.json");

    aggregate_cli()
        .arg("update")
        .env("AGGREGATE_CLI_CONFIG", &missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("from-env.json"));
}

#[test]
fn test_invalid_configuration() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("conf.json");
    std::fs::write(&config, r#"{"home": "/tmp"}"#).unwrap();

    aggregate_cli()
        .args(["update", "-c"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_custom_url_requires_custom_version() {
    aggregate_cli()
        .args(["install", "-c", "/does/not/matter.json", "--custom-url", "https://example.org/a.war"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--custom-url requires --custom-version"));
}

#[test]
fn test_invalid_requested_version() {
    aggregate_cli()
        .args(["update", "-c", "/does/not/matter.json", "-r", "latest"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--requested-version"));
}

#[test]
fn test_update_rejects_custom_url() {
    aggregate_cli()
        .args(["update", "-c", "/does/not/matter.json", "--custom-url", "https://example.org/a.war"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--custom-url"));
}

#[test]
fn test_list_from_overridden_endpoint() {
    let mut server = Server::new();
    server
        .mock("GET", "/releases")
        .with_status(200)
        .with_body(
            r#"[
                {"tag_name": "v2.0.3", "prerelease": false, "draft": false, "published_at": "2019-05-14T10:30:00Z"},
                {"tag_name": "v2.1.0-beta.0", "prerelease": true, "draft": false, "published_at": "2019-06-01T08:00:00Z"}
            ]"#,
        )
        .expect(2)
        .create();
    let endpoint = format!("{}/releases", server.url());

    aggregate_cli()
        .arg("list")
        .env("AGGREGATE_CLI_RELEASES_URL", &endpoint)
        .assert()
        .success()
        .stdout(predicate::str::contains("v2.0.3"))
        .stdout(predicate::str::contains("2019-05-14 10:30 UTC"))
        .stdout(predicate::str::contains("v2.1.0-beta.0").not());

    aggregate_cli()
        .args(["list", "--include-pre-releases"])
        .env("AGGREGATE_CLI_RELEASES_URL", &endpoint)
        .assert()
        .success()
        .stdout(predicate::str::contains("v2.1.0-beta.0"));
}

#[test]
fn test_list_without_releases() {
    let mut server = Server::new();
    server.mock("GET", "/releases").with_status(200).with_body("[]").create();

    aggregate_cli()
        .arg("list")
        .env("AGGREGATE_CLI_RELEASES_URL", format!("{}/releases", server.url()))
        .assert()
        .success()
        .stdout(predicate::str::contains("No releases are available"));
}
