//! On-disk fixtures.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::config::EnvironmentConfiguration;

/// Builds an in-memory WAR (zip) package from `(path, content)` entries.
pub fn war_fixture(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A throwaway host layout: a home directory, a Tomcat webapps directory and
/// a configuration file pointing at both.
pub struct TestDeployment {
    pub temp: TempDir,
    pub config: EnvironmentConfiguration,
    pub config_path: PathBuf,
}

impl TestDeployment {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let webapps = temp.path().join("webapps");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&webapps).unwrap();

        let mut config = EnvironmentConfiguration::example();
        config.home = home;
        config.tomcat.webapps_path = webapps;

        let config_path = temp.path().join("aggregate-cli.json");
        std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        Self {
            temp,
            config,
            config_path,
        }
    }

    /// Simulates an existing deployment of `version` with a marker page and
    /// both configuration files.
    pub fn with_installed(self, version: &str) -> Self {
        let classes = self.config.jdbc_configuration_path().parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&classes).unwrap();
        std::fs::write(self.root().join("index.html"), format!("Aggregate {version}")).unwrap();
        std::fs::write(self.config.jdbc_configuration_path(), "jdbc.schema=previous\n").unwrap();
        std::fs::write(self.config.security_configuration_path(), "security.server.port=80\n")
            .unwrap();
        std::fs::write(self.config.version_file_path(), version).unwrap();
        self
    }

    pub fn root(&self) -> PathBuf {
        self.config.root_webapp_path()
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Content of the state file, if any.
    pub fn installed_version(&self) -> Option<String> {
        std::fs::read_to_string(self.config.version_file_path()).ok()
    }

    /// Files currently in the backup directory.
    pub fn backups(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.config.backup_path()) {
            Ok(entries) => {
                let mut paths: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
                paths.sort();
                paths
            }
            Err(_) => Vec::new(),
        }
    }
}

impl Default for TestDeployment {
    fn default() -> Self {
        Self::new()
    }
}
