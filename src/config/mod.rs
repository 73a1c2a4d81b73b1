//! Deployment configuration.
//!
//! The configuration is a JSON file read once at startup. It names the
//! install home, the database and security settings rendered into the
//! webapp, and the Tomcat service account and webapps location:
//!
//! ```json
//! {
//!   "home": "/root/aggregate-cli",
//!   "jdbc": { "host": "127.0.0.1", "port": 5432, "db": "aggregate",
//!             "schema": "aggregate", "user": "aggregate", "password": "aggregate" },
//!   "security": { "forceHttpsLinks": false, "port": 80, "securePort": 443 },
//!   "tomcat": { "uid": "tomcat8", "gid": "tomcat8", "webappsPath": "/var/lib/tomcat8/webapps" }
//! }
//! ```
//!
//! Every field is required except `tomcat.serviceName`, which defaults to
//! `tomcat8`. `home` and `webappsPath` may use `~` and `$VAR`.

pub mod state;
pub mod templates;

pub use state::StateFile;
pub use templates::ConfigurationRenderer;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    BACKUP_DIR_NAME, BACKUP_TIMESTAMP_FORMAT, DEFAULT_SERVICE_NAME, ROOT_WEBAPP_NAME,
    VERSION_FILE_NAME, WEBAPP_CLASSES_DIR,
};
use crate::core::AggregateError;
use crate::utils::expand_path;

/// Parsed contents of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfiguration {
    /// Base directory holding the state file and backups.
    pub home: PathBuf,
    pub jdbc: JdbcConfiguration,
    pub security: SecurityConfiguration,
    pub tomcat: TomcatConfiguration,
}

/// Database connection rendered into `jdbc.properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdbcConfiguration {
    pub host: String,
    pub port: u16,
    pub db: String,
    pub schema: String,
    pub user: String,
    pub password: String,
}

/// Server settings rendered into `security.properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfiguration {
    pub force_https_links: bool,
    pub port: u16,
    pub secure_port: u16,
}

/// Servlet container the webapp is deployed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TomcatConfiguration {
    /// Owner applied to the deployed files.
    pub uid: String,
    /// Group applied to the deployed files.
    pub gid: String,
    pub webapps_path: PathBuf,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

impl EnvironmentConfiguration {
    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::ConfigNotFound`] when the file doesn't exist
    /// - [`AggregateError::ConfigurationError`] when it can't be read, isn't
    ///   valid JSON, misses a field, or references an unset variable
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AggregateError::ConfigNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(AggregateError::ConfigurationError {
                    message: format!("Can't read {}: {e}", path.display()),
                }
                .into());
            }
        };

        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses configuration JSON and expands the configured paths.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(content).map_err(|e| AggregateError::ConfigurationError {
                message: format!("Can't parse the provided configuration file: {e}"),
            })?;

        config.home = expand_configured_path(&config.home, "home")?;
        config.tomcat.webapps_path =
            expand_configured_path(&config.tomcat.webapps_path, "tomcat.webappsPath")?;

        Ok(config)
    }

    /// Configuration shown to users as a starting point.
    pub fn example() -> Self {
        Self {
            home: PathBuf::from("/root/aggregate-cli"),
            jdbc: JdbcConfiguration {
                host: "127.0.0.1".to_string(),
                port: 5432,
                db: "aggregate".to_string(),
                schema: "aggregate".to_string(),
                user: "aggregate".to_string(),
                password: "aggregate".to_string(),
            },
            security: SecurityConfiguration {
                force_https_links: false,
                port: 80,
                secure_port: 443,
            },
            tomcat: TomcatConfiguration {
                uid: "tomcat8".to_string(),
                gid: "tomcat8".to_string(),
                webapps_path: PathBuf::from("/var/lib/tomcat8/webapps"),
                service_name: default_service_name(),
            },
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.home.join(BACKUP_DIR_NAME)
    }

    /// `<home>/backup/aggregate-YYYYMMDD-HHMMSS.zip`
    pub fn backup_file_path(&self, at: NaiveDateTime) -> PathBuf {
        self.backup_path()
            .join(format!("aggregate-{}.zip", at.format(BACKUP_TIMESTAMP_FORMAT)))
    }

    pub fn version_file_path(&self) -> PathBuf {
        self.home.join(VERSION_FILE_NAME)
    }

    /// Directory the webapp is deployed into.
    pub fn root_webapp_path(&self) -> PathBuf {
        self.tomcat.webapps_path.join(ROOT_WEBAPP_NAME)
    }

    pub fn jdbc_configuration_path(&self) -> PathBuf {
        self.root_webapp_path().join(WEBAPP_CLASSES_DIR).join("jdbc.properties")
    }

    pub fn security_configuration_path(&self) -> PathBuf {
        self.root_webapp_path().join(WEBAPP_CLASSES_DIR).join("security.properties")
    }

    pub fn state_file(&self) -> StateFile {
        StateFile::new(self.version_file_path())
    }
}

fn expand_configured_path(path: &Path, field: &str) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(AggregateError::ConfigurationError {
            message: format!("Field `{field}` can't be empty"),
        }
        .into());
    }
    let expanded = expand_path(&raw).map_err(|e| AggregateError::ConfigurationError {
        message: format!("Can't expand `{field}`: {e:#}"),
    })?;
    Ok(expanded)
}

/// Pretty-printed example configuration, used as a remediation hint.
pub fn configuration_template() -> String {
    serde_json::to_string_pretty(&EnvironmentConfiguration::example()).unwrap_or_default()
}
