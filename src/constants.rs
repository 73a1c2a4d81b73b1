//! Global constants used throughout the aggregate-cli codebase.
//!
//! Remote endpoints, request headers, file names and the single network
//! timeout live here so they can be found in one place.

use std::time::Duration;

/// GitHub API endpoint listing every published Aggregate release.
pub const RELEASES_ENDPOINT: &str = "https://api.github.com/repos/getodk/aggregate/releases";

/// Environment variable overriding [`RELEASES_ENDPOINT`].
pub const RELEASES_ENDPOINT_ENV: &str = "AGGREGATE_CLI_RELEASES_URL";

/// Environment variable holding the configuration path when `-c` is omitted.
pub const CONFIG_PATH_ENV: &str = "AGGREGATE_CLI_CONFIG";

/// `Accept` header sent to the GitHub releases API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// `User-Agent` header sent with every HTTP request.
pub const USER_AGENT: &str = "Aggregate Updater";

/// Download URL of a release package. `{version}` is replaced by the release
/// tag literal in both places.
pub const PACKAGE_DOWNLOAD_URL_TEMPLATE: &str =
    "https://github.com/getodk/aggregate/releases/download/{version}/ODK-Aggregate-{version}.war";

/// Connect and read timeout for the release catalog request (10 seconds).
///
/// This is the only timeout applied by the tool; external commands and the
/// package download run until they finish.
pub const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum major version this tool can install.
pub const MIN_UPDATEABLE_MAJOR: u32 = 2;

/// Name of the state file recording the deployed version, inside `home`.
pub const VERSION_FILE_NAME: &str = "aggregate.version";

/// Directory receiving backups, inside `home`.
pub const BACKUP_DIR_NAME: &str = "backup";

/// Name of the deployed webapp directory, inside `webappsPath`.
pub const ROOT_WEBAPP_NAME: &str = "ROOT";

/// Directory holding the webapp configuration files, relative to the webapp.
pub const WEBAPP_CLASSES_DIR: &str = "WEB-INF/classes";

/// Service unit controlled by the deployment when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "tomcat8";

/// Identity the pipeline must run as.
pub const SUPERUSER: &str = "root";

/// Format of the timestamp embedded in backup archive names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Where users can ask for help, printed after failures.
pub const SUPPORT_URL: &str = "https://forum.getodk.org/c/support";
