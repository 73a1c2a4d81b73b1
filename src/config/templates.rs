//! Rendering of the webapp configuration files.
//!
//! `jdbc.properties` and `security.properties` are produced from Tera
//! templates fed with the matching section of the configuration file.

use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use crate::config::EnvironmentConfiguration;

const JDBC_TEMPLATE_NAME: &str = "jdbc.properties";
const SECURITY_TEMPLATE_NAME: &str = "security.properties";

const JDBC_TEMPLATE: &str = "\
jdbc.driverClassName=org.postgresql.Driver
jdbc.resourceName=jdbc/odk_aggregate
jdbc.url=jdbc:postgresql://{{ host }}:{{ port }}/{{ db }}?autoDeserialize=true
jdbc.username={{ user }}
jdbc.password={{ password }}
jdbc.schema={{ schema }}
";

const SECURITY_TEMPLATE: &str = "\
security.server.deviceAuthentication=digest
security.server.secureChannelType=ANY_CHANNEL
security.server.channelType=ANY_CHANNEL
security.server.forceHttpsLinks={{ forceHttpsLinks }}
security.server.hostname=
security.server.port={{ port }}
security.server.securePort={{ securePort }}
security.server.superUserUsername=administrator
security.server.realm.realmString=ODK Aggregate
security.server.checkHostnames=false
";

/// Renders the configuration files deployed with the webapp.
pub struct ConfigurationRenderer {
    tera: Tera,
}

impl ConfigurationRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        // Passwords must be written verbatim
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(vec![
            (JDBC_TEMPLATE_NAME, JDBC_TEMPLATE),
            (SECURITY_TEMPLATE_NAME, SECURITY_TEMPLATE),
        ])
        .context("Failed to compile configuration templates")?;

        Ok(Self {
            tera,
        })
    }

    pub fn render_jdbc(&self, config: &EnvironmentConfiguration) -> Result<String> {
        let context = TeraContext::from_serialize(&config.jdbc)
            .context("Failed to build the JDBC template context")?;
        self.tera
            .render(JDBC_TEMPLATE_NAME, &context)
            .with_context(|| format!("Failed to render {JDBC_TEMPLATE_NAME}"))
    }

    pub fn render_security(&self, config: &EnvironmentConfiguration) -> Result<String> {
        let context = TeraContext::from_serialize(&config.security)
            .context("Failed to build the security template context")?;
        self.tera
            .render(SECURITY_TEMPLATE_NAME, &context)
            .with_context(|| format!("Failed to render {SECURITY_TEMPLATE_NAME}"))
    }
}
