//! Named, user-visible deployment stages.

use std::fmt;

/// One step of the deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Archive the deployed webapp and its configuration (update only).
    BackingUp,
    /// Stop the servlet container.
    Stopped,
    /// Remove the deployed webapp.
    Cleaned,
    /// Download and extract the selected package.
    Deployed,
    /// Render the JDBC and security configuration files.
    Configured,
    /// Fix ownership and record the installed version.
    Finalized,
    /// Start the servlet container.
    Started,
}

impl Stage {
    /// Stages run by a fresh installation.
    pub const INSTALL: [Self; 6] = [
        Self::Stopped,
        Self::Cleaned,
        Self::Deployed,
        Self::Configured,
        Self::Finalized,
        Self::Started,
    ];

    /// Stages run by an update.
    pub const UPDATE: [Self; 7] = [
        Self::BackingUp,
        Self::Stopped,
        Self::Cleaned,
        Self::Deployed,
        Self::Configured,
        Self::Finalized,
        Self::Started,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::BackingUp => "Backing up Aggregate",
            Self::Stopped => "Stopping Tomcat",
            Self::Cleaned => "Cleaning ROOT webapp",
            Self::Deployed => "Deploying Aggregate",
            Self::Configured => "Deploying configuration",
            Self::Finalized => "Completing installation & cleanup",
            Self::Started => "Starting Tomcat",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
