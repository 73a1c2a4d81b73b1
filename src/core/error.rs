//! Error handling for aggregate-cli
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers and tests can tell failures apart
//! 2. **User-friendly messages** with a suggestion on how to move forward
//!
//! # Error Categories
//!
//! - **Configuration**: [`AggregateError::ConfigurationError`], [`AggregateError::ConfigNotFound`]
//! - **Operation preconditions**: [`AggregateError::AlreadyInstalled`],
//!   [`AggregateError::NotInstalled`], [`AggregateError::NoActionNeeded`],
//!   [`AggregateError::MissingPairedArgument`],
//!   [`AggregateError::RequestedVersionUnavailable`], [`AggregateError::NoReleasesFound`]
//! - **Privileges**: [`AggregateError::PrivilegeRequired`]
//! - **Network**: [`AggregateError::NetworkError`], [`AggregateError::DecodeError`]
//! - **Stage execution**: [`AggregateError::StageFailed`], [`AggregateError::CommandFailed`]
//!
//! None of these are retried. They propagate to the binary, which turns them
//! into an [`ErrorContext`] via [`user_friendly_error`] and exits non-zero.
//!
//! # Examples
//!
//! ```rust,no_run
//! use aggregate_cli::core::{AggregateError, user_friendly_error};
//!
//! let error = anyhow::Error::from(AggregateError::NotInstalled);
//! let ctx = user_friendly_error(error);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::version::ParseError;

/// Every failure aggregate-cli reports.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// The configuration file is malformed or misses a required value.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// What is wrong with the configuration
        message: String,
    },

    /// The configuration file doesn't exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up
        path: String,
    },

    /// `install` found an existing deployment and `--force` wasn't given.
    #[error("Aggregate {version} is already installed")]
    AlreadyInstalled {
        /// Version recorded in the state file
        version: String,
    },

    /// `update` found no state file.
    #[error("Aggregate is not installed")]
    NotInstalled,

    /// The selected version equals the installed one and `--force` wasn't given.
    #[error("Aggregate {version} is already installed, no action needed")]
    NoActionNeeded {
        /// Version that is both installed and selected
        version: String,
    },

    /// One argument of a pair was given without the other.
    #[error("Argument {provided} requires {missing}")]
    MissingPairedArgument {
        /// Argument that was provided
        provided: String,
        /// Argument that is missing
        missing: String,
    },

    /// The explicitly requested version isn't in the release catalog.
    #[error("Requested version {requested} is not available")]
    RequestedVersionUnavailable {
        /// The requested version literal
        requested: String,
        /// Literals of every available version, newest first
        available: Vec<String>,
    },

    /// The filtered release catalog is empty.
    #[error("No available versions found")]
    NoReleasesFound,

    /// The process isn't running with superuser privileges.
    #[error("Superuser privileges required (running as '{identity}')")]
    PrivilegeRequired {
        /// Identity reported by the identity query
        identity: String,
    },

    /// Querying the release catalog or downloading a package failed.
    #[error("Network error: {operation}")]
    NetworkError {
        /// What was being done
        operation: String,
        /// Why it failed
        reason: String,
    },

    /// The release catalog response couldn't be decoded.
    #[error("Can't decode the release catalog: {reason}")]
    DecodeError {
        /// Decoder message
        reason: String,
    },

    /// A deployment stage failed; later stages didn't run.
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed {
        /// Label of the failed stage
        stage: String,
        /// Root cause
        reason: String,
    },

    /// An external command exited with a non-zero status.
    #[error("Command '{command}' exited with {status}")]
    CommandFailed {
        /// The command line
        command: String,
        /// Exit code, or a description when killed by a signal
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// A user-supplied version literal couldn't be parsed.
    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl AggregateError {
    /// Whether this error belongs to the configuration category.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::ConfigurationError { .. } | Self::ConfigNotFound { .. })
    }

    /// Copy of this error; variants wrapping non-cloneable sources are
    /// flattened into [`AggregateError::Other`].
    fn duplicate(&self) -> Self {
        match self {
            Self::ConfigurationError {
                message,
            } => Self::ConfigurationError {
                message: message.clone(),
            },
            Self::ConfigNotFound {
                path,
            } => Self::ConfigNotFound {
                path: path.clone(),
            },
            Self::AlreadyInstalled {
                version,
            } => Self::AlreadyInstalled {
                version: version.clone(),
            },
            Self::NotInstalled => Self::NotInstalled,
            Self::NoActionNeeded {
                version,
            } => Self::NoActionNeeded {
                version: version.clone(),
            },
            Self::MissingPairedArgument {
                provided,
                missing,
            } => Self::MissingPairedArgument {
                provided: provided.clone(),
                missing: missing.clone(),
            },
            Self::RequestedVersionUnavailable {
                requested,
                available,
            } => Self::RequestedVersionUnavailable {
                requested: requested.clone(),
                available: available.clone(),
            },
            Self::NoReleasesFound => Self::NoReleasesFound,
            Self::PrivilegeRequired {
                identity,
            } => Self::PrivilegeRequired {
                identity: identity.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::DecodeError {
                reason,
            } => Self::DecodeError {
                reason: reason.clone(),
            },
            Self::StageFailed {
                stage,
                reason,
            } => Self::StageFailed {
                stage: stage.clone(),
                reason: reason.clone(),
            },
            Self::CommandFailed {
                command,
                status,
                stderr,
            } => Self::CommandFailed {
                command: command.clone(),
                status: status.clone(),
                stderr: stderr.clone(),
            },
            Self::InvalidVersion(e) => Self::InvalidVersion(e.clone()),
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error plus the hints shown to the user.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: AggregateError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: AggregateError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] with suggestions.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(aggregate_error) = error.downcast_ref::<AggregateError>() {
        let mut ctx = create_error_context(aggregate_error.duplicate());
        // Keep the outer context messages: they name the stage or file involved
        let outer = error.to_string();
        if ctx.details.is_none() && outer != ctx.error.to_string() {
            ctx.details = Some(outer);
        }
        return ctx;
    }

    if let Some(parse_error) = error.downcast_ref::<ParseError>() {
        return create_error_context(AggregateError::InvalidVersion(parse_error.clone()))
            .with_details(error.to_string());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AggregateError::PrivilegeRequired {
                    identity: "unknown".to_string(),
                })
                .with_suggestion("Run the command with sudo")
                .with_details(error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AggregateError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AggregateError::Other {
        message,
    })
}

fn create_error_context(error: AggregateError) -> ErrorContext {
    match &error {
        AggregateError::ConfigurationError { .. } | AggregateError::ConfigNotFound { .. } => {
            ErrorContext::new(error)
                .with_suggestion(
                    "Use this template to produce a file compatible with the --configuration argument",
                )
                .with_details(crate::config::configuration_template())
        }

        AggregateError::AlreadyInstalled { .. } => ErrorContext::new(error)
            .with_suggestion("Add --force to install anyway, or run the update operation"),

        AggregateError::NotInstalled => ErrorContext::new(error)
            .with_suggestion("Run the install operation instead"),

        AggregateError::NoActionNeeded { .. } => ErrorContext::new(error)
            .with_suggestion("Run this operation with --force to deploy the same version again"),

        AggregateError::MissingPairedArgument { provided, missing } => {
            let suggestion = format!("Provide {missing} together with {provided}");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        AggregateError::RequestedVersionUnavailable { requested, available } => {
            let details = if available.is_empty() {
                "No versions are available".to_string()
            } else {
                format!("Please choose one between: {}", available.join(", "))
            };
            let similar = crate::selector::similar_versions(requested, available);
            let ctx = ErrorContext::new(error).with_details(details);
            if similar.is_empty() {
                ctx.with_suggestion("Run with --include-pre-releases to also consider pre-release versions")
            } else {
                ctx.with_suggestion(format!("Did you mean {}?", similar.join(" or ")))
            }
        }

        AggregateError::NoReleasesFound => ErrorContext::new(error)
            .with_suggestion("Run with --include-pre-releases to include pre-release versions"),

        AggregateError::PrivilegeRequired { .. } => ErrorContext::new(error)
            .with_suggestion("Try running it with sudo"),

        AggregateError::NetworkError { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check your internet connection and run the command again")
                .with_details(details)
        }

        AggregateError::StageFailed { .. } | AggregateError::CommandFailed { .. } => {
            ErrorContext::new(error)
                .with_suggestion(
                    "The deployment stopped at this stage and was not rolled back. Fix the cause and run the command again with --force",
                )
        }

        AggregateError::InvalidVersion(_) => ErrorContext::new(error)
            .with_suggestion("Versions look like 2.0.3, v2.0.3 or v2.0.3-beta.1"),

        _ => ErrorContext::new(error),
    }
}
