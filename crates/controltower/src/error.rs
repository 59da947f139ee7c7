//! Error types for guardrail planning.
//!
//! Errors are categorized so the CLI can print appropriate advice. Nothing in
//! this crate retries: every error aborts plan generation and no partial plan
//! is produced.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for guardrail planning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of planning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed configuration table or settings, detected before any network call.
    Configuration,
    /// An organizational unit could not be described.
    Resolution,
    /// Role assumption failed or returned no credentials.
    Credentials,
    /// A previously emitted template could not be read.
    Template,
    /// Local file access failed.
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid guardrail configuration",
            Self::Resolution => "Organizational unit resolution failed",
            Self::Credentials => "Role assumption failed",
            Self::Template => "Invalid CloudFormation template",
            Self::Io => "File access failed",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Fix the configuration file and run `guardrails validate`",
            Self::Resolution => {
                "Check the OU id exists and the identity may call organizations:DescribeOrganizationalUnit"
            }
            Self::Credentials => "Check the role ARN and that its trust policy allows sts:AssumeRole",
            Self::Template => "Pass a template previously written by `guardrails synth`",
            Self::Io => "Check the path and its permissions",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while planning control enablement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A group declares no controls.
    #[error("group {group}: no controls declared")]
    EmptyControls {
        /// Group label (index, and name when set).
        group: String,
    },

    /// A group declares no target organizational units.
    #[error("group {group}: no organizational unit ids declared")]
    EmptyTargets {
        /// Group label.
        group: String,
    },

    /// An identifier in a group is empty.
    #[error("group {group}: empty {field}")]
    EmptyIdentifier {
        /// Group label.
        group: String,
        /// Which field was empty.
        field: &'static str,
    },

    /// An identifier is not a printable ASCII token.
    #[error("group {group}: {field} '{value}' must be printable ASCII without spaces")]
    InvalidIdentifier {
        /// Group label.
        group: String,
        /// Which field was invalid.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A control or OU is listed twice in one group.
    #[error("group {group}: duplicate {field} '{value}'")]
    DuplicateInGroup {
        /// Group label.
        group: String,
        /// Which field was duplicated.
        field: &'static str,
        /// The repeated value.
        value: String,
    },

    /// The same control is enabled on the same OU by two groups.
    #[error("control '{control_id}' is enabled on '{ou_id}' by groups {first} and {second}")]
    DuplicatePair {
        /// Control identifier.
        control_id: String,
        /// OU identifier.
        ou_id: String,
        /// Group that declared the pair first.
        first: String,
        /// Group that declared it again.
        second: String,
    },

    /// The configured role ARN has no usable trailing segment.
    #[error("invalid role ARN '{0}': no role name after the last '/'")]
    InvalidRoleArn(String),

    /// The concurrency limit must allow at least one call.
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    /// Describing an organizational unit failed.
    #[error("failed to describe organizational unit '{ou_id}': {message}")]
    OrganizationalUnit {
        /// OU identifier.
        ou_id: String,
        /// Error message from the service.
        message: String,
    },

    /// The service described the OU but returned no ARN.
    #[error("organizational unit '{0}' was described without an ARN")]
    MissingArn(String),

    /// Role assumption failed.
    #[error("failed to assume role '{role_arn}': {message}")]
    AssumeRole {
        /// Role ARN.
        role_arn: String,
        /// Error message from the service.
        message: String,
    },

    /// A previous template could not be interpreted.
    #[error("invalid template: {0}")]
    Template(String),

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an OU resolution error.
    pub fn organizational_unit(ou_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OrganizationalUnit {
            ou_id: ou_id.into(),
            message: message.into(),
        }
    }

    /// Create a role assumption error.
    pub fn assume_role(role_arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssumeRole {
            role_arn: role_arn.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyControls { .. }
            | Error::EmptyTargets { .. }
            | Error::EmptyIdentifier { .. }
            | Error::InvalidIdentifier { .. }
            | Error::DuplicateInGroup { .. }
            | Error::DuplicatePair { .. }
            | Error::InvalidRoleArn(_)
            | Error::ZeroConcurrency => ErrorCategory::Configuration,
            Error::OrganizationalUnit { .. } | Error::MissingArn(_) => ErrorCategory::Resolution,
            Error::AssumeRole { .. } => ErrorCategory::Credentials,
            Error::Template(_) => ErrorCategory::Template,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Template(err.to_string())
    }
}
