//! How the Organizations client obtains its identity.
//!
//! Two strategies exist: the ambient identity of the caller (default
//! credential chain), or temporary credentials obtained by assuming a role in
//! the management account.

use crate::backend::{Backend, ClientScope, Organizations};
use crate::error::{Error, Result};
use std::fmt;
use std::time::SystemTime;

/// Maximum length of an STS role session name.
pub const MAX_SESSION_NAME_LEN: usize = 64;

/// Identity strategy for the Organizations client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Use the caller's default credential chain
    Ambient,
    /// Assume this role first and use its temporary credentials
    AssumeRole { role_arn: String },
}

impl CredentialSource {
    /// Select a strategy from an optional role ARN. Empty means ambient.
    pub fn from_role_arn(role_arn: Option<&str>) -> Self {
        match role_arn.map(str::trim) {
            Some(arn) if !arn.is_empty() => Self::AssumeRole {
                role_arn: arn.to_string(),
            },
            _ => Self::Ambient,
        }
    }

    /// Check the strategy can be used without calling AWS
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Ambient => Ok(()),
            Self::AssumeRole { role_arn } => session_name(role_arn).map(|_| ()),
        }
    }

    /// Build an Organizations client for this strategy.
    ///
    /// Assumed-role clients are pinned to `home_region`.
    pub fn connect(
        &self,
        backend: &dyn Backend,
        home_region: &str,
    ) -> Result<Box<dyn Organizations>> {
        match self {
            Self::Ambient => {
                log::debug!("Using ambient credentials for Organizations");
                backend.organizations(&ClientScope::Ambient {
                    fallback_region: home_region.to_string(),
                })
            }
            Self::AssumeRole { role_arn } => {
                let session = session_name(role_arn)?;
                log::info!("Assuming role {role_arn} (session {session})");
                let credentials = backend.assume_role(role_arn, &session)?;
                backend.organizations(&ClientScope::Assumed {
                    credentials,
                    region: home_region.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ambient => write!(f, "ambient credentials"),
            Self::AssumeRole { role_arn } => write!(f, "assumed role {role_arn}"),
        }
    }
}

/// Derive the STS session name from a role ARN.
///
/// Takes the segment after the last `/` and truncates it to 64 characters.
pub fn session_name(role_arn: &str) -> Result<String> {
    let name = role_arn.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        return Err(Error::InvalidRoleArn(role_arn.to_string()));
    }
    Ok(name.chars().take(MAX_SESSION_NAME_LEN).collect())
}

/// Temporary credentials returned by role assumption
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiry reported by STS; not tracked here
    pub expiration: Option<SystemTime>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}
