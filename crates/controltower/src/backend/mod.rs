//! Backend traits and implementations for the AWS services the planner calls.
//!
//! The planner only needs two calls: `sts:AssumeRole` and
//! `organizations:DescribeOrganizationalUnit`. [`aws::AwsBackend`] issues them
//! with the AWS SDK; [`MockBackend`] answers from memory and records every
//! call so tests can assert what was (or was not) sent.
//!
//! # Testing
//!
//! ```
//! use controltower::backend::{Backend, ClientScope, MockBackend};
//!
//! let mock = MockBackend::new()
//!     .with_organizational_unit("ou-1111-11111111", "arn:aws:organizations::111111111111:ou/o-example/ou-1111-11111111");
//!
//! let client = mock
//!     .organizations(&ClientScope::Ambient { fallback_region: "eu-west-1".to_string() })
//!     .unwrap();
//! let ou = client.describe_organizational_unit("ou-1111-11111111").unwrap();
//! assert!(ou.arn.unwrap().ends_with("ou-1111-11111111"));
//! ```

pub mod aws;

use crate::credentials::TemporaryCredentials;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How an Organizations client should be authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientScope {
    /// Default credential chain; `fallback_region` is used when the chain has no region
    Ambient { fallback_region: String },
    /// Explicit temporary credentials pinned to a region
    Assumed {
        credentials: TemporaryCredentials,
        region: String,
    },
}

/// An organizational unit as described by AWS Organizations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationalUnit {
    pub id: String,
    pub arn: Option<String>,
    pub name: Option<String>,
}

/// Client for AWS Organizations.
pub trait Organizations {
    /// Describe one organizational unit.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrganizationalUnit` if the OU is unknown or cannot be read.
    fn describe_organizational_unit(&self, ou_id: &str) -> Result<OrganizationalUnit>;
}

/// Factory for the AWS calls the planner needs.
pub trait Backend {
    /// Exchange a role ARN for temporary credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::AssumeRole` if STS refuses or returns no credentials.
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<TemporaryCredentials>;

    /// Build an Organizations client for the given scope.
    fn organizations(&self, scope: &ClientScope) -> Result<Box<dyn Organizations>>;
}

#[derive(Debug, Default)]
struct MockState {
    units: HashMap<String, OrganizationalUnit>,
    unit_errors: HashMap<String, String>,
    assume_error: Option<String>,
    assumed: Vec<(String, String)>,
    scopes: Vec<ClientScope>,
    describe_calls: Vec<String>,
}

/// Mock backend for testing without network access.
///
/// Clones share state, so a test can keep a handle while the resolver owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an OU and its ARN.
    #[must_use]
    pub fn with_organizational_unit(mut self, ou_id: &str, arn: &str) -> Self {
        self.add_organizational_unit(ou_id, arn);
        self
    }

    /// Register an OU and its ARN.
    pub fn add_organizational_unit(&mut self, ou_id: &str, arn: &str) {
        let mut state = self.state.lock().unwrap();
        state.units.insert(
            ou_id.to_string(),
            OrganizationalUnit {
                id: ou_id.to_string(),
                arn: Some(arn.to_string()),
                name: None,
            },
        );
    }

    /// Register an OU that is described without an ARN.
    pub fn add_organizational_unit_without_arn(&mut self, ou_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.units.insert(
            ou_id.to_string(),
            OrganizationalUnit {
                id: ou_id.to_string(),
                arn: None,
                name: None,
            },
        );
    }

    /// Make describing this OU fail with a message.
    pub fn fail_organizational_unit(&mut self, ou_id: &str, message: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .unit_errors
            .insert(ou_id.to_string(), message.to_string());
    }

    /// Make role assumption fail with a message.
    pub fn fail_assume_role(&mut self, message: &str) {
        self.state.lock().unwrap().assume_error = Some(message.to_string());
    }

    /// Every (role ARN, session name) passed to `assume_role`.
    pub fn assumed_roles(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().assumed.clone()
    }

    /// Every scope an Organizations client was built for.
    pub fn scopes(&self) -> Vec<ClientScope> {
        self.state.lock().unwrap().scopes.clone()
    }

    /// Every OU id passed to `describe_organizational_unit`.
    pub fn describe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().describe_calls.clone()
    }

    /// Total number of calls that would have hit the network.
    pub fn call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.assumed.len() + state.describe_calls.len()
    }
}

impl Backend for MockBackend {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<TemporaryCredentials> {
        let mut state = self.state.lock().unwrap();
        state
            .assumed
            .push((role_arn.to_string(), session_name.to_string()));

        if let Some(message) = &state.assume_error {
            return Err(Error::assume_role(role_arn, message.clone()));
        }

        Ok(TemporaryCredentials {
            access_key_id: "ASIAMOCK".to_string(),
            secret_access_key: "mock-secret".to_string(),
            session_token: "mock-token".to_string(),
            expiration: None,
        })
    }

    fn organizations(&self, scope: &ClientScope) -> Result<Box<dyn Organizations>> {
        self.state.lock().unwrap().scopes.push(scope.clone());
        Ok(Box::new(MockOrganizations {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockOrganizations {
    state: Arc<Mutex<MockState>>,
}

impl Organizations for MockOrganizations {
    fn describe_organizational_unit(&self, ou_id: &str) -> Result<OrganizationalUnit> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls.push(ou_id.to_string());

        if let Some(message) = state.unit_errors.get(ou_id) {
            return Err(Error::organizational_unit(ou_id, message.clone()));
        }

        state.units.get(ou_id).cloned().ok_or_else(|| {
            Error::organizational_unit(
                ou_id,
                "OrganizationalUnitNotFoundException: You specified an organizational unit that doesn't exist",
            )
        })
    }
}
