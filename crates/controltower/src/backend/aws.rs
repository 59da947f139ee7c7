//! AWS SDK backend.
//!
//! The SDK is async; planning is not. [`AwsBackend`] owns a current-thread
//! tokio runtime and blocks on each call, so requests go out one at a time.
//! Nothing is loaded until the first call, which keeps `validate` and empty
//! tables free of network traffic.

use crate::backend::{Backend, ClientScope, OrganizationalUnit, Organizations};
use crate::credentials::TemporaryCredentials;
use crate::error::{Error, Result};
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_organizations::config::{Credentials, Region};
use aws_sdk_organizations::error::DisplayErrorContext;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::runtime::Runtime;

/// Provider name attached to credentials obtained by role assumption.
const ASSUMED_PROVIDER: &str = "guardrails-assume-role";

/// STS region when none is configured; the global endpoint lives there.
const STS_FALLBACK_REGION: &str = "us-east-1";

/// Backend that talks to AWS STS and Organizations.
pub struct AwsBackend {
    runtime: Arc<Runtime>,
}

impl AwsBackend {
    /// Create a backend with its own runtime.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::io("tokio runtime", e))?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}

impl std::fmt::Debug for AwsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBackend").finish_non_exhaustive()
    }
}

impl Backend for AwsBackend {
    fn assume_role(&self, role_arn: &str, session_name: &str) -> Result<TemporaryCredentials> {
        self.runtime.block_on(async {
            let region =
                RegionProviderChain::default_provider().or_else(Region::new(STS_FALLBACK_REGION));
            let config = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            let sts = aws_sdk_sts::Client::new(&config);

            let output = sts
                .assume_role()
                .role_arn(role_arn)
                .role_session_name(session_name)
                .send()
                .await
                .map_err(|e| Error::assume_role(role_arn, DisplayErrorContext(&e).to_string()))?;

            let credentials = output
                .credentials()
                .ok_or_else(|| Error::assume_role(role_arn, "response carried no credentials"))?;

            Ok(TemporaryCredentials {
                access_key_id: credentials.access_key_id().to_string(),
                secret_access_key: credentials.secret_access_key().to_string(),
                session_token: credentials.session_token().to_string(),
                expiration: SystemTime::try_from(*credentials.expiration()).ok(),
            })
        })
    }

    fn organizations(&self, scope: &ClientScope) -> Result<Box<dyn Organizations>> {
        let client = self.runtime.block_on(async {
            match scope {
                ClientScope::Ambient { fallback_region } => {
                    let region = RegionProviderChain::default_provider()
                        .or_else(Region::new(fallback_region.clone()));
                    let config = aws_config::defaults(BehaviorVersion::latest())
                        .region(region)
                        .load()
                        .await;
                    aws_sdk_organizations::Client::new(&config)
                }
                ClientScope::Assumed {
                    credentials,
                    region,
                } => {
                    let config = aws_config::defaults(BehaviorVersion::latest())
                        .region(Region::new(region.clone()))
                        .credentials_provider(Credentials::new(
                            credentials.access_key_id.clone(),
                            credentials.secret_access_key.clone(),
                            Some(credentials.session_token.clone()),
                            credentials.expiration,
                            ASSUMED_PROVIDER,
                        ))
                        .load()
                        .await;
                    aws_sdk_organizations::Client::new(&config)
                }
            }
        });

        Ok(Box::new(AwsOrganizations {
            runtime: Arc::clone(&self.runtime),
            client,
        }))
    }
}

struct AwsOrganizations {
    runtime: Arc<Runtime>,
    client: aws_sdk_organizations::Client,
}

impl Organizations for AwsOrganizations {
    fn describe_organizational_unit(&self, ou_id: &str) -> Result<OrganizationalUnit> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .describe_organizational_unit()
                    .organizational_unit_id(ou_id)
                    .send(),
            )
            .map_err(|e| Error::organizational_unit(ou_id, DisplayErrorContext(&e).to_string()))?;

        let unit = output.organizational_unit();
        Ok(OrganizationalUnit {
            id: unit
                .and_then(|u| u.id())
                .unwrap_or(ou_id)
                .to_string(),
            arn: unit.and_then(|u| u.arn()).map(str::to_string),
            name: unit.and_then(|u| u.name()).map(str::to_string),
        })
    }
}
