//! # controltower
//!
//! Plan AWS Control Tower control enablement across organizational units.
//!
//! Control Tower rejects more than ten concurrent control operations per
//! account, while CloudFormation deploys independent resources in parallel.
//! This crate turns a table of guardrail groups into a deployment plan whose
//! `DependsOn` chains keep the number of in-flight operations under the limit.
//!
//! ## Pipeline
//!
//! - [`GuardrailTable`]: groups of controls and the OU ids they target
//! - [`OuResolver`]: OU id → ARN through AWS Organizations, optionally after
//!   assuming a role ([`CredentialSource`])
//! - [`enable_controls`]: one [`EnableOperation`] per (OU, control) pair
//! - [`ConcurrencyBatcher`]: contiguous chunks linked into chains
//! - [`DeploymentPlan`]: rendered as a CloudFormation template
//!
//! ## Example
//!
//! ```
//! use controltower::{
//!     ConcurrencyBatcher, ControlSpec, CredentialSource, GuardrailGroup, GuardrailTable,
//!     MockBackend, plan,
//! };
//!
//! let backend = MockBackend::new().with_organizational_unit(
//!     "ou-1111-11111111",
//!     "arn:aws:organizations::111111111111:ou/o-example/ou-1111-11111111",
//! );
//! let table = GuardrailTable::new(vec![GuardrailGroup::new(
//!     vec![ControlSpec::from("503uicglhjkokaajywfpt6ros")],
//!     vec!["ou-1111-11111111".to_string()],
//! )]);
//!
//! let plan = plan(
//!     &table,
//!     &backend,
//!     CredentialSource::Ambient,
//!     "eu-west-1",
//!     &ConcurrencyBatcher::default(),
//! )
//! .unwrap();
//! assert_eq!(plan.len(), 1);
//! ```

pub mod backend;
pub mod batcher;
pub mod credentials;
pub mod diff;
pub mod enabler;
pub mod error;
pub mod plan;
pub mod resolver;
pub mod types;

pub use backend::aws::AwsBackend;
pub use backend::{Backend, MockBackend};
pub use batcher::{CONTROL_TOWER_CONCURRENCY_LIMIT, ChunkStrategy, ConcurrencyBatcher};
pub use credentials::{CredentialSource, session_name};
pub use diff::{ChangeKind, DiffSummary, PlanDiff, diff_templates, load_template};
pub use enabler::{EnableOperation, ResourceName, enable_controls};
pub use error::{Error, ErrorCategory, Result};
pub use plan::{DeploymentPlan, PlannedControl};
pub use resolver::{ArnResolution, OuResolver};
pub use types::{ControlOptions, ControlSpec, GuardrailGroup, GuardrailTable, Tag};

/// Resolve, expand and chain a table in one go.
///
/// Fails without a partial plan if any step fails.
pub fn plan(
    table: &GuardrailTable,
    backend: &dyn Backend,
    source: CredentialSource,
    home_region: &str,
    batcher: &ConcurrencyBatcher,
) -> Result<DeploymentPlan> {
    source.validate()?;
    let mut resolver = OuResolver::new(backend, source, home_region);
    let operations = enable_controls(table, &mut resolver)?;
    Ok(batcher.plan(operations))
}
