//! Control enabler - expands the configuration table into enable operations

use crate::error::Result;
use crate::resolver::OuResolver;
use crate::types::{GuardrailTable, Tag, control_identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of every generated resource name.
pub const RESOURCE_PREFIX: &str = "EnabledControl";

/// Longest readable part kept in a resource name (CloudFormation allows 255).
const MAX_READABLE_LEN: usize = 200;

/// Deterministic resource name for a (control, OU) pair.
///
/// The name is alphanumeric so it can serve as a CloudFormation logical id:
/// the readable part strips separators from both ids, and a short blake3 digest
/// of the exact pair keeps names distinct when stripping makes two pairs look
/// alike. The same pair always yields the same name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn for_pair(control_id: &str, ou_id: &str) -> Self {
        let readable: String = control_id
            .chars()
            .chain(ou_id.chars())
            .filter(char::is_ascii_alphanumeric)
            .take(MAX_READABLE_LEN)
            .collect();

        let mut hasher = blake3::Hasher::new();
        hasher.update(control_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(ou_id.as_bytes());
        let digest = hasher.finalize().to_hex();

        Self(format!("{RESOURCE_PREFIX}{readable}{}", &digest[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One control to enable on one organizational unit
#[derive(Debug, Clone, PartialEq)]
pub struct EnableOperation {
    pub control_id: String,
    pub ou_id: String,
    /// Resolved ARN of the OU
    pub target_arn: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub tags: Vec<Tag>,
}

impl EnableOperation {
    /// Control catalog ARN sent as the control identifier
    pub fn control_identifier(&self) -> String {
        control_identifier(&self.control_id)
    }

    pub fn resource_name(&self) -> ResourceName {
        ResourceName::for_pair(&self.control_id, &self.ou_id)
    }
}

/// Expand the table into one operation per (resolved OU, control) pair.
///
/// The table is validated before the resolver is touched, so configuration
/// errors never cost a network call. Order: groups as declared, then OUs, then
/// controls.
pub fn enable_controls(
    table: &GuardrailTable,
    resolver: &mut OuResolver<'_>,
) -> Result<Vec<EnableOperation>> {
    table.validate()?;

    let mut operations = Vec::with_capacity(table.pair_count());
    for (index, group) in table.groups.iter().enumerate() {
        let resolution = resolver.resolve(&group.organizational_unit_ids)?;
        log::debug!(
            "Group {}: {} controls x {} OUs",
            group.label(index),
            group.controls.len(),
            resolution.len()
        );

        for unit in resolution.iter() {
            for control in &group.controls {
                operations.push(EnableOperation {
                    control_id: control.id().to_string(),
                    ou_id: unit.ou_id.clone(),
                    target_arn: unit.arn.clone(),
                    parameters: control.parameters(),
                    tags: control.tags().to_vec(),
                });
            }
        }
    }

    log::info!("Expanded {} enable operations", operations.len());
    Ok(operations)
}
