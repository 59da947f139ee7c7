//! Diff computation between a previous template and a new plan
//!
//! CloudFormation matches resources across deployments by logical id, which is
//! why resource names must be stable. This module shows what a deployment of
//! the new plan would do to the stack that holds the previous template.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Properties whose change makes CloudFormation replace the enabled control.
const REPLACEMENT_PROPERTIES: [&str; 2] = ["ControlIdentifier", "TargetIdentifier"];

/// What happens to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    /// Properties differ
    Changed,
    /// Only the dependency edge differs
    Rewired,
}

/// A change to one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceChange {
    pub name: String,
    pub kind: ChangeKind,
    /// Whether the change forces the control to be disabled and re-enabled
    pub requires_replacement: bool,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub rewired: usize,
    pub unchanged: usize,
    pub replacements: usize,
}

impl DiffSummary {
    /// Total number of resources that would change
    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.changed + self.rewired
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

/// All changes between two templates, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanDiff {
    pub changes: Vec<ResourceChange>,
    pub summary: DiffSummary,
}

impl PlanDiff {
    /// Changes of one kind
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ResourceChange> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }
}

/// Read a template written earlier
pub fn load_template(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let template: Value = serde_json::from_str(&content)?;
    resources(&template)?;
    Ok(template)
}

/// Compare two templates by resource name
pub fn diff_templates(previous: &Value, current: &Value) -> Result<PlanDiff> {
    let before = resources(previous)?;
    let after = resources(current)?;
    let mut diff = PlanDiff::default();

    for (name, old) in before {
        match after.get(name) {
            None => {
                diff.summary.removed += 1;
                diff.changes.push(ResourceChange {
                    name: name.clone(),
                    kind: ChangeKind::Removed,
                    requires_replacement: false,
                    before: Some(old.clone()),
                    after: None,
                });
            }
            Some(new) if old == new => diff.summary.unchanged += 1,
            Some(new) => {
                let properties_differ = old.get("Properties") != new.get("Properties")
                    || old.get("Type") != new.get("Type");
                let requires_replacement = REPLACEMENT_PROPERTIES.iter().any(|key| {
                    old.pointer(&format!("/Properties/{key}"))
                        != new.pointer(&format!("/Properties/{key}"))
                });
                let kind = if properties_differ {
                    diff.summary.changed += 1;
                    ChangeKind::Changed
                } else {
                    diff.summary.rewired += 1;
                    ChangeKind::Rewired
                };
                if requires_replacement {
                    diff.summary.replacements += 1;
                }
                diff.changes.push(ResourceChange {
                    name: name.clone(),
                    kind,
                    requires_replacement,
                    before: Some(old.clone()),
                    after: Some(new.clone()),
                });
            }
        }
    }

    for (name, new) in after {
        if !before.contains_key(name) {
            diff.summary.added += 1;
            diff.changes.push(ResourceChange {
                name: name.clone(),
                kind: ChangeKind::Added,
                requires_replacement: false,
                before: None,
                after: Some(new.clone()),
            });
        }
    }

    diff.changes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(diff)
}

fn resources(template: &Value) -> Result<&Map<String, Value>> {
    match template.get("Resources") {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::Template("'Resources' is not an object".to_string())),
        None => Err(Error::Template("no 'Resources' section".to_string())),
    }
}
