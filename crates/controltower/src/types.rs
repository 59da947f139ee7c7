//! Configuration table types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Template for the control catalog identifier of a control.
pub const CONTROL_CATALOG_PREFIX: &str = "arn:aws:controlcatalog:::control/";

/// A tag attached to an enabled control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A control with parameters and/or tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlOptions {
    /// Control catalog identifier
    pub id: String,
    /// Control parameters, passed through verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// A control to enable, either bare or with options
///
/// In TOML both forms can be mixed in one list:
///
/// ```toml
/// controls = [
///     "503uicglhjkokaajywfpt6ros",
///     { id = "df2ta5ytg2zatj1q7y5e09u32", tags = [{ key = "Environment", value = "Production" }] },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlSpec {
    Id(String),
    Detailed(ControlOptions),
}

impl ControlSpec {
    /// The control identifier
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Detailed(opts) => &opts.id,
        }
    }

    /// Control parameters (empty for bare controls)
    pub fn parameters(&self) -> BTreeMap<String, serde_json::Value> {
        match self {
            Self::Id(_) => BTreeMap::new(),
            Self::Detailed(opts) => opts.parameters.clone(),
        }
    }

    /// Control tags (empty for bare controls)
    pub fn tags(&self) -> &[Tag] {
        match self {
            Self::Id(_) => &[],
            Self::Detailed(opts) => &opts.tags,
        }
    }

    /// The control catalog ARN sent to Control Tower
    pub fn control_identifier(&self) -> String {
        control_identifier(self.id())
    }
}

impl From<&str> for ControlSpec {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

/// Build the control catalog ARN for a control id
pub fn control_identifier(control_id: &str) -> String {
    format!("{CONTROL_CATALOG_PREFIX}{control_id}")
}

/// A set of controls enabled on a set of organizational units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardrailGroup {
    /// Optional label used in reports and errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub controls: Vec<ControlSpec>,
    #[serde(alias = "ou_ids")]
    pub organizational_unit_ids: Vec<String>,
}

impl GuardrailGroup {
    pub fn new(controls: Vec<ControlSpec>, organizational_unit_ids: Vec<String>) -> Self {
        Self {
            name: None,
            controls,
            organizational_unit_ids,
        }
    }

    /// Label for errors: "#index" or "#index (name)"
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("#{index} ({name})"),
            None => format!("#{index}"),
        }
    }

    /// Number of (control, OU) pairs this group expands to
    pub fn pair_count(&self) -> usize {
        self.controls.len() * self.organizational_unit_ids.len()
    }

    fn validate(&self, index: usize) -> Result<()> {
        let group = self.label(index);

        if self.controls.is_empty() {
            return Err(Error::EmptyControls { group });
        }
        if self.organizational_unit_ids.is_empty() {
            return Err(Error::EmptyTargets { group });
        }

        let mut seen = HashSet::new();
        for control in &self.controls {
            check_identifier(&group, "control id", control.id())?;
            if !seen.insert(control.id()) {
                return Err(Error::DuplicateInGroup {
                    group,
                    field: "control",
                    value: control.id().to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for ou_id in &self.organizational_unit_ids {
            check_identifier(&group, "organizational unit id", ou_id)?;
            if !seen.insert(ou_id.as_str()) {
                return Err(Error::DuplicateInGroup {
                    group,
                    field: "organizational unit",
                    value: ou_id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Identifiers are non-empty printable ASCII tokens
fn check_identifier(group: &str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::EmptyIdentifier {
            group: group.to_string(),
            field,
        });
    }
    if !value.chars().all(|c| c.is_ascii_graphic()) {
        return Err(Error::InvalidIdentifier {
            group: group.to_string(),
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// The full configuration table, loaded once and read-only afterwards.
///
/// Serialized as the bare list of groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardrailTable {
    pub groups: Vec<GuardrailGroup>,
}

impl GuardrailTable {
    pub fn new(groups: Vec<GuardrailGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of enable operations the table expands to
    pub fn pair_count(&self) -> usize {
        self.groups.iter().map(GuardrailGroup::pair_count).sum()
    }

    /// Distinct OU ids across all groups, in first-seen order
    pub fn organizational_unit_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.organizational_unit_ids.iter())
            .filter(|id| seen.insert(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Validate every group, then reject (control, OU) pairs declared twice
    pub fn validate(&self) -> Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            group.validate(index)?;
        }

        let mut owners: HashMap<(&str, &str), usize> = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            for ou_id in &group.organizational_unit_ids {
                for control in &group.controls {
                    if let Some(&first) = owners.get(&(control.id(), ou_id.as_str())) {
                        return Err(Error::DuplicatePair {
                            control_id: control.id().to_string(),
                            ou_id: ou_id.clone(),
                            first: self.groups[first].label(first),
                            second: group.label(index),
                        });
                    }
                    owners.insert((control.id(), ou_id.as_str()), index);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(controls: &[&str], ous: &[&str]) -> GuardrailGroup {
        GuardrailGroup::new(
            controls.iter().map(|c| ControlSpec::from(*c)).collect(),
            ous.iter().map(|o| (*o).to_string()).collect(),
        )
    }

    #[test]
    fn test_control_identifier() {
        assert_eq!(
            control_identifier("503uicglhjkokaajywfpt6ros"),
            "arn:aws:controlcatalog:::control/503uicglhjkokaajywfpt6ros"
        );
        assert_eq!(
            ControlSpec::from("abc").control_identifier(),
            "arn:aws:controlcatalog:::control/abc"
        );
    }

    #[test]
    fn test_control_spec_mixed_json() {
        let json = r#"["a", {"id": "b", "tags": [{"key": "Environment", "value": "Production"}]},
                       {"id": "c", "parameters": {"AllowedRegions": ["eu-west-1"]}}]"#;
        let specs: Vec<ControlSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0], ControlSpec::Id("a".to_string()));
        assert_eq!(specs[1].id(), "b");
        assert_eq!(specs[1].tags(), &[Tag::new("Environment", "Production")]);
        assert!(specs[1].parameters().is_empty());
        assert_eq!(
            specs[2].parameters()["AllowedRegions"],
            serde_json::json!(["eu-west-1"])
        );
    }

    #[test]
    fn test_group_label() {
        let mut g = group(&["a"], &["ou-1"]);
        assert_eq!(g.label(3), "#3");
        g.name = Some("baseline".to_string());
        assert_eq!(g.label(3), "#3 (baseline)");
    }

    #[test]
    fn test_validate_ok() {
        let table = GuardrailTable::new(vec![
            group(&["a", "b"], &["ou-1"]),
            group(&["a"], &["ou-2"]),
        ]);
        assert!(table.validate().is_ok());
        assert_eq!(table.pair_count(), 3);
    }

    #[test]
    fn test_validate_empty_table() {
        let table = GuardrailTable::default();
        assert!(table.validate().is_ok());
        assert!(table.is_empty());
        assert_eq!(table.pair_count(), 0);
    }

    #[test]
    fn test_validate_empty_controls() {
        let table = GuardrailTable::new(vec![group(&[], &["ou-1"])]);
        assert!(matches!(
            table.validate(),
            Err(Error::EmptyControls { group }) if group == "#0"
        ));
    }

    #[test]
    fn test_validate_empty_targets() {
        let table = GuardrailTable::new(vec![group(&["a"], &["ou-1"]), group(&["a"], &[])]);
        assert!(matches!(
            table.validate(),
            Err(Error::EmptyTargets { group }) if group == "#1"
        ));
    }

    #[test]
    fn test_validate_empty_identifiers() {
        let table = GuardrailTable::new(vec![group(&[" "], &["ou-1"])]);
        assert!(matches!(table.validate(), Err(Error::EmptyIdentifier { .. })));

        let table = GuardrailTable::new(vec![group(&["a"], &[""])]);
        assert!(matches!(table.validate(), Err(Error::EmptyIdentifier { .. })));
    }

    #[test]
    fn test_validate_rejects_non_ascii_identifiers() {
        let table = GuardrailTable::new(vec![group(&["cöntrol"], &["ou-1"])]);
        match table.validate() {
            Err(Error::InvalidIdentifier { field, value, .. }) => {
                assert_eq!(field, "control id");
                assert_eq!(value, "cöntrol");
            }
            other => panic!("Expected InvalidIdentifier, got {other:?}"),
        }

        let table = GuardrailTable::new(vec![group(&["a"], &["ou 1"])]);
        assert!(matches!(
            table.validate(),
            Err(Error::InvalidIdentifier { field: "organizational unit id", .. })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"[{"id": "a", "tag": [{"key": "Environment", "value": "Production"}]}]"#;
        assert!(serde_json::from_str::<Vec<ControlSpec>>(json).is_err());

        let json = r#"{"controls": ["a"], "organizational_unit_ids": ["ou-1"], "ou": ["ou-2"]}"#;
        assert!(serde_json::from_str::<GuardrailGroup>(json).is_err());

        let json = r#"{"key": "Environment", "vale": "Production"}"#;
        assert!(serde_json::from_str::<Tag>(json).is_err());
    }

    #[test]
    fn test_table_is_list_of_groups() {
        let json = r#"[{"controls": ["a"], "ou_ids": ["ou-1"]}]"#;
        let table: GuardrailTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.groups.len(), 1);
        assert_eq!(table.groups[0].organizational_unit_ids, vec!["ou-1"]);
    }

    #[test]
    fn test_validate_duplicates_in_group() {
        let table = GuardrailTable::new(vec![group(&["a", "a"], &["ou-1"])]);
        assert!(matches!(
            table.validate(),
            Err(Error::DuplicateInGroup { field: "control", .. })
        ));

        let table = GuardrailTable::new(vec![group(&["a"], &["ou-1", "ou-1"])]);
        assert!(matches!(
            table.validate(),
            Err(Error::DuplicateInGroup { field: "organizational unit", .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_pair_across_groups() {
        let table = GuardrailTable::new(vec![
            group(&["a", "b"], &["ou-1"]),
            group(&["c"], &["ou-1"]),
            group(&["b"], &["ou-2", "ou-1"]),
        ]);
        match table.validate() {
            Err(Error::DuplicatePair {
                control_id,
                ou_id,
                first,
                second,
            }) => {
                assert_eq!(control_id, "b");
                assert_eq!(ou_id, "ou-1");
                assert_eq!(first, "#0");
                assert_eq!(second, "#2");
            }
            other => panic!("Expected DuplicatePair, got {other:?}"),
        }
    }

    #[test]
    fn test_organizational_unit_ids_dedup() {
        let table = GuardrailTable::new(vec![
            group(&["a"], &["ou-1", "ou-2"]),
            group(&["b"], &["ou-2", "ou-3"]),
        ]);
        assert_eq!(table.organizational_unit_ids(), vec!["ou-1", "ou-2", "ou-3"]);
    }
}
