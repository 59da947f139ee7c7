//! Deployment plan and CloudFormation rendering

use crate::enabler::{EnableOperation, ResourceName};
use serde_json::{Map, Value, json};
use std::ops::Range;

/// CloudFormation resource type for an enabled control.
pub const ENABLED_CONTROL_TYPE: &str = "AWS::ControlTower::EnabledControl";

/// Default template description.
pub const DEFAULT_DESCRIPTION: &str = "AWS Control Tower guardrails";

/// An operation placed in a chain
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedControl {
    pub name: ResourceName,
    pub operation: EnableOperation,
    /// Index of the chain this resource belongs to
    pub chain: usize,
    /// Predecessor in the same chain
    pub depends_on: Option<ResourceName>,
}

impl PlannedControl {
    /// CloudFormation resource body
    pub fn to_resource(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(
            "ControlIdentifier".to_string(),
            Value::String(self.operation.control_identifier()),
        );
        properties.insert(
            "TargetIdentifier".to_string(),
            Value::String(self.operation.target_arn.clone()),
        );
        if !self.operation.parameters.is_empty() {
            let parameters = self
                .operation
                .parameters
                .iter()
                .map(|(key, value)| json!({ "Key": key, "Value": value }))
                .collect();
            properties.insert("Parameters".to_string(), Value::Array(parameters));
        }
        if !self.operation.tags.is_empty() {
            let tags = self
                .operation
                .tags
                .iter()
                .map(|tag| json!({ "Key": tag.key, "Value": tag.value }))
                .collect();
            properties.insert("Tags".to_string(), Value::Array(tags));
        }

        let mut resource = Map::new();
        resource.insert(
            "Type".to_string(),
            Value::String(ENABLED_CONTROL_TYPE.to_string()),
        );
        resource.insert("Properties".to_string(), Value::Object(properties));
        if let Some(previous) = &self.depends_on {
            resource.insert(
                "DependsOn".to_string(),
                Value::String(previous.to_string()),
            );
        }
        Value::Object(resource)
    }
}

/// Ordered resources with their dependency chains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentPlan {
    resources: Vec<PlannedControl>,
    chains: Vec<Range<usize>>,
}

impl DeploymentPlan {
    pub(crate) fn new(resources: Vec<PlannedControl>, chains: Vec<Range<usize>>) -> Self {
        Self { resources, chains }
    }

    pub fn resources(&self) -> &[PlannedControl] {
        &self.resources
    }

    /// Index ranges of each chain into `resources()`
    pub fn chains(&self) -> &[Range<usize>] {
        &self.chains
    }

    /// Resources of one chain, in deployment order
    pub fn chain(&self, index: usize) -> Option<&[PlannedControl]> {
        self.chains
            .get(index)
            .map(|range| &self.resources[range.clone()])
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Length of the longest chain (sequential depth of the deployment)
    pub fn max_chain_len(&self) -> usize {
        self.chains.iter().map(ExactSizeIterator::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Render the plan as a CloudFormation template.
    ///
    /// Resource keys are sorted, so the same plan always renders the same text.
    pub fn to_template(&self, description: &str) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|r| (r.name.to_string(), r.to_resource()))
            .collect();

        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Description": description,
            "Resources": resources,
        })
    }

    /// Pretty-printed template text
    pub fn to_template_string(&self, description: &str) -> String {
        let mut text = serde_json::to_string_pretty(&self.to_template(description))
            .unwrap_or_else(|_| String::from("{}"));
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::ConcurrencyBatcher;
    use crate::types::Tag;
    use std::collections::BTreeMap;

    const OU_ARN: &str = "arn:aws:organizations::111111111111:ou/o-example/ou-2222-22222222";

    fn operation(control_id: &str) -> EnableOperation {
        EnableOperation {
            control_id: control_id.to_string(),
            ou_id: "ou-2222-22222222".to_string(),
            target_arn: OU_ARN.to_string(),
            parameters: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_resource_minimal() {
        let plan = ConcurrencyBatcher::default().plan(vec![operation("7z1uzm6s8qk7ym7m0sm56cq0u")]);
        let resource = plan.resources()[0].to_resource();

        assert_eq!(resource["Type"], ENABLED_CONTROL_TYPE);
        assert_eq!(
            resource["Properties"]["ControlIdentifier"],
            "arn:aws:controlcatalog:::control/7z1uzm6s8qk7ym7m0sm56cq0u"
        );
        assert_eq!(resource["Properties"]["TargetIdentifier"], OU_ARN);
        assert!(resource.get("DependsOn").is_none());
        assert!(resource["Properties"].get("Parameters").is_none());
        assert!(resource["Properties"].get("Tags").is_none());
    }

    #[test]
    fn test_resource_parameters_and_tags() {
        let mut op = operation("ka8e3pkqefnjsxuyc26ji580");
        op.parameters.insert(
            "AllowedRegions".to_string(),
            json!(["eu-west-1", "us-east-1"]),
        );
        op.parameters
            .insert("ExemptedActions".to_string(), json!([]));
        op.tags.push(Tag::new("Environment", "Production"));

        let plan = ConcurrencyBatcher::default().plan(vec![op]);
        let resource = plan.resources()[0].to_resource();

        assert_eq!(
            resource["Properties"]["Parameters"],
            json!([
                { "Key": "AllowedRegions", "Value": ["eu-west-1", "us-east-1"] },
                { "Key": "ExemptedActions", "Value": [] },
            ])
        );
        assert_eq!(
            resource["Properties"]["Tags"],
            json!([{ "Key": "Environment", "Value": "Production" }])
        );
    }

    #[test]
    fn test_template_depends_on() {
        let ops: Vec<_> = (0..11).map(|i| operation(&format!("c{i}"))).collect();
        let plan = ConcurrencyBatcher::default().plan(ops);
        let template = plan.to_template(DEFAULT_DESCRIPTION);

        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        let resources = template["Resources"].as_object().unwrap();
        assert_eq!(resources.len(), 11);

        let with_deps = resources
            .values()
            .filter(|r| r.get("DependsOn").is_some())
            .count();
        // 11 items in 6 chains: 5 chains of 2 contribute one edge each
        assert_eq!(with_deps, 5);

        let second = &plan.resources()[1];
        assert_eq!(
            resources[second.name.as_str()]["DependsOn"],
            plan.resources()[0].name.as_str()
        );
    }

    #[test]
    fn test_template_deterministic() {
        let build = || {
            let ops: Vec<_> = (0..25).map(|i| operation(&format!("c{i}"))).collect();
            ConcurrencyBatcher::default()
                .plan(ops)
                .to_template_string(DEFAULT_DESCRIPTION)
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_chain_accessors() {
        let ops: Vec<_> = (0..11).map(|i| operation(&format!("c{i}"))).collect();
        let plan = ConcurrencyBatcher::default().plan(ops);

        assert_eq!(plan.max_chain_len(), 2);
        assert_eq!(plan.chain(5).map(<[PlannedControl]>::len), Some(1));
        assert!(plan.chain(6).is_none());
    }

    #[test]
    fn test_empty_template() {
        let plan = DeploymentPlan::default();
        let template = plan.to_template(DEFAULT_DESCRIPTION);
        assert!(template["Resources"].as_object().unwrap().is_empty());
        assert_eq!(plan.max_chain_len(), 0);
    }
}
