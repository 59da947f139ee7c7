//! `guardrails plan`: resolve OUs and show the deployment chains

use anyhow::Result;
use colored::Colorize;
use controltower::{ConcurrencyBatcher, DeploymentPlan, PlannedControl};
use serde_json::{Value, json};

use super::Loaded;
use crate::Context;
use crate::cli::PlanArgs;
use crate::ui;

pub fn run(ctx: &Context, loaded: &Loaded, args: &PlanArgs) -> Result<()> {
    // JSON goes to stdout, so keep the spinner off it
    let plan = super::resolve_plan(&loaded.settings, ctx.quiet || args.json)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&plan))?);
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Deployment Plan");
        super::show_settings(ctx, loaded);

        for index in 0..plan.chain_count() {
            let Some(chain) = plan.chain(index) else {
                continue;
            };
            ui::section(&format!(
                "Chain {} ({})",
                index + 1,
                ui::plural(chain.len(), "control")
            ));
            for resource in chain {
                println!("{}", resource_line(resource, ctx.verbose > 0));
            }
        }
        println!();
    }

    if plan.is_empty() {
        ui::warn("Nothing to enable");
    } else {
        ui::success(&summary(&plan, &loaded.settings.batcher()?));
    }
    Ok(())
}

/// "11 enable operations in 6 chains (at most 2 deep, limit 10, stride)"
fn summary(plan: &DeploymentPlan, batcher: &ConcurrencyBatcher) -> String {
    format!(
        "{} in {} (at most {} deep, limit {}, {})",
        ui::plural(plan.len(), "enable operation"),
        ui::plural(plan.chain_count(), "chain"),
        plan.max_chain_len(),
        batcher.limit(),
        batcher.strategy(),
    )
}

fn resource_line(resource: &PlannedControl, verbose: bool) -> String {
    let op = &resource.operation;
    let arrow = if resource.depends_on.is_some() {
        "└"
    } else {
        "┌"
    };
    let mut line = format!(
        "  {} {} {} {}",
        arrow.dimmed(),
        op.control_id,
        "→".dimmed(),
        op.ou_id
    );
    if verbose {
        line.push_str(&format!(
            "  {}",
            ui::truncate(resource.name.as_str(), 60).dimmed()
        ));
    }
    line
}

/// Machine-readable plan: chains of resources in deployment order
fn plan_json(plan: &DeploymentPlan) -> Value {
    let chains: Vec<Value> = (0..plan.chain_count())
        .filter_map(|i| plan.chain(i))
        .map(|chain| {
            Value::Array(
                chain
                    .iter()
                    .map(|r| {
                        json!({
                            "name": r.name,
                            "control_id": r.operation.control_id,
                            "ou_id": r.operation.ou_id,
                            "target_arn": r.operation.target_arn,
                            "depends_on": r.depends_on,
                        })
                    })
                    .collect(),
            )
        })
        .collect();

    json!({
        "operations": plan.len(),
        "max_chain_len": plan.max_chain_len(),
        "chains": chains,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use controltower::{
        ChunkStrategy, ControlSpec, CredentialSource, GuardrailGroup, GuardrailTable, MockBackend,
    };

    const OU_ARN: &str = "arn:aws:organizations::111111111111:ou/o-example/ou-1111-11111111";

    fn sample_plan(controls: usize) -> DeploymentPlan {
        let backend = MockBackend::new().with_organizational_unit("ou-1111-11111111", OU_ARN);
        let table = GuardrailTable::new(vec![GuardrailGroup::new(
            (0..controls)
                .map(|i| ControlSpec::from(format!("control{i:02}").as_str()))
                .collect(),
            vec!["ou-1111-11111111".to_string()],
        )]);
        controltower::plan(
            &table,
            &backend,
            CredentialSource::Ambient,
            "eu-west-1",
            &ConcurrencyBatcher::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_summary() {
        let batcher = ConcurrencyBatcher::default();
        assert_eq!(
            summary(&sample_plan(11), &batcher),
            "11 enable operations in 6 chains (at most 2 deep, limit 10, stride)"
        );
        assert_eq!(
            summary(&sample_plan(1), &batcher),
            "1 enable operation in 1 chain (at most 1 deep, limit 10, stride)"
        );

        let balanced = ConcurrencyBatcher::new(4, ChunkStrategy::Balanced).unwrap();
        assert!(summary(&sample_plan(1), &balanced).ends_with("limit 4, balanced)"));
    }

    #[test]
    fn test_plan_json_chains() {
        let value = plan_json(&sample_plan(11));
        assert_eq!(value["operations"], 11);
        assert_eq!(value["max_chain_len"], 2);

        let chains = value["chains"].as_array().unwrap();
        assert_eq!(chains.len(), 6);
        assert_eq!(chains[0][0]["control_id"], "control00");
        assert_eq!(chains[0][0]["depends_on"], Value::Null);
        assert_eq!(chains[0][1]["depends_on"], chains[0][0]["name"]);
        assert_eq!(chains[5].as_array().unwrap().len(), 1);
        assert_eq!(chains[5][0]["target_arn"], OU_ARN);
    }

    #[test]
    fn test_plan_json_empty() {
        let value = plan_json(&DeploymentPlan::default());
        assert_eq!(value["operations"], 0);
        assert_eq!(value["chains"], json!([]));
    }
}
