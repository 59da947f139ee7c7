//! `guardrails validate`: check the configuration without calling AWS

use anyhow::Result;
use controltower::GuardrailTable;

use super::Loaded;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, loaded: &Loaded) -> Result<()> {
    let settings = &loaded.settings;
    let table = &settings.table;

    if !ctx.quiet {
        ui::header("Guardrails Configuration");
        super::show_settings(ctx, loaded);

        if table.is_empty() {
            println!();
            ui::warn("No guardrail groups defined; a deployment would be empty");
        } else {
            ui::section("Groups");
            for line in group_lines(table) {
                ui::dim(&line);
            }
        }
    }

    let pairs = table.pair_count();
    let chains = settings.batcher()?.ranges(pairs).len();
    if !ctx.quiet {
        println!();
    }
    ui::success(&format!(
        "Configuration valid: {}, {} in {}",
        ui::plural(table.groups.len(), "group"),
        ui::plural(pairs, "enable operation"),
        ui::plural(chains, "chain"),
    ));
    Ok(())
}

/// One line per group: label, control count and OU count
fn group_lines(table: &GuardrailTable) -> Vec<String> {
    table
        .groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            format!(
                "{}: {} × {}",
                group.label(i),
                ui::plural(group.controls.len(), "control"),
                ui::plural(group.organizational_unit_ids.len(), "OU"),
            )
        })
        .collect()
}
