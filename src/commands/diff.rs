//! `guardrails diff`: compare the plan with a previously written template

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use controltower::diff::ResourceChange;
use controltower::{ChangeKind, DiffSummary, diff_templates, load_template};

use super::Loaded;
use crate::Context;
use crate::cli::DiffArgs;
use crate::ui;

/// Returns whether any resource would change
pub fn run(ctx: &Context, loaded: &Loaded, args: &DiffArgs) -> Result<bool> {
    let previous = load_template(&args.previous)
        .with_context(|| format!("Could not load {}", args.previous.display()))?;
    let plan = super::resolve_plan(&loaded.settings, ctx.quiet)?;
    let current = plan.to_template(&loaded.settings.description);
    let diff = diff_templates(&previous, &current)?;

    if !ctx.quiet {
        ui::header(&format!("Diff against {}", args.previous.display()));
        if diff.changes.is_empty() {
            println!();
            ui::dim("No changes");
        }
        for change in &diff.changes {
            println!("{}", change_line(change));
            if ctx.verbose > 0 && change.kind == ChangeKind::Changed {
                show_resource_diff(change);
            }
        }
        println!();
    }

    let summary = summary_line(&diff.summary);
    if diff.summary.has_changes() {
        ui::warn(&summary);
    } else {
        ui::success(&summary);
    }
    Ok(diff.summary.has_changes())
}

fn change_line(change: &ResourceChange) -> String {
    let (symbol, label) = match change.kind {
        ChangeKind::Added => ("+".green(), "add".green()),
        ChangeKind::Removed => ("-".red(), "remove".red()),
        ChangeKind::Changed => ("~".yellow(), "update".yellow()),
        ChangeKind::Rewired => ("↻".cyan(), "rewire".cyan()),
    };
    let mut line = format!("  {symbol} {:<7} {}", label, change.name);
    if change.requires_replacement {
        line.push_str(&format!(" {}", "(replacement)".red().bold()));
    }
    if change.kind == ChangeKind::Rewired {
        let from = depends_on(change.before.as_ref());
        let to = depends_on(change.after.as_ref());
        line.push_str(&format!(" {}", format!("{from} → {to}").dimmed()));
    }
    line
}

fn depends_on(resource: Option<&serde_json::Value>) -> String {
    resource
        .and_then(|r| r.get("DependsOn"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("(none)")
        .to_string()
}

/// Line diff of the two resource bodies
fn show_resource_diff(change: &ResourceChange) {
    let render = |value: Option<&serde_json::Value>| {
        value
            .and_then(|v| serde_json::to_string_pretty(v).ok())
            .unwrap_or_default()
    };
    let before = render(change.before.as_ref());
    let after = render(change.after.as_ref());

    let diff = similar::TextDiff::from_lines(&before, &after);
    for line in diff.iter_all_changes() {
        match line.tag() {
            similar::ChangeTag::Delete => print!("      {}", format!("- {line}").red()),
            similar::ChangeTag::Insert => print!("      {}", format!("+ {line}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}

fn summary_line(summary: &DiffSummary) -> String {
    if !summary.has_changes() {
        return format!(
            "No changes ({} unchanged)",
            ui::plural(summary.unchanged, "resource")
        );
    }
    let mut line = format!(
        "{} to add, {} to remove, {} to update, {} to rewire",
        summary.added, summary.removed, summary.changed, summary.rewired
    );
    if summary.replacements > 0 {
        line.push_str(&format!(
            " ({} require replacement)",
            summary.replacements
        ));
    }
    line
}
