//! `guardrails synth`: write the CloudFormation template

use anyhow::{Context as AnyhowContext, Result};
use std::fs;
use std::path::Path;

use super::Loaded;
use crate::Context;
use crate::cli::SynthArgs;
use crate::ui;

pub fn run(ctx: &Context, loaded: &Loaded, args: &SynthArgs) -> Result<()> {
    let Some(output) = &args.output else {
        // Template on stdout: nothing else may be printed there
        let plan = super::resolve_plan(&loaded.settings, true)?;
        print!(
            "{}",
            plan.to_template_string(&loaded.settings.description)
        );
        return Ok(());
    };

    if output.exists() && !args.force && !confirm_overwrite(output)? {
        ui::warn("Aborted, template not written");
        return Ok(());
    }

    let plan = super::resolve_plan(&loaded.settings, ctx.quiet)?;
    write_template(output, &plan.to_template_string(&loaded.settings.description))?;
    ui::success(&format!(
        "Wrote {} to {}",
        ui::plural(plan.len(), "enabled control"),
        output.display()
    ));
    Ok(())
}

fn write_template(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Could not write {}", path.display()))?;
    log::debug!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(format!("{} exists. Overwrite?", path.display()))
        .default(false)
        .interact()?;

    Ok(confirmed)
}
