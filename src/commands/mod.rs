pub mod diff;
pub mod plan;
pub mod synth;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use controltower::{AwsBackend, DeploymentPlan};
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::{Overrides, Settings};
use crate::paths;
use crate::progress;
use crate::ui;

/// Settings together with the file they came from
pub struct Loaded {
    pub settings: Settings,
    pub path: PathBuf,
}

/// Find, parse and validate the configuration. Never touches the network.
pub fn load(config: Option<&Path>, overrides: Overrides) -> Result<Loaded> {
    let path = paths::find_config(config)?;
    let (settings, _) = Settings::load(&path)?;
    let settings = settings.with_overrides(overrides);
    settings
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(Loaded { settings, path })
}

/// Resolve OUs against AWS and build the chained plan.
///
/// An empty table makes no AWS calls: the backend only connects on first use.
pub fn resolve_plan(settings: &Settings, quiet: bool) -> Result<DeploymentPlan> {
    let batcher = settings.batcher()?;
    let source = settings.credential_source();

    let backend = AwsBackend::new()?;
    let ou_count = settings.table.organizational_unit_ids().len();
    let pb = progress::spinner(
        &format!(
            "Resolving {} via {source}...",
            ui::plural(ou_count, "organizational unit")
        ),
        quiet,
    );

    match controltower::plan(
        &settings.table,
        &backend,
        source,
        &settings.home_region,
        &batcher,
    ) {
        Ok(plan) => {
            pb.finish_success(&format!(
                "Resolved {}",
                ui::plural(ou_count, "organizational unit")
            ));
            Ok(plan)
        }
        Err(err) => {
            pb.finish_error();
            Err(err.into())
        }
    }
}

/// Print the effective settings
pub fn show_settings(ctx: &Context, loaded: &Loaded) {
    if ctx.quiet {
        return;
    }
    let settings = &loaded.settings;
    ui::kv("Config", &loaded.path.display().to_string());
    ui::kv("Credentials", &settings.credential_source().to_string());
    ui::kv("Home region", &settings.home_region);
    ui::kv(
        "Concurrency",
        &format!("{} ({})", settings.max_concurrency, settings.strategy),
    );
}
