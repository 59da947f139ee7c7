use anyhow::{Context, Result};
use controltower::{
    CONTROL_TOWER_CONCURRENCY_LIMIT, ChunkStrategy, ConcurrencyBatcher, CredentialSource,
    GuardrailTable,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect format from the file extension (TOML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Contents of guardrails.toml: identity settings plus the guardrail table.
///
/// Unknown keys are rejected so a misspelled key cannot silently drop groups,
/// tags or parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Role in the management account to assume; empty uses ambient credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    /// Control Tower home region
    #[serde(default = "default_home_region")]
    pub home_region: String,

    /// Concurrent enable operations allowed per account
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub strategy: ChunkStrategy,

    /// Description written into the template
    #[serde(default = "default_description")]
    pub description: String,

    /// `[[groups]]` entries
    #[serde(rename = "groups", default)]
    pub table: GuardrailTable,
}

fn default_home_region() -> String {
    "eu-west-1".to_string()
}

fn default_max_concurrency() -> usize {
    CONTROL_TOWER_CONCURRENCY_LIMIT
}

fn default_description() -> String {
    controltower::plan::DEFAULT_DESCRIPTION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            role_arn: None,
            home_region: default_home_region(),
            max_concurrency: default_max_concurrency(),
            strategy: ChunkStrategy::default(),
            description: default_description(),
            table: GuardrailTable::default(),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub role_arn: Option<String>,
    pub home_region: Option<String>,
    pub max_concurrency: Option<usize>,
    pub strategy: Option<ChunkStrategy>,
}

impl Settings {
    /// Load settings from a TOML or JSON file
    pub fn load(path: &Path) -> Result<(Self, ConfigFormat)> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let format = ConfigFormat::from_path(path);
        let settings = Self::parse(&content, format)
            .with_context(|| format!("Invalid {} in {}", format.extension(), path.display()))?;
        log::debug!(
            "Loaded {} groups from {}",
            settings.table.groups.len(),
            path.display()
        );
        Ok((settings, format))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML format"),
            ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON format"),
        }
    }

    /// Apply command line / environment overrides
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(role_arn) = overrides.role_arn {
            self.role_arn = Some(role_arn);
        }
        if let Some(region) = overrides.home_region {
            self.home_region = region;
        }
        if let Some(limit) = overrides.max_concurrency {
            self.max_concurrency = limit;
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        self
    }

    pub fn credential_source(&self) -> CredentialSource {
        CredentialSource::from_role_arn(self.role_arn.as_deref())
    }

    pub fn batcher(&self) -> Result<ConcurrencyBatcher> {
        Ok(ConcurrencyBatcher::new(self.max_concurrency, self.strategy)?)
    }

    /// Check everything that can be checked without calling AWS
    pub fn validate(&self) -> Result<()> {
        self.table.validate()?;
        self.credential_source().validate()?;
        self.batcher()?;
        if self.home_region.trim().is_empty() {
            anyhow::bail!("home_region must not be empty");
        }
        Ok(())
    }
}
