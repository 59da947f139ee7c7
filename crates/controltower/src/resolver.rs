//! OU resolver - maps organizational unit ids to ARNs

use crate::backend::{Backend, Organizations};
use crate::credentials::CredentialSource;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// One resolved organizational unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub ou_id: String,
    pub arn: String,
}

/// OU id ↔ ARN mapping for one group, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArnResolution {
    units: Vec<ResolvedUnit>,
}

impl ArnResolution {
    fn push(&mut self, unit: ResolvedUnit) {
        // Two ids describing the same ARN collapse into the first one
        if self.ou_for(&unit.arn).is_none() {
            self.units.push(unit);
        }
    }

    /// ARN of an OU id
    pub fn arn_for(&self, ou_id: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.ou_id == ou_id)
            .map(|u| u.arn.as_str())
    }

    /// OU id of an ARN
    pub fn ou_for(&self, arn: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.arn == arn)
            .map(|u| u.ou_id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Resolves OU ids through AWS Organizations.
///
/// The client is created on the first lookup and reused for the rest of the
/// run, so a role is assumed at most once. Results are cached per run since
/// the same OU usually appears in several groups.
pub struct OuResolver<'a> {
    backend: &'a dyn Backend,
    source: CredentialSource,
    home_region: String,
    client: Option<Box<dyn Organizations>>,
    cache: HashMap<String, ResolvedUnit>,
}

impl<'a> OuResolver<'a> {
    pub fn new(backend: &'a dyn Backend, source: CredentialSource, home_region: &str) -> Self {
        Self {
            backend,
            source,
            home_region: home_region.to_string(),
            client: None,
            cache: HashMap::new(),
        }
    }

    /// Whether any AWS client has been created yet
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Resolve a list of OU ids. Any failure aborts the whole list.
    pub fn resolve(&mut self, ou_ids: &[String]) -> Result<ArnResolution> {
        let mut resolution = ArnResolution::default();
        for ou_id in ou_ids {
            let unit = self.resolve_one(ou_id)?;
            resolution.push(unit);
        }
        Ok(resolution)
    }

    /// Resolve a single OU id, consulting the per-run cache first
    pub fn resolve_one(&mut self, ou_id: &str) -> Result<ResolvedUnit> {
        if let Some(unit) = self.cache.get(ou_id) {
            log::trace!("OU {ou_id} served from cache");
            return Ok(unit.clone());
        }

        let client = self.client()?;
        let described = client.describe_organizational_unit(ou_id)?;
        let arn = described
            .arn
            .filter(|arn| !arn.is_empty())
            .ok_or_else(|| Error::MissingArn(ou_id.to_string()))?;

        match &described.name {
            Some(name) => log::debug!("Resolved {ou_id} ({name}) -> {arn}"),
            None => log::debug!("Resolved {ou_id} -> {arn}"),
        }
        let unit = ResolvedUnit {
            ou_id: ou_id.to_string(),
            arn,
        };
        self.cache.insert(ou_id.to_string(), unit.clone());
        Ok(unit)
    }

    fn client(&mut self) -> Result<&dyn Organizations> {
        let client = match self.client.take() {
            Some(client) => client,
            None => {
                log::info!("Connecting to AWS Organizations with {}", self.source);
                self.source.connect(self.backend, &self.home_region)?
            }
        };
        Ok(&**self.client.insert(client))
    }
}
