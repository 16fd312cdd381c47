//! Account topology and preferred region order.

use url::Url;

use crate::config::{validate_config, ClientConfig, ValidationError};
use crate::partition::RegionEndpoint;

/// Resolved region endpoints, immutable once built.
#[derive(Debug, Clone)]
pub struct RegionTopology {
    account_regions: Vec<RegionEndpoint>,
    preferred: Vec<RegionEndpoint>,
}

impl RegionTopology {
    /// Validate the configuration and resolve every region to an endpoint.
    pub fn resolve(config: &ClientConfig) -> Result<Self, Vec<ValidationError>> {
        validate_config(config)?;

        let account_regions = config
            .regions
            .iter()
            .map(|region| {
                Url::parse(&region.endpoint)
                    .map(|endpoint| RegionEndpoint::new(region.name.clone(), endpoint))
                    .map_err(|e| ValidationError::InvalidEndpoint {
                        region: region.name.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| vec![e])?;

        let preferred = if config.preferred_regions.is_empty() {
            account_regions.clone()
        } else {
            config
                .preferred_regions
                .iter()
                .filter_map(|name| account_regions.iter().find(|r| &r.name == name).cloned())
                .collect()
        };

        Ok(Self {
            account_regions,
            preferred,
        })
    }

    /// Regions in service-provided order.
    pub fn account_regions(&self) -> &[RegionEndpoint] {
        &self.account_regions
    }

    /// Client preference order; the account order when none was configured.
    pub fn preferred(&self) -> &[RegionEndpoint] {
        &self.preferred
    }

    /// Look up an account region by name.
    pub fn region(&self, name: &str) -> Option<&RegionEndpoint> {
        self.account_regions.iter().find(|r| r.name == name)
    }
}
