//! Static parts list with shopping-search links.

use crate::config::PartsConfig;
use crate::diagnosis::{PartLink, VehicleIdentity};
use crate::error::ConfigError;
use reqwest::Url;

#[derive(Debug, Clone)]
pub struct PartsCatalog {
    base: Url,
    query_param: String,
    items: Vec<String>,
}

impl PartsCatalog {
    pub fn new(base: Url, query_param: impl Into<String>, items: Vec<String>) -> Self {
        Self { base, query_param: query_param.into(), items }
    }

    pub fn from_config(config: &PartsConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.shop_url).map_err(|e| ConfigError::Invalid {
            field: "parts.shop_url",
            reason: e.to_string(),
        })?;
        Ok(Self::new(base, config.query_param.clone(), config.items.clone()))
    }

    /// Search link for one part on one vehicle. Pure and total.
    pub fn link(&self, part: &str, vehicle: &VehicleIdentity) -> String {
        let terms = format!("{} {} {} {}", part.trim(), vehicle.make, vehicle.model, vehicle.year);
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(&self.query_param, terms.trim());
        url.to_string()
    }

    pub fn parts_for(&self, vehicle: &VehicleIdentity) -> Vec<PartLink> {
        self.items
            .iter()
            .map(|name| PartLink { name: name.clone(), url: self.link(name, vehicle) })
            .collect()
    }
}
