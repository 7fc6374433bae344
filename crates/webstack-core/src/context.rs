//! Cached lookup results (`webstack.context.json`).
//!
//! Lookups hit the provider once; afterwards synthesis reads the cached
//! values so the same configuration always yields the same declaration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lookup::{HostedZoneCandidate, NetworkCandidate};

pub const CONTEXT_FILE: &str = "webstack.context.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupContext {
    /// Keyed by `region/vpc-name`
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkCandidate>,
    /// Keyed by zone name
    #[serde(default)]
    pub hosted_zones: BTreeMap<String, HostedZoneCandidate>,
}

impl LookupContext {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONTEXT_FILE)
    }

    /// Load the cached context, or an empty one if the file does not exist.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let path = Self::path(project_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| crate::Error::ContextLoad {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| crate::Error::ContextParse { path, source: e })
    }

    pub fn save(&self, project_dir: &Path) -> crate::Result<()> {
        let path = Self::path(project_dir);
        let mut content =
            serde_json::to_string_pretty(self).map_err(|e| crate::Error::ContextEncode {
                path: path.clone(),
                source: e,
            })?;
        content.push('\n');
        std::fs::write(&path, content).map_err(|e| crate::Error::ContextWrite { path, source: e })
    }

    pub fn network(&self, region: &str, vpc_name: &str) -> Option<&NetworkCandidate> {
        self.networks.get(&network_key(region, vpc_name))
    }

    pub fn insert_network(&mut self, region: &str, vpc_name: &str, network: NetworkCandidate) {
        self.networks.insert(network_key(region, vpc_name), network);
    }

    pub fn hosted_zone(&self, name: &str) -> Option<&HostedZoneCandidate> {
        self.hosted_zones
            .get(crate::lookup::normalize_zone_name(name))
    }

    pub fn insert_hosted_zone(&mut self, zone: HostedZoneCandidate) {
        self.hosted_zones
            .insert(crate::lookup::normalize_zone_name(&zone.name).to_owned(), zone);
    }
}

fn network_key(region: &str, vpc_name: &str) -> String {
    format!("{region}/{vpc_name}")
}
