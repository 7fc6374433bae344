//! Resolution of pre-existing resources by name.
//!
//! Candidates are whatever the provider returned for a name query; the
//! functions here pick exactly one or fail. Ambiguity is never resolved by
//! guessing.

use serde::{Deserialize, Serialize};

/// A VPC as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCandidate {
    pub vpc_id: String,
    /// Value of the `Name` tag, if any
    pub name: Option<String>,
    #[serde(default)]
    pub public_subnets: Vec<String>,
    #[serde(default)]
    pub private_subnets: Vec<String>,
}

/// A hosted zone as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneCandidate {
    /// Zone id without the `/hostedzone/` prefix
    pub zone_id: String,
    pub name: String,
    #[serde(default)]
    pub private: bool,
}

/// Pick the single VPC whose `Name` tag equals `name`.
///
/// # Errors
///
/// - [`Error::NetworkNotFound`](crate::Error::NetworkNotFound) if nothing matches
/// - [`Error::AmbiguousNetwork`](crate::Error::AmbiguousNetwork) if more than one matches
pub fn resolve_network(name: &str, candidates: &[NetworkCandidate]) -> crate::Result<NetworkCandidate> {
    let matches: Vec<&NetworkCandidate> = candidates
        .iter()
        .filter(|c| c.name.as_deref() == Some(name))
        .collect();

    match matches.as_slice() {
        [] => Err(crate::Error::NetworkNotFound {
            name: name.to_owned(),
        }),
        [single] => {
            tracing::debug!(name, vpc_id = %single.vpc_id, "network resolved");
            Ok((*single).clone())
        }
        many => Err(crate::Error::AmbiguousNetwork {
            name: name.to_owned(),
            ids: many.iter().map(|c| c.vpc_id.clone()).collect(),
        }),
    }
}

/// Pick the single public hosted zone named `name` (trailing dots ignored).
///
/// # Errors
///
/// - [`Error::HostedZoneNotFound`](crate::Error::HostedZoneNotFound) if nothing matches
/// - [`Error::AmbiguousHostedZone`](crate::Error::AmbiguousHostedZone) if more than one matches
pub fn resolve_hosted_zone(
    name: &str,
    candidates: &[HostedZoneCandidate],
) -> crate::Result<HostedZoneCandidate> {
    let wanted = normalize_zone_name(name);
    let matches: Vec<&HostedZoneCandidate> = candidates
        .iter()
        .filter(|c| !c.private && normalize_zone_name(&c.name) == wanted)
        .collect();

    match matches.as_slice() {
        [] => Err(crate::Error::HostedZoneNotFound {
            name: wanted.to_owned(),
        }),
        [single] => {
            tracing::debug!(name = wanted, zone_id = %single.zone_id, "hosted zone resolved");
            Ok(HostedZoneCandidate {
                zone_id: single.zone_id.clone(),
                name: wanted.to_owned(),
                private: false,
            })
        }
        many => Err(crate::Error::AmbiguousHostedZone {
            name: wanted.to_owned(),
            ids: many.iter().map(|c| c.zone_id.clone()).collect(),
        }),
    }
}

/// Zone name without the trailing root dot.
pub fn normalize_zone_name(name: &str) -> &str {
    name.trim_end_matches('.')
}
