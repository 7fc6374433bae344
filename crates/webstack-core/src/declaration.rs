//! The deployment declaration: a flat, validated graph of resource specs.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::DISTRIBUTION_CERTIFICATE_REGION;
use crate::resource::{
    Bucket, Certificate, CertificateConsumer, Cluster, Database, Distribution, DnsRecord,
    HTTP_PORT, HTTPS_PORT, HostedZoneRef, Listener, LogicalId, NetworkRef, Origin,
    OriginProtocolPolicy, Output, Peer, Resource, ResourceKind, SecurityGroup, Service,
};

/// Application load balancers and database subnet groups need two availability zones.
const MIN_SUBNETS: usize = 2;

/// Complete desired end state for one deployment.
///
/// `resources` is kept in the order it was declared; [`apply_order`]
/// derives the order the engine must respect from the reference edges.
///
/// [`apply_order`]: Declaration::apply_order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub stack_name: String,
    pub region: String,
    pub account: Option<String>,
    pub resources: Vec<Resource>,
    pub outputs: Vec<Output>,
}

macro_rules! kind_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> impl Iterator<Item = &$ty> {
            self.resources.iter().filter_map(|r| match r {
                Resource::$variant(inner) => Some(inner),
                _ => None,
            })
        }
    };
}

impl Declaration {
    kind_accessor!(networks, Network, NetworkRef);
    kind_accessor!(hosted_zones, HostedZone, HostedZoneRef);
    kind_accessor!(security_groups, SecurityGroup, SecurityGroup);
    kind_accessor!(clusters, Cluster, Cluster);
    kind_accessor!(services, Service, Service);
    kind_accessor!(buckets, Bucket, Bucket);
    kind_accessor!(distributions, Distribution, Distribution);
    kind_accessor!(certificates, Certificate, Certificate);
    kind_accessor!(dns_records, DnsRecord, DnsRecord);
    kind_accessor!(databases, Database, Database);

    pub fn get(&self, id: &LogicalId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn network(&self, id: &LogicalId) -> Option<&NetworkRef> {
        match self.get(id) {
            Some(Resource::Network(n)) => Some(n),
            _ => None,
        }
    }

    pub fn hosted_zone(&self, id: &LogicalId) -> Option<&HostedZoneRef> {
        match self.get(id) {
            Some(Resource::HostedZone(z)) => Some(z),
            _ => None,
        }
    }

    pub fn certificate(&self, id: &LogicalId) -> Option<&Certificate> {
        match self.get(id) {
            Some(Resource::Certificate(c)) => Some(c),
            _ => None,
        }
    }

    pub fn cluster(&self, id: &LogicalId) -> Option<&Cluster> {
        match self.get(id) {
            Some(Resource::Cluster(c)) => Some(c),
            _ => None,
        }
    }

    pub fn service(&self, id: &LogicalId) -> Option<&Service> {
        match self.get(id) {
            Some(Resource::Service(s)) => Some(s),
            _ => None,
        }
    }

    pub fn database(&self, id: &LogicalId) -> Option<&Database> {
        match self.get(id) {
            Some(Resource::Database(d)) => Some(d),
            _ => None,
        }
    }

    /// Ids this resource must wait for, in reference order without repeats.
    pub fn dependencies(&self, id: &LogicalId) -> Vec<&LogicalId> {
        let Some(resource) = self.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        resource
            .references()
            .into_iter()
            .map(|(target, _)| target)
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Check every structural invariant. Nothing is applied unless this passes.
    pub fn validate(&self) -> crate::Result<()> {
        self.check_unique_ids()?;
        self.check_references()?;
        for service in self.services() {
            self.check_service(service)?;
        }
        for distribution in self.distributions() {
            self.check_distribution(distribution)?;
        }
        for certificate in self.certificates() {
            self.check_certificate(certificate)?;
        }
        for record in self.dns_records() {
            self.check_record(record)?;
        }
        for database in self.databases() {
            self.check_database(database)?;
        }
        self.check_subnets()?;
        self.apply_order()?;
        tracing::debug!(
            stack = %self.stack_name,
            resources = self.resources.len(),
            outputs = self.outputs.len(),
            "declaration validated"
        );
        Ok(())
    }

    /// Topological order over reference edges; ties keep declaration order.
    ///
    /// # Errors
    ///
    /// [`Error::DependencyCycle`](crate::Error::DependencyCycle) if the
    /// references form a cycle.
    pub fn apply_order(&self) -> crate::Result<Vec<&Resource>> {
        let index: HashMap<&LogicalId, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id(), i))
            .collect();

        let mut in_degree = vec![0usize; self.resources.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.resources.len()];
        for (i, resource) in self.resources.iter().enumerate() {
            for dep in self.dependencies(resource.id()) {
                // Dangling edges are reported by check_references.
                if let Some(&j) = index.get(dep) {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.resources.len());

        while let Some(i) = ready.pop_first() {
            order.push(&self.resources[i]);
            for &k in &dependents[i] {
                in_degree[k] -= 1;
                if in_degree[k] == 0 {
                    ready.insert(k);
                }
            }
        }

        if order.len() != self.resources.len() {
            let ids = self
                .resources
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, r)| r.id().to_string())
                .collect();
            return Err(crate::Error::DependencyCycle { ids });
        }

        Ok(order)
    }

    fn check_unique_ids(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.id()) {
                return Err(crate::Error::DuplicateLogicalId(resource.id().to_string()));
            }
        }
        Ok(())
    }

    fn check_references(&self) -> crate::Result<()> {
        let kinds: HashMap<&LogicalId, ResourceKind> =
            self.resources.iter().map(|r| (r.id(), r.kind())).collect();

        let edges = self
            .resources
            .iter()
            .flat_map(|r| r.references().into_iter().map(move |edge| (r.id().to_string(), edge)))
            .chain(
                self.outputs
                    .iter()
                    .map(|o| (o.name.clone(), o.value.reference())),
            );

        for (from, (to, expected)) in edges {
            if kinds.get(to) != Some(&expected) {
                return Err(crate::Error::DanglingReference {
                    from,
                    to: to.to_string(),
                    expected: expected.as_str(),
                });
            }
        }
        Ok(())
    }

    fn check_service(&self, service: &Service) -> crate::Result<()> {
        if service.listener != Listener::for_certificate(service.certificate.is_some()) {
            return Err(crate::Error::ListenerMismatch {
                service: service.id.to_string(),
                port: service.listener.port,
            });
        }
        if service.container_port == 0 {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.container_port", service.id),
                reason: "must be a non-zero port".to_owned(),
            });
        }
        if service.rollout.max_healthy_percent < service.rollout.min_healthy_percent {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.max_healthy_percent", service.id),
                reason: format!(
                    "{} is below min_healthy_percent {}",
                    service.rollout.max_healthy_percent, service.rollout.min_healthy_percent
                ),
            });
        }
        if let Some(cert) = service.certificate.as_ref().and_then(|c| self.certificate(c))
            && cert.consumer != CertificateConsumer::LoadBalancer
        {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.certificate", service.id),
                reason: format!("certificate '{}' is issued for {}", cert.id, cert.consumer.as_str()),
            });
        }
        Ok(())
    }

    fn check_distribution(&self, distribution: &Distribution) -> crate::Result<()> {
        let mut patterns = HashSet::new();
        for behavior in &distribution.behaviors {
            let pattern = behavior.path_pattern.trim();
            if pattern.is_empty() || !patterns.insert(pattern) {
                return Err(crate::Error::InvalidPathPattern {
                    distribution: distribution.id.to_string(),
                    pattern: behavior.path_pattern.clone(),
                });
            }
        }

        for behavior in distribution.all_behaviors() {
            if let Origin::LoadBalancer { service, protocol } = &behavior.origin
                && let Some(service) = self.service(service)
            {
                self.check_load_balancer_origin(distribution, service, *protocol)?;
            }
        }

        match (&distribution.certificate, distribution.domain_names.as_slice()) {
            (None, []) => Ok(()),
            (None, [..]) => Err(crate::Error::InvalidParameter {
                field: format!("{}.domain_names", distribution.id),
                reason: "custom domain names require a certificate".to_owned(),
            }),
            (Some(cert_id), domains) => {
                let Some(cert) = self.certificate(cert_id) else {
                    return Ok(());
                };
                if cert.consumer != CertificateConsumer::Distribution {
                    return Err(crate::Error::InvalidParameter {
                        field: format!("{}.certificate", distribution.id),
                        reason: format!(
                            "certificate '{}' is issued for {}",
                            cert.id,
                            cert.consumer.as_str()
                        ),
                    });
                }
                if !domains.iter().any(|d| *d == cert.domain_name) {
                    return Err(crate::Error::InvalidParameter {
                        field: format!("{}.domain_names", distribution.id),
                        reason: format!("must include certificate domain '{}'", cert.domain_name),
                    });
                }
                Ok(())
            }
        }
    }

    /// The edge must reach the load balancer on the port its listener serves.
    fn check_load_balancer_origin(
        &self,
        distribution: &Distribution,
        service: &Service,
        protocol: OriginProtocolPolicy,
    ) -> crate::Result<()> {
        if !service.public_load_balancer {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.origins.{}", distribution.id, service.id),
                reason: "the load balancer is internal and unreachable from the distribution"
                    .to_owned(),
            });
        }
        let port = match protocol {
            OriginProtocolPolicy::HttpOnly => HTTP_PORT,
            OriginProtocolPolicy::HttpsOnly => HTTPS_PORT,
        };
        if port != service.listener.port {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.origins.{}", distribution.id, service.id),
                reason: format!(
                    "{} origin needs port {port}, but the listener serves port {}",
                    protocol.as_str(),
                    service.listener.port
                ),
            });
        }
        Ok(())
    }

    /// Load balancers and database subnet groups span at least two subnets.
    fn check_subnets(&self) -> crate::Result<()> {
        for service in self.services() {
            let Some(network) = self
                .cluster(&service.cluster)
                .and_then(|c| self.network(&c.network))
            else {
                continue;
            };
            let (tier, subnets) = if service.public_load_balancer {
                ("public", network.public_subnets.as_slice())
            } else {
                ("workload", network.workload_subnets())
            };
            if subnets.len() < MIN_SUBNETS {
                return Err(crate::Error::InvalidParameter {
                    field: format!("{}.subnets", network.id),
                    reason: format!(
                        "the load balancer of '{}' needs {MIN_SUBNETS} {tier} subnets, VPC '{}' has {}",
                        service.id,
                        network.name,
                        subnets.len()
                    ),
                });
            }
        }
        for database in self.databases() {
            let Some(network) = self.network(&database.network) else {
                continue;
            };
            let subnets = network.workload_subnets();
            if subnets.len() < MIN_SUBNETS {
                return Err(crate::Error::InvalidParameter {
                    field: format!("{}.subnets", network.id),
                    reason: format!(
                        "the subnet group of '{}' needs {MIN_SUBNETS} subnets, VPC '{}' has {}",
                        database.id,
                        network.name,
                        subnets.len()
                    ),
                });
            }
        }
        Ok(())
    }

    fn check_certificate(&self, certificate: &Certificate) -> crate::Result<()> {
        let expected = match certificate.consumer {
            CertificateConsumer::Distribution => DISTRIBUTION_CERTIFICATE_REGION,
            CertificateConsumer::LoadBalancer => self.region.as_str(),
        };
        if certificate.region != expected {
            return Err(crate::Error::CertificateRegionMismatch {
                domain: certificate.domain_name.clone(),
                consumer: certificate.consumer.as_str(),
                expected: expected.to_owned(),
                actual: certificate.region.clone(),
            });
        }
        if let Some(zone) = self.hosted_zone(&certificate.hosted_zone)
            && !zone.contains(&certificate.domain_name)
        {
            return Err(crate::Error::RecordOutsideZone {
                record: certificate.domain_name.clone(),
                zone: zone.name.clone(),
            });
        }
        Ok(())
    }

    fn check_record(&self, record: &DnsRecord) -> crate::Result<()> {
        match self.hosted_zone(&record.hosted_zone) {
            Some(zone) if !zone.contains(&record.record_name) => {
                Err(crate::Error::RecordOutsideZone {
                    record: record.record_name.clone(),
                    zone: zone.name.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_database(&self, database: &Database) -> crate::Result<()> {
        let port = database.engine.port();
        let compute_groups: HashSet<&LogicalId> =
            self.services().map(|s| &s.security_group).collect();

        let allowed = match database.ingress.as_slice() {
            [rule] => {
                rule.port == port
                    && matches!(&rule.peer, Peer::SecurityGroup { group } if compute_groups.contains(group))
            }
            _ => false,
        };
        if !allowed {
            return Err(crate::Error::IllegalDatabaseIngress {
                database: database.id.to_string(),
                port,
            });
        }

        // The database must share a network with the compute tier it serves.
        let same_network = self
            .services()
            .filter_map(|s| self.cluster(&s.cluster))
            .any(|c| c.network == database.network);
        if !same_network {
            return Err(crate::Error::InvalidParameter {
                field: format!("{}.network", database.id),
                reason: "not the network of any compute cluster".to_owned(),
            });
        }
        Ok(())
    }
}
