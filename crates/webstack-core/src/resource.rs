//! Desired-resource records.
//!
//! Every record here describes an end state handed to the provisioning
//! engine. Records point at each other only through [`LogicalId`]s, so the
//! whole declaration is a flat graph whose edges are enumerated by
//! [`Resource::references`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Plain-text listener port.
pub const HTTP_PORT: u16 = 80;
/// TLS listener port.
pub const HTTPS_PORT: u16 = 443;

/// Identifier of a resource within one declaration.
///
/// Rendered verbatim as the CloudFormation logical id, so it is kept
/// alphanumeric.
///
/// # Examples
///
/// ```
/// use webstack_core::LogicalId;
///
/// let id = LogicalId::new("Counter Service");
/// assert_eq!(id.as_str(), "CounterService");
/// assert_eq!(id.child("Sg").as_str(), "CounterServiceSg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Build an id from an arbitrary name, dropping non-alphanumeric characters.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(
            name.as_ref()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derived id for a sub-resource rendered alongside this one.
    pub fn child(&self, suffix: &str) -> Self {
        Self::new(format!("{}{suffix}", self.0))
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    HostedZone,
    SecurityGroup,
    Cluster,
    Service,
    Bucket,
    Distribution,
    Certificate,
    DnsRecord,
    Database,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::HostedZone => "hosted zone",
            Self::SecurityGroup => "security group",
            Self::Cluster => "cluster",
            Self::Service => "service",
            Self::Bucket => "bucket",
            Self::Distribution => "distribution",
            Self::Certificate => "certificate",
            Self::DnsRecord => "DNS record",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Network(NetworkRef),
    HostedZone(HostedZoneRef),
    SecurityGroup(SecurityGroup),
    Cluster(Cluster),
    Service(Service),
    Bucket(Bucket),
    Distribution(Distribution),
    Certificate(Certificate),
    DnsRecord(DnsRecord),
    Database(Database),
}

impl Resource {
    pub fn id(&self) -> &LogicalId {
        match self {
            Self::Network(r) => &r.id,
            Self::HostedZone(r) => &r.id,
            Self::SecurityGroup(r) => &r.id,
            Self::Cluster(r) => &r.id,
            Self::Service(r) => &r.id,
            Self::Bucket(r) => &r.id,
            Self::Distribution(r) => &r.id,
            Self::Certificate(r) => &r.id,
            Self::DnsRecord(r) => &r.id,
            Self::Database(r) => &r.id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::HostedZone(_) => ResourceKind::HostedZone,
            Self::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Self::Cluster(_) => ResourceKind::Cluster,
            Self::Service(_) => ResourceKind::Service,
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::Distribution(_) => ResourceKind::Distribution,
            Self::Certificate(_) => ResourceKind::Certificate,
            Self::DnsRecord(_) => ResourceKind::DnsRecord,
            Self::Database(_) => ResourceKind::Database,
        }
    }

    /// Outgoing edges, each with the kind the target must have.
    pub fn references(&self) -> Vec<(&LogicalId, ResourceKind)> {
        let mut refs = Vec::new();
        match self {
            Self::Network(_) | Self::HostedZone(_) | Self::Bucket(_) => {}
            Self::SecurityGroup(sg) => refs.push((&sg.network, ResourceKind::Network)),
            Self::Cluster(c) => refs.push((&c.network, ResourceKind::Network)),
            Self::Service(s) => {
                refs.push((&s.cluster, ResourceKind::Cluster));
                refs.push((&s.security_group, ResourceKind::SecurityGroup));
                if let Some(cert) = &s.certificate {
                    refs.push((cert, ResourceKind::Certificate));
                }
                for value in s.environment.values() {
                    if let Some(db) = value.referenced_database() {
                        refs.push((db, ResourceKind::Database));
                    }
                }
            }
            Self::Distribution(d) => {
                for behavior in d.all_behaviors() {
                    if let Some(target) = behavior.origin.reference() {
                        refs.push(target);
                    }
                }
                if let Some(cert) = &d.certificate {
                    refs.push((cert, ResourceKind::Certificate));
                }
            }
            Self::Certificate(c) => refs.push((&c.hosted_zone, ResourceKind::HostedZone)),
            Self::DnsRecord(r) => {
                refs.push((&r.hosted_zone, ResourceKind::HostedZone));
                refs.push(r.target.reference());
            }
            Self::Database(db) => {
                refs.push((&db.network, ResourceKind::Network));
                for rule in &db.ingress {
                    if let Peer::SecurityGroup { group } = &rule.peer {
                        refs.push((group, ResourceKind::SecurityGroup));
                    }
                }
            }
        }
        refs
    }
}

// ── Referenced handles ──

/// An existing VPC, resolved by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRef {
    pub id: LogicalId,
    pub name: String,
    pub vpc_id: String,
    pub public_subnets: Vec<String>,
    pub private_subnets: Vec<String>,
}

impl NetworkRef {
    /// Subnets for tasks and databases; public ones when the VPC has no private tier.
    pub fn workload_subnets(&self) -> &[String] {
        if self.private_subnets.is_empty() {
            &self.public_subnets
        } else {
            &self.private_subnets
        }
    }
}

/// An existing Route 53 hosted zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneRef {
    pub id: LogicalId,
    pub name: String,
    pub zone_id: String,
}

impl HostedZoneRef {
    /// Whether `domain` is the zone apex or a name below it.
    pub fn contains(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.');
        let zone = self.name.trim_end_matches('.');
        domain == zone || domain.ends_with(&format!(".{zone}"))
    }
}

// ── Compute ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: LogicalId,
    pub network: LogicalId,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: LogicalId,
    pub network: LogicalId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Built from a local Docker build context and pushed before deploy.
    Asset { directory: PathBuf },
    /// Pulled as-is.
    Registry { uri: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListenerProtocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub port: u16,
    pub protocol: ListenerProtocol,
}

impl Listener {
    /// 443/HTTPS with a certificate, 80/HTTP without.
    pub fn for_certificate(has_certificate: bool) -> Self {
        if has_certificate {
            Self {
                port: HTTPS_PORT,
                protocol: ListenerProtocol::Https,
            }
        } else {
            Self {
                port: HTTP_PORT,
                protocol: ListenerProtocol::Http,
            }
        }
    }
}

/// Task-count bounds during a rolling deployment, in percent of the desired count.
///
/// Neither bound is pinned to 100; only `max >= min` is checked before the
/// values are passed to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutBounds {
    pub min_healthy_percent: u32,
    pub max_healthy_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: LogicalId,
    pub cluster: LogicalId,
    /// Compute-tier security group attached to the tasks.
    pub security_group: LogicalId,
    pub image: ImageSource,
    pub container_port: u16,
    pub memory_limit_mib: u32,
    pub cpu: u32,
    pub desired_count: u32,
    pub public_load_balancer: bool,
    pub listener: Listener,
    pub certificate: Option<LogicalId>,
    pub environment: BTreeMap<String, EnvValue>,
    pub health_check_grace_period_secs: u32,
    pub health_check_path: String,
    pub rollout: RolloutBounds,
}

/// Value of an injected container environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvValue {
    Literal { value: String },
    /// Output attribute of another resource, resolved by the engine.
    Attribute {
        resource: LogicalId,
        attribute: Attribute,
    },
    /// Field of a generated secret; only the reference ever appears in output.
    Secret { secret: SecretRef },
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Plain configuration, as opposed to a secret-store reference.
    pub fn is_plain(&self) -> bool {
        !matches!(self, Self::Secret { .. })
    }

    fn referenced_database(&self) -> Option<&LogicalId> {
        match self {
            Self::Literal { .. } => None,
            Self::Attribute { resource, .. } => Some(resource),
            Self::Secret { secret } => Some(&secret.owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    EndpointAddress,
    EndpointPort,
}

impl Attribute {
    /// Attribute name as the engine exposes it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EndpointAddress => "Endpoint.Address",
            Self::EndpointPort => "Endpoint.Port",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Database that generates and owns the secret.
    pub owner: LogicalId,
    /// JSON key inside the secret.
    pub field: String,
}

// ── Static site ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Retain,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: LogicalId,
    pub index_document: String,
    pub public_read: bool,
    pub auto_delete_objects: bool,
    pub removal: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: LogicalId,
    pub default_behavior: Behavior,
    pub behaviors: Vec<PathBehavior>,
    pub domain_names: Vec<String>,
    pub certificate: Option<LogicalId>,
}

impl Distribution {
    pub fn all_behaviors(&self) -> impl Iterator<Item = &Behavior> {
        std::iter::once(&self.default_behavior).chain(self.behaviors.iter().map(|b| &b.behavior))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBehavior {
    pub path_pattern: String,
    pub behavior: Behavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub origin: Origin,
    pub viewer_protocol: ViewerProtocolPolicy,
    pub allowed_methods: AllowedMethods,
    pub cache_policy: CachePolicy,
    pub origin_request_policy: Option<OriginRequestPolicy>,
}

impl Behavior {
    /// Bucket origin, HTTPS redirect, cached.
    pub fn static_site(bucket: LogicalId) -> Self {
        Self {
            origin: Origin::Bucket { bucket },
            viewer_protocol: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::GetHead,
            cache_policy: CachePolicy::CachingOptimized,
            origin_request_policy: None,
        }
    }

    /// Dynamic origin: every method, nothing cached, everything forwarded.
    pub fn dynamic(origin: Origin) -> Self {
        Self {
            origin,
            viewer_protocol: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: AllowedMethods::All,
            cache_policy: CachePolicy::CachingDisabled,
            origin_request_policy: Some(OriginRequestPolicy::forward_all()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    Bucket {
        bucket: LogicalId,
    },
    LoadBalancer {
        service: LogicalId,
        protocol: OriginProtocolPolicy,
    },
    Http {
        domain_name: String,
        protocol: OriginProtocolPolicy,
    },
}

impl Origin {
    fn reference(&self) -> Option<(&LogicalId, ResourceKind)> {
        match self {
            Self::Bucket { bucket } => Some((bucket, ResourceKind::Bucket)),
            Self::LoadBalancer { service, .. } => Some((service, ResourceKind::Service)),
            Self::Http { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginProtocolPolicy {
    #[default]
    HttpOnly,
    HttpsOnly,
}

impl OriginProtocolPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpOnly => "http-only",
            Self::HttpsOnly => "https-only",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    HttpsOnly,
    #[default]
    RedirectToHttps,
}

impl ViewerProtocolPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllowAll => "allow-all",
            Self::HttpsOnly => "https-only",
            Self::RedirectToHttps => "redirect-to-https",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedMethods {
    GetHead,
    All,
}

impl AllowedMethods {
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            Self::GetHead => &["GET", "HEAD"],
            Self::All => &["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"],
        }
    }
}

/// CloudFront managed cache policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    CachingOptimized,
    CachingDisabled,
}

impl CachePolicy {
    pub fn managed_id(self) -> &'static str {
        match self {
            Self::CachingOptimized => "658327ea-f89d-4fab-a63d-7e88639e58f6",
            Self::CachingDisabled => "4135ea2d-6df8-44a3-9df3-4b5a84be39ad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardPolicy {
    None,
    All,
}

/// What an edge location forwards to the origin on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRequestPolicy {
    pub query_strings: ForwardPolicy,
    pub headers: ForwardPolicy,
    pub cookies: ForwardPolicy,
}

impl OriginRequestPolicy {
    pub fn forward_all() -> Self {
        Self {
            query_strings: ForwardPolicy::All,
            headers: ForwardPolicy::All,
            cookies: ForwardPolicy::All,
        }
    }

    pub fn without_cookies(self) -> Self {
        Self {
            cookies: ForwardPolicy::None,
            ..self
        }
    }
}

// ── Names & certificates ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateConsumer {
    LoadBalancer,
    Distribution,
}

impl CertificateConsumer {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadBalancer => "the load balancer",
            Self::Distribution => "the distribution",
        }
    }
}

/// DNS-validated certificate for exactly one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: LogicalId,
    pub domain_name: String,
    pub hosted_zone: LogicalId,
    pub region: String,
    pub consumer: CertificateConsumer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AliasTarget {
    LoadBalancer { service: LogicalId },
    Distribution { distribution: LogicalId },
}

impl AliasTarget {
    fn reference(&self) -> (&LogicalId, ResourceKind) {
        match self {
            Self::LoadBalancer { service } => (service, ResourceKind::Service),
            Self::Distribution { distribution } => (distribution, ResourceKind::Distribution),
        }
    }
}

/// Alias A record; carries no TTL or value of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: LogicalId,
    pub hosted_zone: LogicalId,
    pub record_name: String,
    pub target: AliasTarget,
}

// ── Database ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    #[default]
    Postgres,
    Mysql,
}

impl DatabaseEngine {
    /// The engine's standard listening port.
    pub fn port(self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Mysql => 3306,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Peer {
    SecurityGroup { group: LogicalId },
    AnyIpv4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: Peer,
    pub port: u16,
}

/// Generated master credentials; the password never leaves the secret store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub secret_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: LogicalId,
    pub network: LogicalId,
    pub engine: DatabaseEngine,
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage_gib: u32,
    pub multi_az: bool,
    pub database_name: String,
    pub credentials: Credentials,
    /// Rules of the database's dedicated security group.
    pub ingress: Vec<IngressRule>,
    pub removal: RemovalPolicy,
}

// ── Outputs ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub description: String,
    pub value: OutputValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputValue {
    LoadBalancerDnsName {
        service: LogicalId,
    },
    DistributionDomainName {
        distribution: LogicalId,
    },
    DistributionId {
        distribution: LogicalId,
    },
    /// `https://` plus the custom domain, or the distribution domain without one.
    FrontendUrl {
        distribution: LogicalId,
        domain_name: Option<String>,
    },
    DatabaseEndpoint {
        database: LogicalId,
    },
}

impl OutputValue {
    pub fn reference(&self) -> (&LogicalId, ResourceKind) {
        match self {
            Self::LoadBalancerDnsName { service } => (service, ResourceKind::Service),
            Self::DistributionDomainName { distribution }
            | Self::DistributionId { distribution }
            | Self::FrontendUrl { distribution, .. } => (distribution, ResourceKind::Distribution),
            Self::DatabaseEndpoint { database } => (database, ResourceKind::Database),
        }
    }
}
