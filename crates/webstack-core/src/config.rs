use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resource::{DatabaseEngine, OriginProtocolPolicy, ViewerProtocolPolicy};

/// Region every CloudFront viewer certificate must be issued in.
pub const DISTRIBUTION_CERTIFICATE_REGION: &str = "us-east-1";

pub const CONFIG_FILE: &str = "webstack.toml";

/// webstack.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebstackConfig {
    #[serde(default)]
    pub stack: StackConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    /// Static site bucket and CloudFront distribution. Omitted: API only.
    #[serde(default)]
    pub frontend: Option<FrontendConfig>,
    /// Hosted zone used for certificates and alias records.
    #[serde(default)]
    pub dns: Option<DnsConfig>,
    /// Managed relational database injected into the service.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// CloudFormation stack name
    #[serde(default = "default_stack_name")]
    pub name: String,
    /// Primary AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// AWS account id (defaults to the caller identity at deploy time)
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `Name` tag of the existing VPC to deploy into
    #[serde(default = "default_vpc_name")]
    pub vpc_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Logical name of the service
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Docker build context, relative to the config file
    #[serde(default = "default_build_context")]
    pub build_context: Option<PathBuf>,
    /// Prebuilt image URI. Takes precedence over `build_context`.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_container_port")]
    pub container_port: u16,
    #[serde(default = "default_memory_limit_mib")]
    pub memory_limit_mib: u32,
    /// Fargate CPU units
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,
    #[serde(default = "default_true")]
    pub public_load_balancer: bool,
    #[serde(default = "default_health_check_grace_period_secs")]
    pub health_check_grace_period_secs: u32,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    /// Lower bound on running tasks during a rollout, percent of desired count
    #[serde(default = "default_min_healthy_percent")]
    pub min_healthy_percent: u32,
    /// Upper bound on running tasks during a rollout, percent of desired count
    #[serde(default = "default_max_healthy_percent")]
    pub max_healthy_percent: u32,
    /// Custom API domain. Enables a certificate, an HTTPS listener, and an alias record.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Static environment variables for the container.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_index_document")]
    pub index_document: String,
    #[serde(default = "default_true")]
    pub public_read: bool,
    /// Empty the bucket before the stack is destroyed
    #[serde(default = "default_true")]
    pub auto_delete_objects: bool,
    /// Custom frontend domain. Enables a certificate and an alias record.
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default = "default_certificate_region")]
    pub certificate_region: String,
    /// Applied to every behavior of the distribution.
    #[serde(default)]
    pub viewer_protocol: ViewerProtocolPolicy,
    /// Path patterns forwarded to a dynamic origin instead of the bucket.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path_pattern: String,
    #[serde(default)]
    pub origin: RouteOrigin,
    /// Required when `origin = "http"`
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Ignored for `load-balancer` when `service.domain_name` is set: the
    /// route then goes to that domain over HTTPS.
    #[serde(default)]
    pub protocol: OriginProtocolPolicy,
    #[serde(default = "default_true")]
    pub forward_cookies: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOrigin {
    /// The service's load balancer
    #[default]
    LoadBalancer,
    /// A custom-domain HTTP endpoint
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    pub hosted_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub engine: DatabaseEngine,
    #[serde(default = "default_engine_version")]
    pub engine_version: String,
    /// Instance class without the `db.` prefix
    #[serde(default = "default_instance_class")]
    pub instance_class: String,
    #[serde(default = "default_allocated_storage_gib")]
    pub allocated_storage_gib: u32,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    #[serde(default = "default_username")]
    pub username: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            name: default_stack_name(),
            region: default_region(),
            account: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            vpc_name: default_vpc_name(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            build_context: default_build_context(),
            image: None,
            container_port: default_container_port(),
            memory_limit_mib: default_memory_limit_mib(),
            cpu: default_cpu(),
            desired_count: default_desired_count(),
            public_load_balancer: true,
            health_check_grace_period_secs: default_health_check_grace_period_secs(),
            health_check_path: default_health_check_path(),
            min_healthy_percent: default_min_healthy_percent(),
            max_healthy_percent: default_max_healthy_percent(),
            domain_name: None,
            environment: BTreeMap::new(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            index_document: default_index_document(),
            public_read: true,
            auto_delete_objects: true,
            domain_name: None,
            certificate_region: default_certificate_region(),
            viewer_protocol: ViewerProtocolPolicy::default(),
            routes: default_routes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::default(),
            engine_version: default_engine_version(),
            instance_class: default_instance_class(),
            allocated_storage_gib: default_allocated_storage_gib(),
            database_name: default_database_name(),
            username: default_username(),
        }
    }
}

impl WebstackConfig {
    /// Load from webstack.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            tracing::debug!(path = %config_path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Whether any configured domain needs the hosted zone.
    pub fn needs_hosted_zone(&self) -> bool {
        self.service.domain_name.is_some()
            || self
                .frontend
                .as_ref()
                .is_some_and(|f| f.domain_name.is_some())
    }
}

fn default_stack_name() -> String {
    "WebStack".to_owned()
}

fn default_region() -> String {
    "us-west-2".to_owned()
}

fn default_vpc_name() -> String {
    "jenkins-vpc".to_owned()
}

fn default_service_name() -> String {
    "Counter".to_owned()
}

fn default_build_context() -> Option<PathBuf> {
    Some(PathBuf::from("../back"))
}

fn default_container_port() -> u16 {
    8080
}

fn default_memory_limit_mib() -> u32 {
    512
}

fn default_cpu() -> u32 {
    256
}

fn default_desired_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_health_check_grace_period_secs() -> u32 {
    60
}

fn default_health_check_path() -> String {
    "/".to_owned()
}

fn default_min_healthy_percent() -> u32 {
    100
}

fn default_max_healthy_percent() -> u32 {
    200
}

fn default_index_document() -> String {
    "index.html".to_owned()
}

fn default_certificate_region() -> String {
    DISTRIBUTION_CERTIFICATE_REGION.to_owned()
}

fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig {
        path_pattern: "/api/*".to_owned(),
        origin: RouteOrigin::LoadBalancer,
        domain_name: None,
        protocol: OriginProtocolPolicy::HttpOnly,
        forward_cookies: true,
    }]
}

fn default_engine_version() -> String {
    "16.3".to_owned()
}

fn default_instance_class() -> String {
    "t3.micro".to_owned()
}

fn default_allocated_storage_gib() -> u32 {
    20
}

fn default_database_name() -> String {
    "counter".to_owned()
}

fn default_username() -> String {
    "postgres".to_owned()
}
