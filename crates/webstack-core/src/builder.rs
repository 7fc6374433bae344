//! Assembles a [`Declaration`] from configuration and resolved lookups.

use std::collections::BTreeMap;

use crate::config::{RouteOrigin, ServiceConfig, WebstackConfig};
use crate::declaration::Declaration;
use crate::lookup::{HostedZoneCandidate, NetworkCandidate};
use crate::resource::{
    AliasTarget, Attribute, Behavior, Bucket, Certificate, CertificateConsumer, Cluster,
    Credentials, Database, Distribution, DnsRecord, EnvValue, HostedZoneRef, ImageSource,
    IngressRule, Listener, LogicalId, NetworkRef, Origin, OriginProtocolPolicy,
    OriginRequestPolicy, Output, OutputValue, PathBehavior, Peer, RemovalPolicy, Resource,
    RolloutBounds, SecretRef, SecurityGroup, Service,
};

/// Environment variables injected when a database is configured.
pub const DB_HOST_VAR: &str = "DB_HOST";
pub const DB_PORT_VAR: &str = "DB_PORT";
pub const DB_NAME_VAR: &str = "DB_NAME";
pub const DB_USER_VAR: &str = "DB_USER";
pub const DB_PASSWORD_VAR: &str = "DB_PASSWORD";

/// Output names, fixed by role.
pub const LOAD_BALANCER_DNS_OUTPUT: &str = "LoadBalancerDNS";
pub const DISTRIBUTION_DOMAIN_OUTPUT: &str = "DistributionDomainName";
pub const DISTRIBUTION_ID_OUTPUT: &str = "DistributionId";
pub const FRONTEND_URL_OUTPUT: &str = "FrontendURL";
pub const DATABASE_ENDPOINT_OUTPUT: &str = "DatabaseEndpoint";

/// Logical id of the service generated for `service`.
pub fn service_logical_id(service: &ServiceConfig) -> LogicalId {
    LogicalId::new(&service.name).child("FargateService")
}

/// Builds the declaration for one stack.
///
/// Lookups are supplied already resolved (see [`crate::lookup`]); the builder
/// itself never talks to the provider.
///
/// # Examples
///
/// ```
/// use webstack_core::{DeclarationBuilder, NetworkCandidate, WebstackConfig};
///
/// let config = WebstackConfig::default();
/// let declaration = DeclarationBuilder::new(&config)
///     .network(NetworkCandidate {
///         vpc_id: "vpc-0123".to_owned(),
///         name: Some("jenkins-vpc".to_owned()),
///         public_subnets: vec!["subnet-a".to_owned(), "subnet-b".to_owned()],
///         private_subnets: vec![],
///     })
///     .build()
///     .unwrap();
/// assert_eq!(declaration.services().count(), 1);
/// ```
pub struct DeclarationBuilder<'a> {
    config: &'a WebstackConfig,
    network: Option<NetworkCandidate>,
    hosted_zone: Option<HostedZoneCandidate>,
}

impl<'a> DeclarationBuilder<'a> {
    pub fn new(config: &'a WebstackConfig) -> Self {
        Self {
            config,
            network: None,
            hosted_zone: None,
        }
    }

    pub fn network(mut self, network: NetworkCandidate) -> Self {
        self.network = Some(network);
        self
    }

    pub fn hosted_zone(mut self, zone: HostedZoneCandidate) -> Self {
        self.hosted_zone = Some(zone);
        self
    }

    /// Compose and validate the declaration.
    ///
    /// # Errors
    ///
    /// Any missing lookup, invalid setting, or violated invariant.
    pub fn build(self) -> crate::Result<Declaration> {
        let config = self.config;
        let stack = &config.stack;
        let svc = &config.service;
        let base = LogicalId::new(&svc.name);

        let mut resources = Vec::new();
        let mut outputs = Vec::new();

        // ── Network ──
        let candidate = self.network.ok_or(crate::Error::MissingField {
            field: "network.vpc_name",
            reason: "the VPC lookup has not been resolved",
        })?;
        let network_id = base.child("Vpc");
        resources.push(Resource::Network(NetworkRef {
            id: network_id.clone(),
            name: config.network.vpc_name.clone(),
            vpc_id: candidate.vpc_id,
            public_subnets: candidate.public_subnets,
            private_subnets: candidate.private_subnets,
        }));

        // ── Hosted zone ──
        let zone_id = if config.needs_hosted_zone() {
            let dns = config.dns.as_ref().ok_or(crate::Error::MissingField {
                field: "dns.hosted_zone",
                reason: "custom domains need a hosted zone",
            })?;
            let zone = self.hosted_zone.ok_or(crate::Error::MissingField {
                field: "dns.hosted_zone",
                reason: "the hosted zone lookup has not been resolved",
            })?;
            let id = LogicalId::new("HostedZone");
            resources.push(Resource::HostedZone(HostedZoneRef {
                id: id.clone(),
                name: crate::lookup::normalize_zone_name(&dns.hosted_zone).to_owned(),
                zone_id: zone.zone_id,
            }));
            Some(id)
        } else {
            None
        };

        // ── Compute ──
        let security_group_id = base.child("ServiceSecurityGroup");
        resources.push(Resource::SecurityGroup(SecurityGroup {
            id: security_group_id.clone(),
            network: network_id.clone(),
            description: format!("{} compute tier", svc.name),
        }));

        let cluster_id = base.child("Cluster");
        resources.push(Resource::Cluster(Cluster {
            id: cluster_id.clone(),
            network: network_id.clone(),
        }));

        let service_id = service_logical_id(svc);

        let api_certificate = match (&svc.domain_name, &zone_id) {
            (Some(domain), Some(zone)) => {
                let id = LogicalId::new("ApiCertificate");
                resources.push(Resource::Certificate(Certificate {
                    id: id.clone(),
                    domain_name: domain.clone(),
                    hosted_zone: zone.clone(),
                    region: stack.region.clone(),
                    consumer: CertificateConsumer::LoadBalancer,
                }));
                resources.push(Resource::DnsRecord(DnsRecord {
                    id: LogicalId::new("ApiAliasRecord"),
                    hosted_zone: zone.clone(),
                    record_name: domain.clone(),
                    target: AliasTarget::LoadBalancer {
                        service: service_id.clone(),
                    },
                }));
                Some(id)
            }
            _ => None,
        };

        let mut environment: BTreeMap<String, EnvValue> = svc
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), EnvValue::literal(v)))
            .collect();

        // ── Database ──
        if let Some(db) = &config.database {
            let db_id = base.child("Database");
            resources.push(Resource::Database(Database {
                id: db_id.clone(),
                network: network_id.clone(),
                engine: db.engine,
                engine_version: db.engine_version.clone(),
                instance_class: db.instance_class.clone(),
                allocated_storage_gib: db.allocated_storage_gib,
                multi_az: false,
                database_name: db.database_name.clone(),
                credentials: Credentials {
                    username: db.username.clone(),
                    secret_name: format!("{}/{}/credentials", stack.name, db_id),
                },
                ingress: vec![IngressRule {
                    peer: Peer::SecurityGroup {
                        group: security_group_id.clone(),
                    },
                    port: db.engine.port(),
                }],
                removal: RemovalPolicy::Destroy,
            }));

            let injected = [
                (
                    DB_HOST_VAR,
                    EnvValue::Attribute {
                        resource: db_id.clone(),
                        attribute: Attribute::EndpointAddress,
                    },
                ),
                (
                    DB_PORT_VAR,
                    EnvValue::Attribute {
                        resource: db_id.clone(),
                        attribute: Attribute::EndpointPort,
                    },
                ),
                (DB_NAME_VAR, EnvValue::literal(&db.database_name)),
                (DB_USER_VAR, EnvValue::literal(&db.username)),
                (
                    DB_PASSWORD_VAR,
                    EnvValue::Secret {
                        secret: SecretRef {
                            owner: db_id.clone(),
                            field: "password".to_owned(),
                        },
                    },
                ),
            ];
            for (name, value) in injected {
                if environment.insert(name.to_owned(), value).is_some() {
                    return Err(crate::Error::InvalidParameter {
                        field: format!("service.environment.{name}"),
                        reason: "reserved for the injected database connection".to_owned(),
                    });
                }
            }

            outputs.push(Output {
                name: DATABASE_ENDPOINT_OUTPUT.to_owned(),
                description: "The endpoint address of the database".to_owned(),
                value: OutputValue::DatabaseEndpoint { database: db_id },
            });
        }

        let image = match (&svc.image, &svc.build_context) {
            (Some(uri), _) => ImageSource::Registry { uri: uri.clone() },
            (None, Some(dir)) => ImageSource::Asset {
                directory: dir.clone(),
            },
            (None, None) => {
                return Err(crate::Error::MissingField {
                    field: "service.build_context",
                    reason: "set either `build_context` or `image`",
                });
            }
        };

        resources.push(Resource::Service(Service {
            id: service_id.clone(),
            cluster: cluster_id,
            security_group: security_group_id,
            image,
            container_port: svc.container_port,
            memory_limit_mib: svc.memory_limit_mib,
            cpu: svc.cpu,
            desired_count: svc.desired_count,
            public_load_balancer: svc.public_load_balancer,
            listener: Listener::for_certificate(api_certificate.is_some()),
            certificate: api_certificate,
            environment,
            health_check_grace_period_secs: svc.health_check_grace_period_secs,
            health_check_path: svc.health_check_path.clone(),
            rollout: RolloutBounds {
                min_healthy_percent: svc.min_healthy_percent,
                max_healthy_percent: svc.max_healthy_percent,
            },
        }));
        outputs.insert(
            0,
            Output {
                name: LOAD_BALANCER_DNS_OUTPUT.to_owned(),
                description: "The DNS name of the load balancer".to_owned(),
                value: OutputValue::LoadBalancerDnsName {
                    service: service_id.clone(),
                },
            },
        );

        // ── Frontend ──
        if let Some(frontend) = &config.frontend {
            let bucket_id = LogicalId::new("FrontendBucket");
            resources.push(Resource::Bucket(Bucket {
                id: bucket_id.clone(),
                index_document: frontend.index_document.clone(),
                public_read: frontend.public_read,
                auto_delete_objects: frontend.auto_delete_objects,
                // A bucket that is not emptied cannot be deleted with its stack.
                removal: if frontend.auto_delete_objects {
                    RemovalPolicy::Destroy
                } else {
                    RemovalPolicy::Retain
                },
            }));

            let mut behaviors = Vec::with_capacity(frontend.routes.len());
            for route in &frontend.routes {
                if route.origin == RouteOrigin::LoadBalancer && !svc.public_load_balancer {
                    return Err(crate::Error::InvalidParameter {
                        field: format!("frontend.routes[{}].origin", route.path_pattern),
                        reason: "the service load balancer is internal and unreachable from the distribution"
                            .to_owned(),
                    });
                }
                let origin = match (route.origin, &svc.domain_name) {
                    // The listener only serves HTTPS, under the API domain's certificate.
                    (RouteOrigin::LoadBalancer, Some(domain)) => Origin::Http {
                        domain_name: domain.clone(),
                        protocol: OriginProtocolPolicy::HttpsOnly,
                    },
                    (RouteOrigin::LoadBalancer, None) => Origin::LoadBalancer {
                        service: service_id.clone(),
                        protocol: route.protocol,
                    },
                    (RouteOrigin::Http, _) => Origin::Http {
                        domain_name: route.domain_name.clone().ok_or_else(|| {
                            crate::Error::InvalidParameter {
                                field: format!("frontend.routes[{}].domain_name", route.path_pattern),
                                reason: "an `http` origin needs a domain name".to_owned(),
                            }
                        })?,
                        protocol: route.protocol,
                    },
                };
                let mut behavior = Behavior::dynamic(origin);
                behavior.viewer_protocol = frontend.viewer_protocol;
                if !route.forward_cookies {
                    behavior.origin_request_policy =
                        Some(OriginRequestPolicy::forward_all().without_cookies());
                }
                behaviors.push(PathBehavior {
                    path_pattern: route.path_pattern.clone(),
                    behavior,
                });
            }

            let distribution_id = LogicalId::new("FrontendDistribution");
            let (certificate, domain_names) = match (&frontend.domain_name, &zone_id) {
                (Some(domain), Some(zone)) => {
                    let id = LogicalId::new("FrontendCertificate");
                    resources.push(Resource::Certificate(Certificate {
                        id: id.clone(),
                        domain_name: domain.clone(),
                        hosted_zone: zone.clone(),
                        region: frontend.certificate_region.clone(),
                        consumer: CertificateConsumer::Distribution,
                    }));
                    resources.push(Resource::DnsRecord(DnsRecord {
                        id: LogicalId::new("FrontendAliasRecord"),
                        hosted_zone: zone.clone(),
                        record_name: domain.clone(),
                        target: AliasTarget::Distribution {
                            distribution: distribution_id.clone(),
                        },
                    }));
                    (Some(id), vec![domain.clone()])
                }
                _ => (None, Vec::new()),
            };

            resources.push(Resource::Distribution(Distribution {
                id: distribution_id.clone(),
                default_behavior: Behavior {
                    viewer_protocol: frontend.viewer_protocol,
                    ..Behavior::static_site(bucket_id)
                },
                behaviors,
                domain_names,
                certificate,
            }));

            outputs.extend([
                Output {
                    name: DISTRIBUTION_DOMAIN_OUTPUT.to_owned(),
                    description: "The domain name of the distribution".to_owned(),
                    value: OutputValue::DistributionDomainName {
                        distribution: distribution_id.clone(),
                    },
                },
                Output {
                    name: DISTRIBUTION_ID_OUTPUT.to_owned(),
                    description: "The id of the distribution".to_owned(),
                    value: OutputValue::DistributionId {
                        distribution: distribution_id.clone(),
                    },
                },
                Output {
                    name: FRONTEND_URL_OUTPUT.to_owned(),
                    description: "The URL of the frontend".to_owned(),
                    value: OutputValue::FrontendUrl {
                        distribution: distribution_id,
                        domain_name: frontend.domain_name.clone(),
                    },
                },
            ]);
        }

        let declaration = Declaration {
            stack_name: stack.name.clone(),
            region: stack.region.clone(),
            account: stack.account.clone(),
            resources,
            outputs,
        };
        declaration.validate()?;

        tracing::debug!(
            stack = %declaration.stack_name,
            resources = declaration.resources.len(),
            "declaration built"
        );
        Ok(declaration)
    }
}
