use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use webstack_core::resource::{
    AliasTarget, Attribute, Behavior, Bucket, Certificate, Cluster, Database, Distribution,
    DnsRecord, EnvValue, ForwardPolicy, ImageSource, ListenerProtocol, Origin,
    OriginProtocolPolicy, OriginRequestPolicy, OutputValue, Peer, RemovalPolicy, SecurityGroup,
    Service,
};
use webstack_core::{Declaration, LogicalId, Resource};

/// Hosted zone id shared by every CloudFront distribution for alias records.
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

const TEMPLATE_VERSION: &str = "2010-09-09";
const CONTAINER_NAME: &str = "web";
const LOG_RETENTION_DAYS: u32 = 7;

/// Rendered output of one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Stacks in deploy order: certificate stacks first, the main stack last.
    pub stacks: Vec<StackTemplate>,
    pub assets: Vec<ImageAsset>,
}

impl Synthesis {
    pub fn main_stack(&self) -> Option<&StackTemplate> {
        self.stacks.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackTemplate {
    pub stack_name: String,
    pub region: String,
    pub template: Value,
    /// Parameters filled from other stacks' outputs at deploy time.
    pub parameters: Vec<ParameterBinding>,
    /// Buckets (logical ids) to empty before this stack is deleted.
    pub auto_delete_buckets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub parameter: String,
    pub source_stack: String,
    pub source_output: String,
}

/// A container image built from a local directory and pushed before deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub service: String,
    pub directory: PathBuf,
    /// Main-stack parameter receiving the pushed image URI.
    pub parameter: String,
    /// ECR repository name.
    pub repository: String,
}

/// Renders a validated [`Declaration`] as CloudFormation templates.
///
/// Certificates consumed outside the stack's own region (CloudFront viewer
/// certificates) go into a separate stack per region; their ARNs reach the
/// main stack through parameters bound to that stack's outputs.
pub struct TemplateRenderer<'a> {
    declaration: &'a Declaration,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(declaration: &'a Declaration) -> Self {
        Self { declaration }
    }

    pub fn render(&self) -> Result<Synthesis, SynthError> {
        let decl = self.declaration;
        decl.validate()
            .map_err(|e| SynthError::InvalidDeclaration { source: e })?;

        let mut ctx = RenderContext::new(decl);

        // Certificates living in a foreign region get their own stacks.
        let mut foreign: BTreeMap<&str, Vec<&Certificate>> = BTreeMap::new();
        for cert in decl.certificates() {
            if cert.region != decl.region {
                foreign.entry(cert.region.as_str()).or_default().push(cert);
            }
        }

        let mut stacks = Vec::new();
        for (region, certs) in &foreign {
            let stack_name = format!("{}-certificates-{region}", decl.stack_name);
            let mut resources = Map::new();
            let mut outputs = Map::new();
            for cert in certs {
                resources.insert(cert.id.to_string(), ctx.certificate(cert)?);
                let output = format!("{}Arn", cert.id);
                outputs.insert(
                    output.clone(),
                    json!({
                        "Description": format!("ARN of the certificate for {}", cert.domain_name),
                        "Value": reference(&cert.id),
                    }),
                );
                ctx.parameters.push(ParameterBinding {
                    parameter: output.clone(),
                    source_stack: stack_name.clone(),
                    source_output: output,
                });
            }
            tracing::debug!(stack = %stack_name, certificates = certs.len(), "rendered certificate stack");
            stacks.push(StackTemplate {
                stack_name,
                region: (*region).to_owned(),
                template: json!({
                    "AWSTemplateFormatVersion": TEMPLATE_VERSION,
                    "Description": format!("Certificates for {} issued in {region}", decl.stack_name),
                    "Resources": resources,
                    "Outputs": outputs,
                }),
                parameters: Vec::new(),
                auto_delete_buckets: Vec::new(),
            });
        }

        let order = decl
            .apply_order()
            .map_err(|e| SynthError::InvalidDeclaration { source: e })?;
        for resource in order {
            ctx.render_resource(resource)?;
        }

        let mut outputs = Map::new();
        for output in &decl.outputs {
            outputs.insert(
                output.name.clone(),
                json!({
                    "Description": output.description,
                    "Value": output_value(&output.value),
                }),
            );
        }

        let mut parameters = Map::new();
        for binding in &ctx.parameters {
            parameters.insert(
                binding.parameter.clone(),
                json!({
                    "Type": "String",
                    "Description": format!("Output {} of stack {}", binding.source_output, binding.source_stack),
                }),
            );
        }
        for asset in &ctx.assets {
            parameters.insert(
                asset.parameter.clone(),
                json!({
                    "Type": "String",
                    "Description": format!("Image URI for {}", asset.service),
                }),
            );
        }

        let mut template = Map::new();
        template.insert("AWSTemplateFormatVersion".to_owned(), json!(TEMPLATE_VERSION));
        template.insert(
            "Description".to_owned(),
            json!(format!("{} deployed by webstack", decl.stack_name)),
        );
        if !parameters.is_empty() {
            template.insert("Parameters".to_owned(), Value::Object(parameters));
        }
        template.insert("Resources".to_owned(), Value::Object(ctx.resources));
        template.insert("Outputs".to_owned(), Value::Object(outputs));

        tracing::debug!(
            stack = %decl.stack_name,
            certificate_stacks = stacks.len(),
            assets = ctx.assets.len(),
            "rendered main stack"
        );

        stacks.push(StackTemplate {
            stack_name: decl.stack_name.clone(),
            region: decl.region.clone(),
            template: Value::Object(template),
            parameters: ctx.parameters,
            auto_delete_buckets: ctx.auto_delete_buckets,
        });

        Ok(Synthesis {
            stacks,
            assets: ctx.assets,
        })
    }
}

/// Accumulates the main stack while resources are visited in apply order.
struct RenderContext<'a> {
    decl: &'a Declaration,
    resources: Map<String, Value>,
    parameters: Vec<ParameterBinding>,
    assets: Vec<ImageAsset>,
    auto_delete_buckets: Vec<String>,
}

impl<'a> RenderContext<'a> {
    fn new(decl: &'a Declaration) -> Self {
        Self {
            decl,
            resources: Map::new(),
            parameters: Vec::new(),
            assets: Vec::new(),
            auto_delete_buckets: Vec::new(),
        }
    }

    fn render_resource(&mut self, resource: &Resource) -> Result<(), SynthError> {
        match resource {
            // Referenced, never owned.
            Resource::Network(_) | Resource::HostedZone(_) => {}
            Resource::SecurityGroup(sg) => self.security_group(sg)?,
            Resource::Cluster(cluster) => self.cluster(cluster),
            Resource::Service(service) => self.service(service)?,
            Resource::Bucket(bucket) => self.bucket(bucket),
            Resource::Distribution(dist) => self.distribution(dist)?,
            Resource::Certificate(cert) => {
                if cert.region == self.decl.region {
                    let rendered = self.certificate(cert)?;
                    self.insert(&cert.id, rendered);
                }
            }
            Resource::DnsRecord(record) => self.dns_record(record)?,
            Resource::Database(db) => self.database(db)?,
        }
        Ok(())
    }

    fn insert(&mut self, id: &LogicalId, value: Value) {
        self.resources.insert(id.to_string(), value);
    }

    /// Explicit `DependsOn` for declared edges that land in this stack.
    fn depends_on(&self, id: &LogicalId) -> Vec<String> {
        self.decl
            .dependencies(id)
            .into_iter()
            .filter(|dep| {
                self.decl.get(dep).is_some_and(|r| match r {
                    Resource::Network(_) | Resource::HostedZone(_) => false,
                    Resource::Certificate(c) => c.region == self.decl.region,
                    _ => true,
                })
            })
            .map(ToString::to_string)
            .collect()
    }

    fn certificate_arn(&self, id: &LogicalId) -> Result<Value, SynthError> {
        let cert = self
            .decl
            .certificate(id)
            .ok_or_else(|| unresolved(id, id))?;
        if cert.region == self.decl.region {
            Ok(reference(id))
        } else {
            Ok(json!({ "Ref": format!("{id}Arn") }))
        }
    }

    fn network_of(&self, from: &LogicalId, network: &LogicalId) -> Result<&'a webstack_core::resource::NetworkRef, SynthError> {
        self.decl
            .network(network)
            .ok_or_else(|| unresolved(from, network))
    }

    fn certificate(&self, cert: &Certificate) -> Result<Value, SynthError> {
        let zone = self
            .decl
            .hosted_zone(&cert.hosted_zone)
            .ok_or_else(|| unresolved(&cert.id, &cert.hosted_zone))?;
        Ok(json!({
            "Type": "AWS::CertificateManager::Certificate",
            "Properties": {
                "DomainName": cert.domain_name,
                "ValidationMethod": "DNS",
                "DomainValidationOptions": [{
                    "DomainName": cert.domain_name,
                    "HostedZoneId": zone.zone_id,
                }],
            },
        }))
    }

    fn security_group(&mut self, sg: &SecurityGroup) -> Result<(), SynthError> {
        let network = self.network_of(&sg.id, &sg.network)?;
        let rendered = json!({
            "Type": "AWS::EC2::SecurityGroup",
            "Properties": {
                "GroupDescription": sg.description,
                "VpcId": network.vpc_id,
                "SecurityGroupEgress": [{ "CidrIp": "0.0.0.0/0", "IpProtocol": "-1" }],
            },
        });
        self.insert(&sg.id, rendered);
        Ok(())
    }

    fn cluster(&mut self, cluster: &Cluster) {
        self.insert(&cluster.id, json!({ "Type": "AWS::ECS::Cluster" }));
    }

    fn service(&mut self, svc: &Service) -> Result<(), SynthError> {
        let cluster = self
            .decl
            .cluster(&svc.cluster)
            .ok_or_else(|| unresolved(&svc.id, &svc.cluster))?;
        let network = self.network_of(&svc.id, &cluster.network)?;

        let lb_sg = svc.id.child("LoadBalancerSecurityGroup");
        let lb = svc.id.child("LoadBalancer");
        let target_group = svc.id.child("TargetGroup");
        let listener = svc.id.child("Listener");
        let ingress = svc.id.child("IngressFromLoadBalancer");
        let log_group = svc.id.child("LogGroup");
        let execution_role = svc.id.child("ExecutionRole");
        let task_definition = svc.id.child("TaskDefinition");

        self.insert(
            &lb_sg,
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": format!("Load balancer for {}", svc.id),
                    "VpcId": network.vpc_id,
                    "SecurityGroupIngress": [{
                        "CidrIp": "0.0.0.0/0",
                        "IpProtocol": "tcp",
                        "FromPort": svc.listener.port,
                        "ToPort": svc.listener.port,
                    }],
                },
            }),
        );

        let lb_subnets = if svc.public_load_balancer {
            &network.public_subnets
        } else {
            network.workload_subnets()
        };
        self.insert(
            &lb,
            json!({
                "Type": "AWS::ElasticLoadBalancingV2::LoadBalancer",
                "Properties": {
                    "Type": "application",
                    "Scheme": if svc.public_load_balancer { "internet-facing" } else { "internal" },
                    "Subnets": lb_subnets,
                    "SecurityGroups": [get_att(&lb_sg, "GroupId")],
                },
            }),
        );

        self.insert(
            &target_group,
            json!({
                "Type": "AWS::ElasticLoadBalancingV2::TargetGroup",
                "Properties": {
                    "Port": svc.container_port,
                    "Protocol": "HTTP",
                    "TargetType": "ip",
                    "VpcId": network.vpc_id,
                    "HealthCheckPath": svc.health_check_path,
                },
            }),
        );

        let mut listener_props = json!({
            "LoadBalancerArn": reference(&lb),
            "Port": svc.listener.port,
            "Protocol": match svc.listener.protocol {
                ListenerProtocol::Http => "HTTP",
                ListenerProtocol::Https => "HTTPS",
            },
            "DefaultActions": [{ "Type": "forward", "TargetGroupArn": reference(&target_group) }],
        });
        if let Some(cert) = &svc.certificate {
            listener_props["Certificates"] = json!([{ "CertificateArn": self.certificate_arn(cert)? }]);
        }
        self.insert(
            &listener,
            json!({
                "Type": "AWS::ElasticLoadBalancingV2::Listener",
                "Properties": listener_props,
            }),
        );

        self.insert(
            &ingress,
            json!({
                "Type": "AWS::EC2::SecurityGroupIngress",
                "Properties": {
                    "GroupId": get_att(&svc.security_group, "GroupId"),
                    "SourceSecurityGroupId": get_att(&lb_sg, "GroupId"),
                    "IpProtocol": "tcp",
                    "FromPort": svc.container_port,
                    "ToPort": svc.container_port,
                },
            }),
        );

        self.insert(
            &log_group,
            json!({
                "Type": "AWS::Logs::LogGroup",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "LogGroupName": log_group_name(&self.decl.stack_name, &svc.id),
                    "RetentionInDays": LOG_RETENTION_DAYS,
                },
            }),
        );

        let mut environment = Vec::new();
        let mut secrets = Vec::new();
        let mut secret_arns = Vec::new();
        for (name, value) in &svc.environment {
            match value {
                EnvValue::Literal { value } => {
                    environment.push(json!({ "Name": name, "Value": value }));
                }
                EnvValue::Attribute {
                    resource,
                    attribute,
                } => {
                    environment.push(
                        json!({ "Name": name, "Value": get_att(resource, attribute.as_str()) }),
                    );
                }
                EnvValue::Secret { secret } => {
                    let secret_id = secret.owner.child("Secret");
                    secrets.push(json!({
                        "Name": name,
                        "ValueFrom": {
                            "Fn::Join": ["", [reference(&secret_id), format!(":{}::", secret.field)]],
                        },
                    }));
                    secret_arns.push(reference(&secret_id));
                }
            }
        }

        let mut role_props = json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                    "Action": "sts:AssumeRole",
                }],
            },
            "ManagedPolicyArns": [
                "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy",
            ],
        });
        if !secret_arns.is_empty() {
            role_props["Policies"] = json!([{
                "PolicyName": "ReadInjectedSecrets",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
                        "Resource": secret_arns,
                    }],
                },
            }]);
        }
        self.insert(
            &execution_role,
            json!({ "Type": "AWS::IAM::Role", "Properties": role_props }),
        );

        let image = match &svc.image {
            ImageSource::Registry { uri } => json!(uri),
            ImageSource::Asset { directory } => {
                let parameter = svc.id.child("ImageUri").to_string();
                self.assets.push(ImageAsset {
                    service: svc.id.to_string(),
                    directory: directory.clone(),
                    parameter: parameter.clone(),
                    repository: format!(
                        "{}/{}",
                        self.decl.stack_name.to_lowercase(),
                        svc.id.as_str().to_lowercase()
                    ),
                });
                json!({ "Ref": parameter })
            }
        };

        let mut container = json!({
            "Name": CONTAINER_NAME,
            "Image": image,
            "Essential": true,
            "Memory": svc.memory_limit_mib,
            "PortMappings": [{ "ContainerPort": svc.container_port, "Protocol": "tcp" }],
            "LogConfiguration": {
                "LogDriver": "awslogs",
                "Options": {
                    "awslogs-group": reference(&log_group),
                    "awslogs-region": self.decl.region,
                    "awslogs-stream-prefix": svc.id.as_str(),
                },
            },
        });
        if !environment.is_empty() {
            container["Environment"] = Value::Array(environment);
        }
        if !secrets.is_empty() {
            container["Secrets"] = Value::Array(secrets);
        }

        self.insert(
            &task_definition,
            json!({
                "Type": "AWS::ECS::TaskDefinition",
                "Properties": {
                    "Family": format!("{}-{}", self.decl.stack_name, svc.id),
                    "Cpu": svc.cpu.to_string(),
                    "Memory": svc.memory_limit_mib.to_string(),
                    "NetworkMode": "awsvpc",
                    "RequiresCompatibilities": ["FARGATE"],
                    "ExecutionRoleArn": get_att(&execution_role, "Arn"),
                    "ContainerDefinitions": [container],
                },
            }),
        );

        let mut depends_on = self.depends_on(&svc.id);
        depends_on.push(listener.to_string());
        let assign_public_ip = if network.private_subnets.is_empty() {
            "ENABLED"
        } else {
            "DISABLED"
        };
        self.insert(
            &svc.id,
            json!({
                "Type": "AWS::ECS::Service",
                "DependsOn": depends_on,
                "Properties": {
                    "Cluster": reference(&cluster.id),
                    "LaunchType": "FARGATE",
                    "DesiredCount": svc.desired_count,
                    "TaskDefinition": reference(&task_definition),
                    "HealthCheckGracePeriodSeconds": svc.health_check_grace_period_secs,
                    "DeploymentConfiguration": {
                        "MinimumHealthyPercent": svc.rollout.min_healthy_percent,
                        "MaximumPercent": svc.rollout.max_healthy_percent,
                    },
                    "LoadBalancers": [{
                        "ContainerName": CONTAINER_NAME,
                        "ContainerPort": svc.container_port,
                        "TargetGroupArn": reference(&target_group),
                    }],
                    "NetworkConfiguration": {
                        "AwsvpcConfiguration": {
                            "AssignPublicIp": assign_public_ip,
                            "SecurityGroups": [get_att(&svc.security_group, "GroupId")],
                            "Subnets": network.workload_subnets(),
                        },
                    },
                },
            }),
        );
        Ok(())
    }

    fn bucket(&mut self, bucket: &Bucket) {
        let policy = removal(bucket.removal);
        let mut props = json!({
            "WebsiteConfiguration": { "IndexDocument": bucket.index_document },
        });
        if bucket.public_read {
            props["PublicAccessBlockConfiguration"] = json!({
                "BlockPublicAcls": false,
                "BlockPublicPolicy": false,
                "IgnorePublicAcls": false,
                "RestrictPublicBuckets": false,
            });
        }
        self.insert(
            &bucket.id,
            json!({
                "Type": "AWS::S3::Bucket",
                "DeletionPolicy": policy,
                "UpdateReplacePolicy": policy,
                "Metadata": { "webstack:auto-delete-objects": bucket.auto_delete_objects },
                "Properties": props,
            }),
        );

        if bucket.public_read {
            self.insert(
                &bucket.id.child("Policy"),
                json!({
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": {
                        "Bucket": reference(&bucket.id),
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": "*",
                                "Action": "s3:GetObject",
                                "Resource": { "Fn::Join": ["", [get_att(&bucket.id, "Arn"), "/*"]] },
                            }],
                        },
                    },
                }),
            );
        }
        if bucket.auto_delete_objects && bucket.removal == RemovalPolicy::Destroy {
            self.auto_delete_buckets.push(bucket.id.to_string());
        }
    }

    fn distribution(&mut self, dist: &Distribution) -> Result<(), SynthError> {
        // One origin-request policy resource per distinct policy.
        let mut policies: Vec<(OriginRequestPolicy, LogicalId)> = Vec::new();
        for behavior in dist.all_behaviors() {
            if let Some(policy) = behavior.origin_request_policy
                && !policies.iter().any(|(p, _)| *p == policy)
            {
                let suffix = match policies.len() {
                    0 => "OriginRequestPolicy".to_owned(),
                    n => format!("OriginRequestPolicy{}", n + 1),
                };
                let id = dist.id.child(&suffix);
                self.insert(&id, origin_request_policy(&id, policy));
                policies.push((policy, id));
            }
        }

        let mut origins: Vec<(String, Value)> = Vec::new();
        let mut behavior_json = |behavior: &Behavior,
                                 path_pattern: Option<&str>|
         -> Result<Value, SynthError> {
            let (origin_id, origin) = origin(self.decl, &dist.id, &behavior.origin)?;
            if !origins.iter().any(|(id, _)| *id == origin_id) {
                origins.push((origin_id.clone(), origin));
            }
            let mut rendered = json!({
                "TargetOriginId": origin_id,
                "ViewerProtocolPolicy": behavior.viewer_protocol.as_str(),
                "AllowedMethods": behavior.allowed_methods.methods(),
                "CachePolicyId": behavior.cache_policy.managed_id(),
                "Compress": true,
            });
            if let Some(pattern) = path_pattern {
                rendered["PathPattern"] = json!(pattern);
            }
            if let Some(policy) = behavior.origin_request_policy
                && let Some((_, id)) = policies.iter().find(|(p, _)| *p == policy)
            {
                rendered["OriginRequestPolicyId"] = reference(id);
            }
            Ok(rendered)
        };

        let default_behavior = behavior_json(&dist.default_behavior, None)?;
        let cache_behaviors = dist
            .behaviors
            .iter()
            .map(|b| behavior_json(&b.behavior, Some(&b.path_pattern)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = json!({
            "Enabled": true,
            "HttpVersion": "http2",
            "Origins": origins.into_iter().map(|(_, o)| o).collect::<Vec<_>>(),
            "DefaultCacheBehavior": default_behavior,
        });
        if !cache_behaviors.is_empty() {
            config["CacheBehaviors"] = Value::Array(cache_behaviors);
        }
        if let Origin::Bucket { bucket } = &dist.default_behavior.origin
            && let Some(Resource::Bucket(b)) = self.decl.get(bucket)
        {
            config["DefaultRootObject"] = json!(b.index_document);
        }
        if !dist.domain_names.is_empty() {
            config["Aliases"] = json!(dist.domain_names);
        }
        if let Some(cert) = &dist.certificate {
            config["ViewerCertificate"] = json!({
                "AcmCertificateArn": self.certificate_arn(cert)?,
                "SslSupportMethod": "sni-only",
                "MinimumProtocolVersion": "TLSv1.2_2021",
            });
        }

        let rendered = json!({
            "Type": "AWS::CloudFront::Distribution",
            "DependsOn": self.depends_on(&dist.id),
            "Properties": { "DistributionConfig": config },
        });
        self.insert(&dist.id, rendered);
        Ok(())
    }

    fn dns_record(&mut self, record: &DnsRecord) -> Result<(), SynthError> {
        let zone = self
            .decl
            .hosted_zone(&record.hosted_zone)
            .ok_or_else(|| unresolved(&record.id, &record.hosted_zone))?;
        let alias = match &record.target {
            AliasTarget::LoadBalancer { service } => {
                let lb = service.child("LoadBalancer");
                json!({
                    "DNSName": get_att(&lb, "DNSName"),
                    "HostedZoneId": get_att(&lb, "CanonicalHostedZoneID"),
                })
            }
            AliasTarget::Distribution { distribution } => json!({
                "DNSName": get_att(distribution, "DomainName"),
                "HostedZoneId": CLOUDFRONT_HOSTED_ZONE_ID,
            }),
        };
        self.insert(
            &record.id,
            json!({
                "Type": "AWS::Route53::RecordSet",
                "Properties": {
                    "HostedZoneId": zone.zone_id,
                    "Name": record.record_name,
                    "Type": "A",
                    "AliasTarget": alias,
                },
            }),
        );
        Ok(())
    }

    fn database(&mut self, db: &Database) -> Result<(), SynthError> {
        let network = self.network_of(&db.id, &db.network)?;
        let secret = db.id.child("Secret");
        let security_group = db.id.child("SecurityGroup");
        let subnet_group = db.id.child("SubnetGroup");
        let attachment = db.id.child("SecretAttachment");
        let port = db.engine.port();
        let policy = removal(db.removal);

        self.insert(
            &secret,
            json!({
                "Type": "AWS::SecretsManager::Secret",
                "DeletionPolicy": policy,
                "Properties": {
                    "Name": db.credentials.secret_name,
                    "Description": format!("Generated credentials for {}", db.id),
                    "GenerateSecretString": {
                        "SecretStringTemplate": json!({ "username": db.credentials.username }).to_string(),
                        "GenerateStringKey": "password",
                        "PasswordLength": 30,
                        "ExcludeCharacters": " %+~`#$&*()|[]{}:;<>?!'/@\"\\",
                    },
                },
            }),
        );

        let ingress: Vec<Value> = db
            .ingress
            .iter()
            .map(|rule| match &rule.peer {
                Peer::SecurityGroup { group } => json!({
                    "IpProtocol": "tcp",
                    "FromPort": rule.port,
                    "ToPort": rule.port,
                    "SourceSecurityGroupId": get_att(group, "GroupId"),
                }),
                Peer::AnyIpv4 => json!({
                    "IpProtocol": "tcp",
                    "FromPort": rule.port,
                    "ToPort": rule.port,
                    "CidrIp": "0.0.0.0/0",
                }),
            })
            .collect();
        self.insert(
            &security_group,
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": format!("{} reachable from the compute tier on {port}", db.id),
                    "VpcId": network.vpc_id,
                    "SecurityGroupIngress": ingress,
                },
            }),
        );

        self.insert(
            &subnet_group,
            json!({
                "Type": "AWS::RDS::DBSubnetGroup",
                "Properties": {
                    "DBSubnetGroupDescription": format!("Subnets for {}", db.id),
                    "SubnetIds": network.workload_subnets(),
                },
            }),
        );

        let resolve = |field: &str| {
            json!({
                "Fn::Join": ["", [
                    "{{resolve:secretsmanager:",
                    reference(&secret),
                    format!(":SecretString:{field}}}}}"),
                ]],
            })
        };
        self.insert(
            &db.id,
            json!({
                "Type": "AWS::RDS::DBInstance",
                "DeletionPolicy": policy,
                "UpdateReplacePolicy": policy,
                "Metadata": {
                    "webstack:removal": match db.removal {
                        RemovalPolicy::Destroy => "deleted immediately on teardown; no final snapshot is kept",
                        RemovalPolicy::Retain => "retained on teardown",
                    },
                },
                "Properties": {
                    "Engine": db.engine.as_str(),
                    "EngineVersion": db.engine_version,
                    "DBInstanceClass": format!("db.{}", db.instance_class),
                    "AllocatedStorage": db.allocated_storage_gib.to_string(),
                    "MultiAZ": db.multi_az,
                    "DBName": db.database_name,
                    "Port": port.to_string(),
                    "MasterUsername": resolve("username"),
                    "MasterUserPassword": resolve("password"),
                    "VPCSecurityGroups": [get_att(&security_group, "GroupId")],
                    "DBSubnetGroupName": reference(&subnet_group),
                    "PubliclyAccessible": false,
                    "DeleteAutomatedBackups": db.removal == RemovalPolicy::Destroy,
                },
            }),
        );

        self.insert(
            &attachment,
            json!({
                "Type": "AWS::SecretsManager::SecretTargetAttachment",
                "Properties": {
                    "SecretId": reference(&secret),
                    "TargetId": reference(&db.id),
                    "TargetType": "AWS::RDS::DBInstance",
                },
            }),
        );
        Ok(())
    }
}

fn origin(
    decl: &Declaration,
    dist: &LogicalId,
    origin: &Origin,
) -> Result<(String, Value), SynthError> {
    let custom = |protocol: OriginProtocolPolicy| {
        json!({
            "HTTPPort": 80,
            "HTTPSPort": 443,
            "OriginProtocolPolicy": protocol.as_str(),
        })
    };
    match origin {
        Origin::Bucket { bucket } => {
            if !matches!(decl.get(bucket), Some(Resource::Bucket(_))) {
                return Err(unresolved(dist, bucket));
            }
            let id = format!("{bucket}Origin");
            // Website endpoints only speak HTTP.
            let domain = json!({
                "Fn::Select": [2, { "Fn::Split": ["/", get_att(bucket, "WebsiteURL")] }],
            });
            Ok((
                id.clone(),
                json!({ "Id": id, "DomainName": domain, "CustomOriginConfig": custom(OriginProtocolPolicy::HttpOnly) }),
            ))
        }
        Origin::LoadBalancer { service, protocol } => {
            if !matches!(decl.get(service), Some(Resource::Service(_))) {
                return Err(unresolved(dist, service));
            }
            let id = format!("{service}Origin");
            let domain = get_att(&service.child("LoadBalancer"), "DNSName");
            Ok((
                id.clone(),
                json!({ "Id": id, "DomainName": domain, "CustomOriginConfig": custom(*protocol) }),
            ))
        }
        Origin::Http {
            domain_name,
            protocol,
        } => {
            let id = format!("{}Origin", LogicalId::new(domain_name));
            Ok((
                id.clone(),
                json!({ "Id": id, "DomainName": domain_name, "CustomOriginConfig": custom(*protocol) }),
            ))
        }
    }
}

fn origin_request_policy(id: &LogicalId, policy: OriginRequestPolicy) -> Value {
    let behavior = |forward: ForwardPolicy, all: &str| match forward {
        ForwardPolicy::None => "none".to_owned(),
        ForwardPolicy::All => all.to_owned(),
    };
    json!({
        "Type": "AWS::CloudFront::OriginRequestPolicy",
        "Properties": {
            "OriginRequestPolicyConfig": {
                "Name": { "Fn::Sub": format!("${{AWS::StackName}}-{id}") },
                "QueryStringsConfig": { "QueryStringBehavior": behavior(policy.query_strings, "all") },
                "HeadersConfig": { "HeaderBehavior": behavior(policy.headers, "allViewer") },
                "CookiesConfig": { "CookieBehavior": behavior(policy.cookies, "all") },
            },
        },
    })
}

fn output_value(value: &OutputValue) -> Value {
    match value {
        OutputValue::LoadBalancerDnsName { service } => {
            get_att(&service.child("LoadBalancer"), "DNSName")
        }
        OutputValue::DistributionDomainName { distribution } => {
            get_att(distribution, "DomainName")
        }
        OutputValue::DistributionId { distribution } => reference(distribution),
        OutputValue::FrontendUrl {
            distribution,
            domain_name,
        } => match domain_name {
            Some(domain) => json!(format!("https://{domain}")),
            None => json!({ "Fn::Join": ["", ["https://", get_att(distribution, "DomainName")]] }),
        },
        OutputValue::DatabaseEndpoint { database } => {
            get_att(database, Attribute::EndpointAddress.as_str())
        }
    }
}

/// Log group the service's containers write to.
pub fn log_group_name(stack_name: &str, service: &LogicalId) -> String {
    format!("/webstack/{stack_name}/{service}")
}

fn removal(policy: RemovalPolicy) -> &'static str {
    match policy {
        RemovalPolicy::Destroy => "Delete",
        RemovalPolicy::Retain => "Retain",
    }
}

fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

fn unresolved(from: &LogicalId, to: &LogicalId) -> SynthError {
    SynthError::Unresolved {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("declaration is invalid")]
    InvalidDeclaration { source: webstack_core::Error },

    #[error("'{from}' refers to '{to}', which cannot be rendered")]
    Unresolved { from: String, to: String },
}
