use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use webstack_core::{HostedZoneCandidate, NetworkCandidate};

use crate::aws::{CommandError, Program};
use crate::executor::{CommandExecutor, RealExecutor};

/// AWS operations client, parameterized over the executor for testability.
///
/// Everything goes through the `aws` and `docker` CLIs, so credentials,
/// profiles and SSO sessions behave exactly as they do in the user's shell.
pub struct AwsClient<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl AwsClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for AwsClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> AwsClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    async fn aws(&self, args: &[String]) -> Result<String, CommandError> {
        self.executor.exec(Program::Aws, args).await
    }

    // ── Preflight ──

    pub async fn check_prerequisites(
        &self,
        expected_account: Option<&str>,
        needs_docker: bool,
    ) -> Result<PreflightReport, PreflightError> {
        let mut report = PreflightReport::default();

        // 1. aws CLI available
        match self.aws(&args(["--version"])).await {
            Ok(version) => report.aws_version = Some(parse_cli_version(&version)),
            Err(_) => return Err(PreflightError::AwsNotInstalled),
        }

        // 2. Authenticated
        let identity = match self.caller_identity().await {
            Ok(identity) => identity,
            Err(_) => return Err(PreflightError::NotAuthenticated),
        };
        if let Some(expected) = expected_account
            && expected != identity.account
        {
            return Err(PreflightError::AccountMismatch {
                expected: expected.to_owned(),
                actual: identity.account,
            });
        }
        report.account = Some(identity.account);

        // 3. Docker daemon, only when images are built locally
        if needs_docker {
            match self
                .executor
                .exec(
                    Program::Docker,
                    &args(["version", "--format", "{{.Server.Version}}"]),
                )
                .await
            {
                Ok(version) => report.docker_version = Some(version.trim().to_owned()),
                Err(_) => return Err(PreflightError::DockerUnavailable),
            }
        }

        Ok(report)
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, LookupError> {
        let output = self
            .aws(&args(["sts", "get-caller-identity", "--output", "json"]))
            .await
            .map_err(|e| LookupError::Query {
                what: "caller identity",
                source: e,
            })?;
        serde_json::from_str(&output).map_err(|e| LookupError::Parse {
            what: "caller identity",
            source: e,
        })
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    /// Returns a report with pass/fail for each check item.
    pub async fn doctor(&self, region: &str, expected_account: Option<&str>) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. aws CLI
        match self.aws(&args(["--version"])).await {
            Ok(v) => report.aws = CheckResult::ok(&parse_cli_version(&v)),
            Err(e) => report.aws = CheckResult::fail(&e.to_string()),
        }

        // 2. Credentials
        match self.caller_identity().await {
            Ok(identity) => {
                report.identity = match expected_account {
                    Some(expected) if expected != identity.account => CheckResult::fail(&format!(
                        "{} (expected account {expected})",
                        identity.account
                    )),
                    _ => CheckResult::ok(&format!("{} ({})", identity.account, identity.arn)),
                };
            }
            Err(_) => report.identity = CheckResult::fail("no valid credentials"),
        }

        // 3. Region
        match self
            .aws(&args([
                "ec2",
                "describe-availability-zones",
                "--region",
                region,
                "--output",
                "json",
            ]))
            .await
        {
            Ok(out) => {
                report.region = match serde_json::from_str::<AvailabilityZones>(&out) {
                    Ok(z) if !z.availability_zones.is_empty() => CheckResult::ok(&format!(
                        "{region} ({} AZs)",
                        z.availability_zones.len()
                    )),
                    Ok(_) => CheckResult::fail(&format!("{region} has no availability zones")),
                    Err(e) => CheckResult::fail(&format!("unexpected response: {e}")),
                };
            }
            Err(_) => report.region = CheckResult::fail(&format!("{region} not reachable")),
        }

        // 4. Docker
        match self
            .executor
            .exec(
                Program::Docker,
                &args(["version", "--format", "{{.Server.Version}}"]),
            )
            .await
        {
            Ok(v) => report.docker = CheckResult::ok(v.trim()),
            Err(_) => report.docker = CheckResult::fail("docker daemon not running"),
        }

        report
    }

    // ── Lookups ──

    /// VPCs whose `Name` tag equals `name`, with their subnets split by tier.
    pub async fn find_networks(
        &self,
        region: &str,
        name: &str,
    ) -> Result<Vec<NetworkCandidate>, LookupError> {
        let filter = format!("Name=tag:Name,Values={name}");
        let output = self
            .aws(&args([
                "ec2",
                "describe-vpcs",
                "--region",
                region,
                "--filters",
                &filter,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| LookupError::Query {
                what: "VPCs",
                source: e,
            })?;
        let vpcs: Vpcs = serde_json::from_str(&output).map_err(|e| LookupError::Parse {
            what: "VPCs",
            source: e,
        })?;

        let mut candidates = Vec::with_capacity(vpcs.vpcs.len());
        for vpc in vpcs.vpcs {
            let (public_subnets, private_subnets) = self.subnets(region, &vpc.vpc_id).await?;
            tracing::debug!(
                vpc_id = %vpc.vpc_id,
                public = public_subnets.len(),
                private = private_subnets.len(),
                "found network"
            );
            candidates.push(NetworkCandidate {
                name: tag_value(&vpc.tags, "Name"),
                vpc_id: vpc.vpc_id,
                public_subnets,
                private_subnets,
            });
        }
        Ok(candidates)
    }

    async fn subnets(
        &self,
        region: &str,
        vpc_id: &str,
    ) -> Result<(Vec<String>, Vec<String>), LookupError> {
        let filter = format!("Name=vpc-id,Values={vpc_id}");
        let output = self
            .aws(&args([
                "ec2",
                "describe-subnets",
                "--region",
                region,
                "--filters",
                &filter,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| LookupError::Query {
                what: "subnets",
                source: e,
            })?;
        let mut subnets = serde_json::from_str::<Subnets>(&output)
            .map_err(|e| LookupError::Parse {
                what: "subnets",
                source: e,
            })?
            .subnets;
        subnets.sort_by(|a, b| {
            (&a.availability_zone, &a.subnet_id).cmp(&(&b.availability_zone, &b.subnet_id))
        });

        let (public, private): (Vec<_>, Vec<_>) =
            subnets.into_iter().partition(Subnet::is_public);
        Ok((
            public.into_iter().map(|s| s.subnet_id).collect(),
            private.into_iter().map(|s| s.subnet_id).collect(),
        ))
    }

    /// Hosted zones at or after `name` in Route 53's listing order.
    pub async fn find_hosted_zones(
        &self,
        name: &str,
    ) -> Result<Vec<HostedZoneCandidate>, LookupError> {
        let output = self
            .aws(&args([
                "route53",
                "list-hosted-zones-by-name",
                "--dns-name",
                name,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| LookupError::Query {
                what: "hosted zones",
                source: e,
            })?;
        let zones: HostedZones = serde_json::from_str(&output).map_err(|e| LookupError::Parse {
            what: "hosted zones",
            source: e,
        })?;

        Ok(zones
            .hosted_zones
            .into_iter()
            .map(|z| HostedZoneCandidate {
                zone_id: z.id.trim_start_matches("/hostedzone/").to_owned(),
                name: z.name,
                private: z.config.private_zone,
            })
            .collect())
    }

    // ── Container images ──

    /// Ensure the ECR repository exists, creating it if needed. Returns its URI.
    pub async fn ensure_image_repo(&self, region: &str, repository: &str) -> Result<String, ImageError> {
        let described = self
            .aws(&args([
                "ecr",
                "describe-repositories",
                "--region",
                region,
                "--repository-names",
                repository,
                "--output",
                "json",
            ]))
            .await;

        let output = match described {
            Ok(output) => output,
            Err(e) if e.is_not_found() => {
                tracing::info!(repository, "creating image repository");
                self.aws(&args([
                    "ecr",
                    "create-repository",
                    "--region",
                    region,
                    "--repository-name",
                    repository,
                    "--output",
                    "json",
                ]))
                .await
                .map_err(|e| ImageError::Repository { source: e })?
            }
            Err(e) => return Err(ImageError::Repository { source: e }),
        };

        repository_uri(&output).map_err(|e| ImageError::Parse { source: e })
    }

    /// Build `directory` and push it as `<repository_uri>:<tag>`.
    ///
    /// Returns the pushed image reference.
    pub async fn push_image(
        &self,
        region: &str,
        repository_uri: &str,
        directory: &Path,
        tag: &str,
    ) -> Result<String, ImageError> {
        let dir = directory
            .to_str()
            .ok_or_else(|| ImageError::InvalidPath(directory.to_path_buf()))?;
        let image = format!("{repository_uri}:{tag}");
        let registry = repository_uri
            .split_once('/')
            .map_or(repository_uri, |(host, _)| host);

        let password = self
            .aws(&args(["ecr", "get-login-password", "--region", region]))
            .await
            .map_err(|e| ImageError::Login { source: e })?;
        self.executor
            .exec_with_stdin(
                Program::Docker,
                &args([
                    "login",
                    "--username",
                    "AWS",
                    "--password-stdin",
                    registry,
                ]),
                password.trim().as_bytes(),
            )
            .await
            .map_err(|e| ImageError::Login { source: e })?;

        self.executor
            .exec_streaming(
                Program::Docker,
                &args(["build", "--platform", "linux/amd64", "-t", &image, dir]),
            )
            .await
            .map_err(|e| ImageError::Build { source: e })?;

        self.executor
            .exec_streaming(Program::Docker, &args(["push", &image]))
            .await
            .map_err(|e| ImageError::Push { source: e })?;

        Ok(image)
    }

    // ── Stacks ──

    /// Create or update a stack from a template file.
    ///
    /// Engine output streams to the terminal; a failed deployment is
    /// reported as-is and never retried.
    pub async fn deploy_stack(
        &self,
        region: &str,
        stack_name: &str,
        template: &Path,
        parameters: &BTreeMap<String, String>,
    ) -> Result<(), StackError> {
        let template = template
            .to_str()
            .ok_or_else(|| StackError::InvalidPath(template.to_path_buf()))?;

        let mut cmd = args([
            "cloudformation",
            "deploy",
            "--region",
            region,
            "--stack-name",
            stack_name,
            "--template-file",
            template,
            "--capabilities",
            "CAPABILITY_IAM",
            "--no-fail-on-empty-changeset",
        ]);
        if !parameters.is_empty() {
            cmd.push("--parameter-overrides".to_owned());
            cmd.extend(parameters.iter().map(|(k, v)| format!("{k}={v}")));
        }

        self.executor
            .exec_streaming(Program::Aws, &cmd)
            .await
            .map_err(|e| StackError::Deploy {
                stack: stack_name.to_owned(),
                source: e,
            })
    }

    /// Current state of a stack, or `None` if it does not exist.
    pub async fn describe_stack(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<Option<StackDescription>, StackError> {
        let output = match self
            .aws(&args([
                "cloudformation",
                "describe-stacks",
                "--region",
                region,
                "--stack-name",
                stack_name,
                "--output",
                "json",
            ]))
            .await
        {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                return Err(StackError::Describe {
                    stack: stack_name.to_owned(),
                    source: e,
                });
            }
        };

        let stacks: Stacks = serde_json::from_str(&output).map_err(|e| StackError::Parse {
            stack: stack_name.to_owned(),
            source: e,
        })?;
        Ok(stacks.stacks.into_iter().next().map(|s| StackDescription {
            stack_name: s.stack_name,
            status: s.stack_status,
            status_reason: s.stack_status_reason,
            last_updated: s.last_updated_time.or(s.creation_time),
            outputs: s
                .outputs
                .into_iter()
                .map(|o| (o.output_key, o.output_value))
                .collect(),
        }))
    }

    /// Outputs of a deployed stack.
    pub async fn stack_outputs(
        &self,
        region: &str,
        stack_name: &str,
    ) -> Result<BTreeMap<String, String>, StackError> {
        self.describe_stack(region, stack_name)
            .await?
            .map(|s| s.outputs)
            .ok_or_else(|| StackError::NotDeployed(stack_name.to_owned()))
    }

    /// Physical id of a resource inside a deployed stack.
    pub async fn physical_resource_id(
        &self,
        region: &str,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<String, StackError> {
        let output = self
            .aws(&args([
                "cloudformation",
                "describe-stack-resource",
                "--region",
                region,
                "--stack-name",
                stack_name,
                "--logical-resource-id",
                logical_id,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| StackError::Resource {
                stack: stack_name.to_owned(),
                logical_id: logical_id.to_owned(),
                source: e,
            })?;
        let detail: StackResource = serde_json::from_str(&output).map_err(|e| StackError::Parse {
            stack: stack_name.to_owned(),
            source: e,
        })?;
        Ok(detail.stack_resource_detail.physical_resource_id)
    }

    /// Delete a stack and wait until the deletion completes.
    pub async fn delete_stack(&self, region: &str, stack_name: &str) -> Result<(), StackError> {
        self.aws(&args([
            "cloudformation",
            "delete-stack",
            "--region",
            region,
            "--stack-name",
            stack_name,
        ]))
        .await
        .map_err(|e| StackError::Delete {
            stack: stack_name.to_owned(),
            source: e,
        })?;

        tracing::info!(stack = stack_name, "waiting for stack deletion");
        self.executor
            .exec_streaming(
                Program::Aws,
                &args([
                    "cloudformation",
                    "wait",
                    "stack-delete-complete",
                    "--region",
                    region,
                    "--stack-name",
                    stack_name,
                ]),
            )
            .await
            .map_err(|e| StackError::Wait {
                stack: stack_name.to_owned(),
                source: e,
            })
    }

    /// Remove every object so the bucket can be deleted with its stack.
    pub async fn empty_bucket(&self, region: &str, bucket: &str) -> Result<(), StackError> {
        let uri = format!("s3://{bucket}");
        match self
            .aws(&args(["s3", "rm", &uri, "--recursive", "--region", region]))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!(bucket, "bucket already gone, nothing to empty");
                Ok(())
            }
            Err(e) => Err(StackError::EmptyBucket {
                bucket: bucket.to_owned(),
                source: e,
            }),
        }
    }

    // ── Logs ──

    pub async fn tail_logs(
        &self,
        region: &str,
        log_group: &str,
        since: &str,
        follow: bool,
    ) -> Result<(), StackError> {
        let mut cmd = args([
            "logs", "tail", log_group, "--region", region, "--since", since,
        ]);
        if follow {
            cmd.push("--follow".to_owned());
        }
        self.executor
            .exec_streaming(Program::Aws, &cmd)
            .await
            .map_err(|e| StackError::Logs { source: e })
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// `aws-cli/2.15.30 Python/3.11.8 Linux/6.5 exe/x86_64` -> `2.15.30`
fn parse_cli_version(output: &str) -> String {
    let first = output.split_whitespace().next().unwrap_or_default();
    first.strip_prefix("aws-cli/").unwrap_or(first).to_owned()
}

fn tag_value(tags: &[Tag], key: &str) -> Option<String> {
    tags.iter().find(|t| t.key == key).map(|t| t.value.clone())
}

fn repository_uri(output: &str) -> Result<String, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Repository {
        repository_uri: String,
    }
    #[derive(Deserialize)]
    struct Described {
        repositories: Vec<Repository>,
    }
    #[derive(Deserialize)]
    struct Created {
        repository: Repository,
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Response {
        Described(Described),
        Created(Created),
    }

    let uri = match serde_json::from_str::<Response>(output)? {
        Response::Created(c) => Some(c.repository.repository_uri),
        Response::Described(d) => d.repositories.into_iter().next().map(|r| r.repository_uri),
    };
    uri.ok_or_else(|| serde::de::Error::custom("no repository in response"))
}

// ── CLI response shapes ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
    arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AvailabilityZones {
    availability_zones: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Vpcs {
    vpcs: Vec<Vpc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Vpc {
    vpc_id: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Subnets {
    subnets: Vec<Subnet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Subnet {
    subnet_id: String,
    #[serde(default)]
    availability_zone: String,
    #[serde(default)]
    map_public_ip_on_launch: bool,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl Subnet {
    /// Honors the `aws-cdk:subnet-type` tag, then falls back to the public-IP flag.
    fn is_public(&self) -> bool {
        match tag_value(&self.tags, "aws-cdk:subnet-type").as_deref() {
            Some("Public") => true,
            Some(_) => false,
            None => self.map_public_ip_on_launch,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZones {
    hosted_zones: Vec<HostedZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZone {
    id: String,
    name: String,
    #[serde(default)]
    config: HostedZoneConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZoneConfig {
    #[serde(default)]
    private_zone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Stacks {
    stacks: Vec<Stack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Stack {
    stack_name: String,
    stack_status: String,
    stack_status_reason: Option<String>,
    creation_time: Option<String>,
    last_updated_time: Option<String>,
    #[serde(default)]
    outputs: Vec<StackOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackOutput {
    output_key: String,
    output_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackResource {
    stack_resource_detail: StackResourceDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackResourceDetail {
    physical_resource_id: String,
}

// ── Report types ──

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub aws_version: Option<String>,
    pub account: Option<String>,
    pub docker_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub stack_name: String,
    pub status: String,
    pub status_reason: Option<String>,
    pub last_updated: Option<String>,
    pub outputs: BTreeMap<String, String>,
}

impl StackDescription {
    pub fn is_failed(&self) -> bool {
        self.status.ends_with("_FAILED") || self.status.contains("ROLLBACK")
    }
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub aws: CheckResult,
    pub identity: CheckResult,
    pub region: CheckResult,
    pub docker: CheckResult,
    pub config_file: CheckResult,
    pub context_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.aws.passed
            && self.identity.passed
            && self.region.passed
            && self.docker.passed
            && self.config_file.passed
            && self.context_file.passed
    }
}

impl std::fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = [
            ("aws CLI", &self.aws),
            ("Credentials", &self.identity),
            ("Region", &self.region),
            ("Docker", &self.docker),
            ("webstack.toml", &self.config_file),
            ("Lookup context", &self.context_file),
        ];
        for (label, check) in rows {
            writeln!(f, "  [{}] {label:<16} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("aws CLI not installed (https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html)")]
    AwsNotInstalled,

    #[error("no valid AWS credentials; run: aws configure (or aws sso login)")]
    NotAuthenticated,

    #[error("credentials belong to account {actual}, but stack.account is {expected}")]
    AccountMismatch { expected: String, actual: String },

    #[error("docker daemon not reachable; it is needed to build the service image")]
    DockerUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("failed to look up {what}")]
    Query {
        what: &'static str,
        source: CommandError,
    },

    #[error("unexpected {what} response")]
    Parse {
        what: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("failed to prepare image repository")]
    Repository { source: CommandError },

    #[error("unexpected image repository response")]
    Parse { source: serde_json::Error },

    #[error("failed to log in to the image registry")]
    Login { source: CommandError },

    #[error("image build failed")]
    Build { source: CommandError },

    #[error("image push failed")]
    Push { source: CommandError },
}

#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("template path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("deployment of stack {stack} failed")]
    Deploy { stack: String, source: CommandError },

    #[error("stack {0} is not deployed")]
    NotDeployed(String),

    #[error("failed to describe stack {stack}")]
    Describe { stack: String, source: CommandError },

    #[error("unexpected response for stack {stack}")]
    Parse {
        stack: String,
        source: serde_json::Error,
    },

    #[error("failed to look up {logical_id} in stack {stack}")]
    Resource {
        stack: String,
        logical_id: String,
        source: CommandError,
    },

    #[error("failed to delete stack {stack}")]
    Delete { stack: String, source: CommandError },

    #[error("stack {stack} did not finish deleting")]
    Wait { stack: String, source: CommandError },

    #[error("failed to empty bucket {bucket}")]
    EmptyBucket { bucket: String, source: CommandError },

    #[error("failed to read logs")]
    Logs { source: CommandError },
}
