use std::collections::BTreeMap;
use std::path::PathBuf;

use mockall::mock;
use webstack_cloud::aws::{CommandError, Program};
use webstack_cloud::client::{AwsClient, ImageError, LookupError, PreflightError, StackError};
use webstack_cloud::executor::CommandExecutor;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, program: Program, args: &[String]) -> Result<String, CommandError>;
        async fn exec_streaming(&self, program: Program, args: &[String]) -> Result<(), CommandError>;
        async fn exec_with_stdin(
            &self,
            program: Program,
            args: &[String],
            stdin_data: &[u8],
        ) -> Result<String, CommandError>;
    }
}

fn failed(stderr: &str) -> CommandError {
    CommandError::CommandFailed {
        program: Program::Aws,
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

fn has(args: &[String], word: &str) -> bool {
    args.iter().any(|a| a == word)
}

const IDENTITY: &str = r#"{"UserId":"AIDA","Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/dev"}"#;

// ── Preflight Tests ──

#[tokio::test]
async fn preflight_all_checks_pass() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|program, args| matches!(program, Program::Aws) && has(args, "--version"))
        .returning(|_, _| Ok("aws-cli/2.15.30 Python/3.11.8 Linux/6.5.0\n".to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "get-caller-identity"))
        .returning(|_, _| Ok(IDENTITY.to_owned()));

    mock.expect_exec()
        .withf(|program, _| matches!(program, Program::Docker))
        .returning(|_, _| Ok("27.1.1\n".to_owned()));

    let client = AwsClient::with_executor(mock);
    let report = client
        .check_prerequisites(Some("123456789012"), true)
        .await
        .unwrap();

    assert_eq!(report.aws_version.as_deref(), Some("2.15.30"));
    assert_eq!(report.account.as_deref(), Some("123456789012"));
    assert_eq!(report.docker_version.as_deref(), Some("27.1.1"));
}

#[tokio::test]
async fn preflight_aws_not_installed() {
    let mut mock = MockExecutor::new();

    mock.expect_exec().returning(|program, _| {
        Err(CommandError::NotFound {
            program,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });

    let client = AwsClient::with_executor(mock);
    let result = client.check_prerequisites(None, false).await;

    assert!(matches!(result, Err(PreflightError::AwsNotInstalled)));
}

#[tokio::test]
async fn preflight_not_authenticated() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "--version"))
        .returning(|_, _| Ok("aws-cli/2.15.30\n".to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "get-caller-identity"))
        .returning(|_, _| Err(failed("Unable to locate credentials")));

    let client = AwsClient::with_executor(mock);
    let result = client.check_prerequisites(None, false).await;

    assert!(matches!(result, Err(PreflightError::NotAuthenticated)));
}

#[tokio::test]
async fn preflight_account_mismatch() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "--version"))
        .returning(|_, _| Ok("aws-cli/2.15.30\n".to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "get-caller-identity"))
        .returning(|_, _| Ok(IDENTITY.to_owned()));

    let client = AwsClient::with_executor(mock);
    let result = client.check_prerequisites(Some("999999999999"), false).await;

    assert!(matches!(
        result,
        Err(PreflightError::AccountMismatch { ref expected, ref actual })
            if expected == "999999999999" && actual == "123456789012"
    ));
}

#[tokio::test]
async fn preflight_skips_docker_without_assets() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "--version"))
        .returning(|_, _| Ok("aws-cli/2.15.30\n".to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "get-caller-identity"))
        .returning(|_, _| Ok(IDENTITY.to_owned()));

    mock.expect_exec()
        .withf(|program, _| matches!(program, Program::Docker))
        .never();

    let client = AwsClient::with_executor(mock);
    let report = client.check_prerequisites(None, false).await.unwrap();
    assert!(report.docker_version.is_none());
}

// ── Doctor Tests ──

#[tokio::test]
async fn doctor_reports_every_check() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "--version"))
        .returning(|_, _| Ok("aws-cli/2.15.30\n".to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "get-caller-identity"))
        .returning(|_, _| Ok(IDENTITY.to_owned()));

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-availability-zones"))
        .returning(|_, _| {
            Ok(r#"{"AvailabilityZones":[{"ZoneName":"us-west-2a"},{"ZoneName":"us-west-2b"}]}"#.to_owned())
        });

    mock.expect_exec()
        .withf(|program, _| matches!(program, Program::Docker))
        .returning(|_, _| Err(failed("Cannot connect to the Docker daemon")));

    let client = AwsClient::with_executor(mock);
    let report = client.doctor("us-west-2", None).await;

    assert!(report.aws.passed);
    assert_eq!(report.aws.detail, "2.15.30");
    assert!(report.identity.passed);
    assert!(report.identity.detail.contains("123456789012"));
    assert!(report.region.passed);
    assert_eq!(report.region.detail, "us-west-2 (2 AZs)");
    assert!(!report.docker.passed);
    assert!(!report.all_passed());
}

// ── Lookup Tests ──

#[tokio::test]
async fn find_networks_splits_subnets_by_tier() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| {
            has(args, "describe-vpcs") && has(args, "Name=tag:Name,Values=jenkins-vpc")
        })
        .returning(|_, _| {
            Ok(r#"{"Vpcs":[{"VpcId":"vpc-0abc","Tags":[{"Key":"Name","Value":"jenkins-vpc"}]}]}"#.to_owned())
        });

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-subnets") && has(args, "Name=vpc-id,Values=vpc-0abc"))
        .returning(|_, _| {
            Ok(r#"{"Subnets":[
                {"SubnetId":"subnet-priv-b","AvailabilityZone":"us-west-2b","MapPublicIpOnLaunch":false},
                {"SubnetId":"subnet-pub-a","AvailabilityZone":"us-west-2a","MapPublicIpOnLaunch":true},
                {"SubnetId":"subnet-priv-a","AvailabilityZone":"us-west-2a","MapPublicIpOnLaunch":false}
            ]}"#
            .to_owned())
        });

    let client = AwsClient::with_executor(mock);
    let networks = client.find_networks("us-west-2", "jenkins-vpc").await.unwrap();

    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].vpc_id, "vpc-0abc");
    assert_eq!(networks[0].name.as_deref(), Some("jenkins-vpc"));
    assert_eq!(networks[0].public_subnets, vec!["subnet-pub-a"]);
    assert_eq!(networks[0].private_subnets, vec!["subnet-priv-a", "subnet-priv-b"]);
}

#[tokio::test]
async fn find_networks_returns_empty_when_nothing_matches() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-vpcs"))
        .returning(|_, _| Ok(r#"{"Vpcs":[]}"#.to_owned()));

    let client = AwsClient::with_executor(mock);
    let networks = client.find_networks("us-west-2", "missing").await.unwrap();
    assert!(networks.is_empty());
}

#[tokio::test]
async fn find_networks_rejects_malformed_output() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-vpcs"))
        .returning(|_, _| Ok("not json".to_owned()));

    let client = AwsClient::with_executor(mock);
    let result = client.find_networks("us-west-2", "jenkins-vpc").await;
    assert!(matches!(result, Err(LookupError::Parse { what: "VPCs", .. })));
}

#[tokio::test]
async fn find_hosted_zones_strips_id_prefix() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "list-hosted-zones-by-name") && has(args, "example.com"))
        .returning(|_, _| {
            Ok(r#"{"HostedZones":[
                {"Id":"/hostedzone/Z0PUBLIC","Name":"example.com.","Config":{"PrivateZone":false}},
                {"Id":"/hostedzone/Z0PRIVATE","Name":"example.com.","Config":{"PrivateZone":true}}
            ]}"#
            .to_owned())
        });

    let client = AwsClient::with_executor(mock);
    let zones = client.find_hosted_zones("example.com").await.unwrap();

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].zone_id, "Z0PUBLIC");
    assert_eq!(zones[0].name, "example.com.");
    assert!(!zones[0].private);
    assert!(zones[1].private);
}

// ── Image Tests ──

#[tokio::test]
async fn ensure_image_repo_creates_when_missing() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-repositories"))
        .returning(|_, _| {
            Err(failed(
                "An error occurred (RepositoryNotFoundException): The repository does not exist",
            ))
        });

    mock.expect_exec()
        .withf(|_, args| has(args, "create-repository") && has(args, "webstack/counter"))
        .times(1)
        .returning(|_, _| {
            Ok(r#"{"repository":{"repositoryUri":"123456789012.dkr.ecr.us-west-2.amazonaws.com/webstack/counter"}}"#.to_owned())
        });

    let client = AwsClient::with_executor(mock);
    let uri = client
        .ensure_image_repo("us-west-2", "webstack/counter")
        .await
        .unwrap();
    assert_eq!(uri, "123456789012.dkr.ecr.us-west-2.amazonaws.com/webstack/counter");
}

#[tokio::test]
async fn ensure_image_repo_propagates_access_errors() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-repositories"))
        .returning(|_, _| Err(failed("AccessDeniedException")));

    mock.expect_exec()
        .withf(|_, args| has(args, "create-repository"))
        .never();

    let client = AwsClient::with_executor(mock);
    let result = client.ensure_image_repo("us-west-2", "webstack/counter").await;
    assert!(matches!(result, Err(ImageError::Repository { .. })));
}

#[tokio::test]
async fn push_image_logs_in_builds_and_pushes() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "get-login-password"))
        .returning(|_, _| Ok("ecr-token\n".to_owned()));

    mock.expect_exec_with_stdin()
        .withf(|program, args, data| {
            matches!(program, Program::Docker)
                && has(args, "login")
                && has(args, "123456789012.dkr.ecr.us-west-2.amazonaws.com")
                && data == b"ecr-token"
        })
        .returning(|_, _, _| Ok("Login Succeeded\n".to_owned()));

    mock.expect_exec_streaming()
        .withf(|_, args| has(args, "build") && has(args, "../back"))
        .times(1)
        .returning(|_, _| Ok(()));

    mock.expect_exec_streaming()
        .withf(|_, args| {
            has(args, "push")
                && has(args, "123456789012.dkr.ecr.us-west-2.amazonaws.com/webstack/counter:v1")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let client = AwsClient::with_executor(mock);
    let image = client
        .push_image(
            "us-west-2",
            "123456789012.dkr.ecr.us-west-2.amazonaws.com/webstack/counter",
            &PathBuf::from("../back"),
            "v1",
        )
        .await
        .unwrap();
    assert_eq!(
        image,
        "123456789012.dkr.ecr.us-west-2.amazonaws.com/webstack/counter:v1"
    );
}

#[tokio::test]
async fn push_image_build_failure_stops_before_push() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .returning(|_, _| Ok("ecr-token\n".to_owned()));
    mock.expect_exec_with_stdin()
        .returning(|_, _, _| Ok(String::new()));
    mock.expect_exec_streaming()
        .withf(|_, args| has(args, "build"))
        .returning(|_, _| Err(failed("exit code: 1")));
    mock.expect_exec_streaming()
        .withf(|_, args| has(args, "push"))
        .never();

    let client = AwsClient::with_executor(mock);
    let result = client
        .push_image("us-west-2", "repo.example/x", &PathBuf::from("."), "t")
        .await;
    assert!(matches!(result, Err(ImageError::Build { .. })));
}

// ── Stack Tests ──

#[tokio::test]
async fn deploy_stack_passes_parameter_overrides() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|program, args| {
            matches!(program, Program::Aws)
                && has(args, "deploy")
                && has(args, "WebStack")
                && has(args, "CAPABILITY_IAM")
                && has(args, "--parameter-overrides")
                && has(args, "FrontendCertificateArn=arn:aws:acm:us-east-1:1:certificate/x")
        })
        .returning(|_, _| Ok(()));

    let client = AwsClient::with_executor(mock);
    let parameters = BTreeMap::from([(
        "FrontendCertificateArn".to_owned(),
        "arn:aws:acm:us-east-1:1:certificate/x".to_owned(),
    )]);
    client
        .deploy_stack(
            "us-west-2",
            "WebStack",
            &PathBuf::from(".webstack/WebStack.template.json"),
            &parameters,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn deploy_stack_without_parameters_omits_overrides() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|_, args| has(args, "deploy") && !has(args, "--parameter-overrides"))
        .returning(|_, _| Ok(()));

    let client = AwsClient::with_executor(mock);
    client
        .deploy_stack(
            "us-west-2",
            "WebStack",
            &PathBuf::from("t.json"),
            &BTreeMap::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn deploy_stack_failure_is_reported() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .returning(|_, _| Err(failed("Waiter StackCreateComplete failed")));

    let client = AwsClient::with_executor(mock);
    let result = client
        .deploy_stack("us-west-2", "WebStack", &PathBuf::from("t.json"), &BTreeMap::new())
        .await;

    assert!(matches!(result, Err(StackError::Deploy { ref stack, .. }) if stack == "WebStack"));
}

#[tokio::test]
async fn stack_outputs_are_parsed() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-stacks"))
        .returning(|_, _| {
            Ok(r#"{"Stacks":[{
                "StackName":"WebStack",
                "StackStatus":"CREATE_COMPLETE",
                "CreationTime":"2026-10-01T12:00:00Z",
                "Outputs":[
                    {"OutputKey":"LoadBalancerDNS","OutputValue":"WebSt-Count-1.us-west-2.elb.amazonaws.com","Description":"The DNS name of the load balancer"}
                ]
            }]}"#
            .to_owned())
        });

    let client = AwsClient::with_executor(mock);
    let outputs = client.stack_outputs("us-west-2", "WebStack").await.unwrap();
    assert_eq!(
        outputs["LoadBalancerDNS"],
        "WebSt-Count-1.us-west-2.elb.amazonaws.com"
    );
}

#[tokio::test]
async fn missing_stack_describes_as_none() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-stacks"))
        .returning(|_, _| Err(failed("Stack with id WebStack does not exist")));

    let client = AwsClient::with_executor(mock);
    assert!(client.describe_stack("us-west-2", "WebStack").await.unwrap().is_none());

    let result = client.stack_outputs("us-west-2", "WebStack").await;
    assert!(matches!(result, Err(StackError::NotDeployed(ref s)) if s == "WebStack"));
}

#[tokio::test]
async fn describe_stack_reports_rollback() {
    let mut mock = MockExecutor::new();

    mock.expect_exec().returning(|_, _| {
        Ok(r#"{"Stacks":[{
            "StackName":"WebStack",
            "StackStatus":"UPDATE_ROLLBACK_COMPLETE",
            "StackStatusReason":"Resource CounterFargateService failed to stabilize",
            "LastUpdatedTime":"2026-10-02T08:00:00Z"
        }]}"#
        .to_owned())
    });

    let client = AwsClient::with_executor(mock);
    let stack = client
        .describe_stack("us-west-2", "WebStack")
        .await
        .unwrap()
        .unwrap();
    assert!(stack.is_failed());
    assert_eq!(stack.last_updated.as_deref(), Some("2026-10-02T08:00:00Z"));
    assert!(stack.outputs.is_empty());
}

#[tokio::test]
async fn physical_resource_id_is_parsed() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "describe-stack-resource") && has(args, "FrontendBucket"))
        .returning(|_, _| {
            Ok(r#"{"StackResourceDetail":{"LogicalResourceId":"FrontendBucket","PhysicalResourceId":"webstack-frontendbucket-1a2b"}}"#.to_owned())
        });

    let client = AwsClient::with_executor(mock);
    let id = client
        .physical_resource_id("us-west-2", "WebStack", "FrontendBucket")
        .await
        .unwrap();
    assert_eq!(id, "webstack-frontendbucket-1a2b");
}

#[tokio::test]
async fn delete_stack_waits_for_completion() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "delete-stack"))
        .times(1)
        .returning(|_, _| Ok(String::new()));

    mock.expect_exec_streaming()
        .withf(|_, args| has(args, "stack-delete-complete"))
        .times(1)
        .returning(|_, _| Ok(()));

    let client = AwsClient::with_executor(mock);
    client.delete_stack("us-west-2", "WebStack").await.unwrap();
}

#[tokio::test]
async fn empty_bucket_tolerates_missing_bucket() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .withf(|_, args| has(args, "rm") && has(args, "s3://gone"))
        .returning(|_, _| Err(failed("An error occurred (NoSuchBucket)")));

    let client = AwsClient::with_executor(mock);
    client.empty_bucket("us-west-2", "gone").await.unwrap();
}

#[tokio::test]
async fn empty_bucket_propagates_other_failures() {
    let mut mock = MockExecutor::new();

    mock.expect_exec()
        .returning(|_, _| Err(failed("AccessDenied")));

    let client = AwsClient::with_executor(mock);
    let result = client.empty_bucket("us-west-2", "locked").await;
    assert!(matches!(result, Err(StackError::EmptyBucket { ref bucket, .. }) if bucket == "locked"));
}

#[tokio::test]
async fn tail_logs_follows_when_asked() {
    let mut mock = MockExecutor::new();

    mock.expect_exec_streaming()
        .withf(|_, args| {
            has(args, "tail")
                && has(args, "/webstack/WebStack/CounterFargateService")
                && has(args, "--follow")
        })
        .returning(|_, _| Ok(()));

    let client = AwsClient::with_executor(mock);
    client
        .tail_logs(
            "us-west-2",
            "/webstack/WebStack/CounterFargateService",
            "1h",
            true,
        )
        .await
        .unwrap();
}
