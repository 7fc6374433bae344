use std::path::PathBuf;

use webstack_core::resource::{DatabaseEngine, OriginProtocolPolicy};
use webstack_core::{RouteOrigin, WebstackConfig};
use tempfile::TempDir;

#[test]
fn load_returns_defaults_when_no_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = WebstackConfig::load(tmp.path()).unwrap();

    assert_eq!(config.stack.name, "WebStack");
    assert_eq!(config.stack.region, "us-west-2");
    assert!(config.stack.account.is_none());
    assert_eq!(config.network.vpc_name, "jenkins-vpc");
    assert_eq!(config.service.container_port, 8080);
    assert_eq!(config.service.memory_limit_mib, 512);
    assert_eq!(config.service.desired_count, 1);
    assert!(config.service.public_load_balancer);
    assert_eq!(config.service.health_check_grace_period_secs, 60);
    assert_eq!(config.service.min_healthy_percent, 100);
    assert_eq!(config.service.max_healthy_percent, 200);
    assert_eq!(config.service.build_context, Some(PathBuf::from("../back")));
    assert!(config.service.domain_name.is_none());
    assert!(config.frontend.is_none());
    assert!(config.dns.is_none());
    assert!(config.database.is_none());
    assert!(!config.needs_hosted_zone());
}

#[test]
fn load_parses_full_config() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[stack]
name = "CounterStack"
region = "eu-central-1"
account = "123456789012"

[network]
vpc_name = "shared-vpc"

[service]
name = "Counter"
build_context = "backend"
container_port = 3000
memory_limit_mib = 1024
cpu = 512
desired_count = 2
public_load_balancer = false
health_check_grace_period_secs = 90
health_check_path = "/healthz"
min_healthy_percent = 50
max_healthy_percent = 150
domain_name = "api.example.com"

[service.environment]
RUST_LOG = "info"

[frontend]
index_document = "main.html"
domain_name = "clickme.example.com"

[[frontend.routes]]
path_pattern = "/api/*"
origin = "http"
domain_name = "api.example.com"
protocol = "https-only"

[dns]
hosted_zone = "example.com"

[database]
engine = "mysql"
engine_version = "8.0.36"
instance_class = "t4g.small"
allocated_storage_gib = 50
database_name = "clicks"
username = "admin"
"#;
    std::fs::write(tmp.path().join("webstack.toml"), toml).unwrap();

    let config = WebstackConfig::load(tmp.path()).unwrap();

    assert_eq!(config.stack.name, "CounterStack");
    assert_eq!(config.stack.region, "eu-central-1");
    assert_eq!(config.stack.account.as_deref(), Some("123456789012"));
    assert_eq!(config.network.vpc_name, "shared-vpc");
    assert_eq!(config.service.build_context, Some(PathBuf::from("backend")));
    assert_eq!(config.service.container_port, 3000);
    assert_eq!(config.service.memory_limit_mib, 1024);
    assert_eq!(config.service.cpu, 512);
    assert_eq!(config.service.desired_count, 2);
    assert!(!config.service.public_load_balancer);
    assert_eq!(config.service.health_check_path, "/healthz");
    assert_eq!(config.service.min_healthy_percent, 50);
    assert_eq!(config.service.max_healthy_percent, 150);
    assert_eq!(config.service.environment["RUST_LOG"], "info");

    let frontend = config.frontend.as_ref().unwrap();
    assert_eq!(frontend.index_document, "main.html");
    assert!(frontend.public_read);
    assert!(frontend.auto_delete_objects);
    assert_eq!(frontend.certificate_region, "us-east-1");
    assert_eq!(frontend.routes.len(), 1);
    assert_eq!(frontend.routes[0].origin, RouteOrigin::Http);
    assert_eq!(frontend.routes[0].protocol, OriginProtocolPolicy::HttpsOnly);

    assert_eq!(config.dns.as_ref().unwrap().hosted_zone, "example.com");

    let db = config.database.as_ref().unwrap();
    assert_eq!(db.engine, DatabaseEngine::Mysql);
    assert_eq!(db.engine_version, "8.0.36");
    assert_eq!(db.allocated_storage_gib, 50);
    assert!(config.needs_hosted_zone());
}

#[test]
fn empty_frontend_section_gets_api_route() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("webstack.toml"), "[frontend]\n").unwrap();

    let config = WebstackConfig::load(tmp.path()).unwrap();
    let frontend = config.frontend.unwrap();

    assert_eq!(frontend.index_document, "index.html");
    assert_eq!(frontend.routes.len(), 1);
    assert_eq!(frontend.routes[0].path_pattern, "/api/*");
    assert_eq!(frontend.routes[0].origin, RouteOrigin::LoadBalancer);
    assert_eq!(frontend.routes[0].protocol, OriginProtocolPolicy::HttpOnly);
}

#[test]
fn empty_database_section_uses_postgres_defaults() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("webstack.toml"), "[database]\n").unwrap();

    let db = WebstackConfig::load(tmp.path()).unwrap().database.unwrap();
    assert_eq!(db.engine, DatabaseEngine::Postgres);
    assert_eq!(db.instance_class, "t3.micro");
    assert_eq!(db.allocated_storage_gib, 20);
    assert_eq!(db.database_name, "counter");
    assert_eq!(db.username, "postgres");
}

#[test]
fn load_invalid_toml_returns_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("webstack.toml"), "invalid = [[[toml").unwrap();

    let err = WebstackConfig::load(tmp.path()).unwrap_err().to_string();
    assert!(err.contains("failed to parse config"), "got: {err}");
}

#[test]
fn unknown_engine_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("webstack.toml"),
        "[database]\nengine = \"oracle\"\n",
    )
    .unwrap();

    assert!(WebstackConfig::load(tmp.path()).is_err());
}
