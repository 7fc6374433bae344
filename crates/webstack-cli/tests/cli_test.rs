use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn webstack() -> assert_cmd::Command {
    cargo_bin_cmd!("webstack")
}

/// Lookup cache so synth never reaches the provider.
const CONTEXT: &str = r#"{
  "networks": {
    "us-west-2/jenkins-vpc": {
      "vpc_id": "vpc-0jenkins",
      "name": "jenkins-vpc",
      "public_subnets": ["subnet-pub-a", "subnet-pub-b"],
      "private_subnets": ["subnet-priv-a", "subnet-priv-b"]
    }
  },
  "hosted_zones": {
    "example.com": {
      "zone_id": "Z0EXAMPLE",
      "name": "example.com",
      "private": false
    }
  }
}
"#;

fn project_with_context(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("webstack.toml"), config).unwrap();
    std::fs::write(tmp.path().join("webstack.context.json"), CONTEXT).unwrap();
    tmp
}

// ── Help / Version ──

#[test]
fn shows_help() {
    webstack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deploy a containerized web service"));
}

#[test]
fn shows_version() {
    webstack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("webstack"));
}

#[test]
fn help_lists_every_command() {
    let assert = webstack().arg("--help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for command in [
        "init", "synth", "deploy", "outputs", "status", "logs", "destroy", "doctor",
    ] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

// ── Init Command ──

#[test]
fn init_creates_config_and_gitignore() {
    let tmp = TempDir::new().unwrap();

    webstack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created webstack.toml"));

    let config = std::fs::read_to_string(tmp.path().join("webstack.toml")).unwrap();
    assert!(config.contains("[service]"));
    assert!(config.contains("jenkins-vpc"));

    let gitignore = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
    assert!(gitignore.lines().any(|l| l == "/.webstack/"));
}

#[test]
fn init_keeps_existing_files() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("webstack.toml"), "[stack]\nname = \"Mine\"\n").unwrap();
    std::fs::write(tmp.path().join(".gitignore"), "target").unwrap();

    webstack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));

    let config = std::fs::read_to_string(tmp.path().join("webstack.toml")).unwrap();
    assert_eq!(config, "[stack]\nname = \"Mine\"\n");
    let gitignore = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
    assert_eq!(gitignore, "target\n/.webstack/\n");
}

#[test]
fn init_twice_creates_nothing() {
    let tmp = TempDir::new().unwrap();

    webstack().current_dir(tmp.path()).arg("init").assert().success();
    webstack()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));
}

// ── Synth Command (cached lookups, no AWS) ──

#[test]
fn synth_minimal_from_cached_context() {
    let tmp = project_with_context("");

    webstack()
        .current_dir(tmp.path())
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("WebStack (us-west-2)"));

    let manifest = std::fs::read_to_string(tmp.path().join(".webstack/manifest.json")).unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(manifest["stacks"].as_array().unwrap().len(), 1);

    let template =
        std::fs::read_to_string(tmp.path().join(".webstack/WebStack.template.json")).unwrap();
    assert!(template.contains("vpc-0jenkins"));
    assert!(template.contains("LoadBalancerDNS"));
}

#[test]
fn synth_complete_writes_certificate_stack() {
    let tmp = project_with_context(
        r#"
[service]
domain_name = "api.example.com"

[frontend]
domain_name = "clickme.example.com"

[dns]
hosted_zone = "example.com"

[database]
"#,
    );

    webstack()
        .current_dir(tmp.path())
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("WebStack-certificates-us-east-1 (us-east-1)"));

    let dir = tmp.path().join(".webstack");
    assert!(dir.join("WebStack-certificates-us-east-1.template.json").exists());
    let template = std::fs::read_to_string(dir.join("WebStack.template.json")).unwrap();
    assert!(template.contains("AWS::RDS::DBInstance"));
    assert!(template.contains("AWS::CloudFront::Distribution"));
    assert!(template.contains("DB_PASSWORD"));
}

#[test]
fn synth_leaves_cached_context_untouched() {
    let tmp = project_with_context("");

    webstack().current_dir(tmp.path()).arg("synth").assert().success();

    let context = std::fs::read_to_string(tmp.path().join("webstack.context.json")).unwrap();
    assert_eq!(context, CONTEXT);
}

#[test]
fn synth_rejects_domain_without_hosted_zone() {
    let tmp = project_with_context("[frontend]\ndomain_name = \"clickme.example.com\"\n");

    webstack()
        .current_dir(tmp.path())
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dns.hosted_zone"));

    assert!(!tmp.path().join(".webstack").exists());
}

#[test]
fn synth_rejects_invalid_config() {
    let tmp = project_with_context("invalid = [[[toml");

    webstack()
        .current_dir(tmp.path())
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ── Destroy Command (no AWS) ──

#[test]
fn destroy_without_assembly_fails() {
    let tmp = TempDir::new().unwrap();

    webstack()
        .current_dir(tmp.path())
        .args(["destroy", "-y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("webstack synth"));
}
