use std::path::Path;

use webstack_core::config::CONFIG_FILE;
use webstack_core::context::CONTEXT_FILE;
use webstack_synth::assembly::ASSEMBLY_DIR;

const CONFIG_TEMPLATE: &str = r#"[stack]
# name = "WebStack"
# region = "us-west-2"
# account = "123456789012"

[network]
# vpc_name = "jenkins-vpc"

[service]
# name = "Counter"
# build_context = "../back"
# container_port = 8080
# memory_limit_mib = 512
# desired_count = 1
# domain_name = "api.example.com"

# Static frontend on S3 + CloudFront, /api/* routed to the service.
# [frontend]
# domain_name = "clickme.example.com"
# viewer_protocol = "redirect-to-https"

# [dns]
# hosted_zone = "example.com"

# Managed database; DB_HOST, DB_PORT, DB_NAME, DB_USER and DB_PASSWORD are injected.
# [database]
# engine = "postgres"
# database_name = "counter"
"#;

/// Write a commented `webstack.toml` and ignore the generated files.
pub async fn init_project() -> anyhow::Result<()> {
    let mut created = Vec::new();

    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("{CONFIG_FILE} already exists, skipping");
    } else {
        std::fs::write(config_path, CONFIG_TEMPLATE)?;
        created.push(CONFIG_FILE);
    }

    let gitignore_path = Path::new(".gitignore");
    let ignored = format!("/{ASSEMBLY_DIR}/");
    let existing = if gitignore_path.exists() {
        std::fs::read_to_string(gitignore_path)?
    } else {
        String::new()
    };
    if existing.lines().any(|l| l.trim() == ignored) {
        eprintln!(".gitignore already ignores {ASSEMBLY_DIR}/, skipping");
    } else {
        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&ignored);
        content.push('\n');
        std::fs::write(gitignore_path, content)?;
        created.push(".gitignore");
    }

    if created.is_empty() {
        println!("Nothing to create, already initialized.");
    } else {
        for f in &created {
            println!("Created {f}");
        }
    }

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Edit {CONFIG_FILE} (VPC name, service build context, domains)");
    println!();
    println!("  2. Check your AWS and Docker setup:");
    println!("     webstack doctor");
    println!();
    println!("  3. Preview the templates (commit {CONTEXT_FILE} afterwards):");
    println!("     webstack synth");
    println!();
    println!("  4. Deploy:");
    println!("     webstack deploy");

    Ok(())
}
