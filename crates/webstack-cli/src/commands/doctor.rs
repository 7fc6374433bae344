use std::path::Path;

use webstack_cloud::{AwsClient, CheckResult};
use webstack_core::config::CONFIG_FILE;
use webstack_core::{LookupContext, WebstackConfig};

pub async fn doctor() -> anyhow::Result<()> {
    let project_dir = super::project_dir();

    // Diagnostics still run against defaults when the config is broken.
    let (config, config_check) = match WebstackConfig::load(&project_dir) {
        Ok(config) if project_dir.join(CONFIG_FILE).exists() => {
            (config, CheckResult::ok("Found"))
        }
        Ok(config) => (config, CheckResult::fail("Not found (run: webstack init)")),
        Err(e) => (WebstackConfig::default(), CheckResult::fail(&e.to_string())),
    };

    let client = AwsClient::new();
    let mut report = client
        .doctor(&config.stack.region, config.stack.account.as_deref())
        .await;
    report.config_file = config_check;
    report.context_file = context_check(&project_dir, &config);

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}

fn context_check(project_dir: &Path, config: &WebstackConfig) -> CheckResult {
    match LookupContext::load(project_dir) {
        Ok(context) => {
            match context.network(&config.stack.region, &config.network.vpc_name) {
                Some(network) => CheckResult::ok(&format!(
                    "{} = {}",
                    config.network.vpc_name, network.vpc_id
                )),
                // Synth fills it on first run.
                None => CheckResult::ok("Not resolved yet"),
            }
        }
        Err(e) => CheckResult::fail(&e.to_string()),
    }
}
