use webstack_cloud::AwsClient;
use webstack_core::WebstackConfig;
use webstack_core::builder::service_logical_id;
use webstack_synth::template::log_group_name;

pub async fn logs(follow: bool, since: Option<String>) -> anyhow::Result<()> {
    let config = WebstackConfig::load(&super::project_dir())?;
    let log_group = log_group_name(&config.stack.name, &service_logical_id(&config.service));
    let since = since.as_deref().unwrap_or("1h");

    let client = AwsClient::new();
    client
        .tail_logs(&config.stack.region, &log_group, since, follow)
        .await?;

    Ok(())
}
