use webstack_cloud::AwsClient;
use webstack_core::WebstackConfig;

pub async fn outputs(json: bool) -> anyhow::Result<()> {
    let config = WebstackConfig::load(&super::project_dir())?;
    let client = AwsClient::new();

    let outputs = client
        .stack_outputs(&config.stack.region, &config.stack.name)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        for (name, value) in &outputs {
            println!("{name} = {value}");
        }
    }
    Ok(())
}
