use webstack_cloud::AwsClient;
use webstack_core::WebstackConfig;

pub async fn status() -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let config = WebstackConfig::load(&project_dir)?;
    let manifest = super::existing_manifest(&project_dir)?;

    let client = AwsClient::new();
    for (stack_name, region) in super::known_stacks(&config, manifest.as_ref()) {
        match client.describe_stack(&region, &stack_name).await? {
            Some(stack) => {
                println!("{stack_name} ({region}): {}", stack.status);
                if let Some(updated) = &stack.last_updated {
                    println!("  last updated: {updated}");
                }
                if stack.is_failed()
                    && let Some(reason) = &stack.status_reason
                {
                    println!("  reason: {reason}");
                }
            }
            None => println!("{stack_name} ({region}): not deployed"),
        }
    }
    Ok(())
}
