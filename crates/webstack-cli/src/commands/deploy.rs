use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use webstack_cloud::AwsClient;
use webstack_synth::assembly::template_path;

/// Execute the full deploy pipeline.
///
/// ```text
/// 1. Synth     ── lookups (cached) → .webstack/
/// 2. Preflight ── aws CLI, credentials, docker when images are built
/// 3. Images    ── ECR repository → docker build → docker push
/// 4. Stacks    ── certificate stacks, then the main stack
/// 5. Outputs   ── printed from the main stack
/// ```
pub async fn deploy(skip_image: bool) -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let client = AwsClient::new();

    println!("Synthesizing...");
    let synthesized = super::synth::run(&project_dir, &client, false).await?;
    let config = &synthesized.config;
    let manifest = &synthesized.manifest;
    let region = &config.stack.region;

    let Some(main) = manifest.main_stack() else {
        anyhow::bail!("assembly has no stacks");
    };

    println!("Running pre-flight checks...");
    let build_images = !skip_image && !manifest.assets.is_empty();
    client
        .check_prerequisites(config.stack.account.as_deref(), build_images)
        .await?;

    if skip_image
        && !manifest.assets.is_empty()
        && client.describe_stack(region, &main.stack_name).await?.is_none()
    {
        anyhow::bail!(
            "stack {} has never been deployed, so there is no image to keep.\n\
             Run `webstack deploy` without --skip-image first.",
            main.stack_name
        );
    }

    // Image parameters omitted from the overrides keep their deployed value.
    let mut image_parameters = BTreeMap::new();
    if build_images {
        let tag = image_tag()?;
        for asset in &manifest.assets {
            println!(
                "Building image for {} from {}...",
                asset.service,
                asset.directory.display()
            );
            let repository = client.ensure_image_repo(region, &asset.repository).await?;
            let directory = project_dir.join(&asset.directory);
            let image = client
                .push_image(region, &repository, &directory, &tag)
                .await?;
            tracing::info!(service = %asset.service, %image, "pushed image");
            image_parameters.insert(asset.parameter.clone(), image);
        }
    }

    for stack in &manifest.stacks {
        let mut parameters = BTreeMap::new();
        for binding in &stack.parameters {
            let source = manifest
                .stacks
                .iter()
                .find(|s| s.stack_name == binding.source_stack)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "parameter {} refers to unknown stack {}",
                        binding.parameter,
                        binding.source_stack
                    )
                })?;
            let outputs = client
                .stack_outputs(&source.region, &source.stack_name)
                .await?;
            let value = outputs.get(&binding.source_output).ok_or_else(|| {
                anyhow::anyhow!(
                    "stack {} has no output {}",
                    binding.source_stack,
                    binding.source_output
                )
            })?;
            parameters.insert(binding.parameter.clone(), value.clone());
        }
        if stack.stack_name == main.stack_name {
            parameters.extend(image_parameters.clone());
        }

        println!("Deploying stack {} ({})...", stack.stack_name, stack.region);
        client
            .deploy_stack(
                &stack.region,
                &stack.stack_name,
                &template_path(&project_dir, stack),
                &parameters,
            )
            .await?;
    }

    let outputs = client.stack_outputs(region, &main.stack_name).await?;
    println!();
    println!("Deployed {}", main.stack_name);
    for (name, value) in &outputs {
        println!("  {name} = {value}");
    }

    Ok(())
}

/// Unique per deploy so every push rolls the service.
fn image_tag() -> anyhow::Result<String> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(format!("deploy-{secs}"))
}
