use std::path::Path;

use webstack_cloud::AwsClient;
use webstack_core::{
    DeclarationBuilder, HostedZoneCandidate, LookupContext, NetworkCandidate, WebstackConfig,
    resolve_hosted_zone, resolve_network,
};
use webstack_synth::{Manifest, TemplateRenderer};

/// Result of a synth run.
pub(crate) struct Synthesized {
    pub config: WebstackConfig,
    pub manifest: Manifest,
    pub resources: usize,
}

pub async fn synth(refresh: bool) -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let client = AwsClient::new();

    let synthesized = run(&project_dir, &client, refresh).await?;

    for stack in &synthesized.manifest.stacks {
        println!(
            "  {} ({}) -> .webstack/{}",
            stack.stack_name, stack.region, stack.template
        );
    }
    for asset in &synthesized.manifest.assets {
        println!(
            "  image for {} built from {}",
            asset.service,
            asset.directory.display()
        );
    }
    println!();
    println!(
        "Synthesized {} resource(s) for {} into .webstack/",
        synthesized.resources, synthesized.config.stack.name
    );

    Ok(())
}

/// Lookups → declaration → templates → assembly.
pub(crate) async fn run(
    project_dir: &Path,
    client: &AwsClient,
    refresh: bool,
) -> anyhow::Result<Synthesized> {
    let config = WebstackConfig::load(project_dir)?;
    let mut context = LookupContext::load(project_dir)?;
    let mut context_changed = false;

    let region = &config.stack.region;
    let vpc_name = &config.network.vpc_name;

    let network = match context.network(region, vpc_name) {
        Some(cached) if !refresh => cached.clone(),
        _ => {
            let network = lookup_network(client, region, vpc_name).await?;
            context.insert_network(region, vpc_name, network.clone());
            context_changed = true;
            network
        }
    };

    let mut builder = DeclarationBuilder::new(&config).network(network);

    if config.needs_hosted_zone()
        && let Some(dns) = &config.dns
    {
        let zone = match context.hosted_zone(&dns.hosted_zone) {
            Some(cached) if !refresh => cached.clone(),
            _ => {
                let zone = lookup_hosted_zone(client, &dns.hosted_zone).await?;
                context.insert_hosted_zone(zone.clone());
                context_changed = true;
                zone
            }
        };
        builder = builder.hosted_zone(zone);
    }

    if context_changed {
        context.save(project_dir)?;
        tracing::info!(path = %LookupContext::path(project_dir).display(), "saved lookup context");
    }

    let declaration = builder.build()?;
    let synthesis = TemplateRenderer::new(&declaration).render()?;
    let manifest = webstack_synth::write_assembly(project_dir, &synthesis)?;

    Ok(Synthesized {
        resources: declaration.resources.len(),
        config,
        manifest,
    })
}

async fn lookup_network(
    client: &AwsClient,
    region: &str,
    vpc_name: &str,
) -> anyhow::Result<NetworkCandidate> {
    tracing::info!(region, vpc_name, "looking up VPC");
    let candidates = client.find_networks(region, vpc_name).await?;
    Ok(resolve_network(vpc_name, &candidates)?)
}

async fn lookup_hosted_zone(client: &AwsClient, name: &str) -> anyhow::Result<HostedZoneCandidate> {
    tracing::info!(zone = name, "looking up hosted zone");
    let candidates = client.find_hosted_zones(name).await?;
    Ok(resolve_hosted_zone(name, &candidates)?)
}
