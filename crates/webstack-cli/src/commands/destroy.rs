use std::io::Write;

use webstack_cloud::AwsClient;
use webstack_core::WebstackConfig;
use webstack_synth::assembly::{ASSEMBLY_DIR, assembly_dir};

/// Delete the main stack, then the certificate stacks, then the local assembly.
pub async fn destroy(skip_confirm: bool) -> anyhow::Result<()> {
    let project_dir = super::project_dir();
    let config = WebstackConfig::load(&project_dir)?;
    let Some(manifest) = super::existing_manifest(&project_dir)? else {
        anyhow::bail!(
            "no assembly found in {ASSEMBLY_DIR}/.\n\
             Run `webstack synth` first so destroy knows every stack to delete."
        );
    };

    let client = AwsClient::new();

    if !skip_confirm {
        println!("This will delete:");
        for stack in manifest.stacks.iter().rev() {
            println!("  - stack '{}' in {}", stack.stack_name, stack.region);
            for bucket in &stack.auto_delete_buckets {
                println!("      bucket {bucket} and every object in it");
            }
        }
        if config.database.is_some() {
            println!();
            println!("  The database is deleted immediately and no final snapshot is kept.");
            println!("  All data in it will be lost.");
        }
        println!("  - Local {ASSEMBLY_DIR}/");

        println!();
        print!("Are you sure? [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !matches!(input.trim(), "y" | "Y" | "yes" | "YES") {
            println!("Aborted.");
            return Ok(());
        }
    }

    // Reverse deploy order: the main stack still references the certificates.
    for stack in manifest.stacks.iter().rev() {
        if client
            .describe_stack(&stack.region, &stack.stack_name)
            .await?
            .is_none()
        {
            println!("Stack {} is not deployed, skipping.", stack.stack_name);
            continue;
        }

        for bucket in &stack.auto_delete_buckets {
            let name = client
                .physical_resource_id(&stack.region, &stack.stack_name, bucket)
                .await?;
            println!("Emptying bucket {name}...");
            client.empty_bucket(&stack.region, &name).await?;
        }

        println!("Deleting stack {} ({})...", stack.stack_name, stack.region);
        client.delete_stack(&stack.region, &stack.stack_name).await?;
        println!("  Deleted.");
    }

    let dir = assembly_dir(&project_dir);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
        println!("Removed local {ASSEMBLY_DIR}/");
    }

    println!();
    println!("Destroy complete.");
    println!("Container images remain in ECR; the lookup context is kept for the next deploy.");

    Ok(())
}
