mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "webstack",
    about = "Deploy a containerized web service and its static frontend to AWS"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create webstack.toml in the current directory
    Init,
    /// Resolve lookups and write CloudFormation templates to .webstack/
    Synth {
        /// Re-query the VPC and hosted zone instead of using webstack.context.json
        #[arg(long)]
        refresh: bool,
    },
    /// Build and push the service image, then deploy every stack
    Deploy {
        /// Keep the image of the running deployment instead of building a new one
        #[arg(long)]
        skip_image: bool,
    },
    /// Print the outputs of the deployed stack
    Outputs {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the state of every deployed stack
    Status,
    /// Show service container logs
    Logs {
        /// Tail logs in real-time
        #[arg(long, short = 'f')]
        follow: bool,
        /// How far back to start, e.g. 10m, 1h, 2d (default: 1h)
        #[arg(long)]
        since: Option<String>,
    },
    /// Delete every stack, including the database and frontend bucket
    Destroy {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Check AWS and Docker setup and readiness
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init_project().await?,
        Commands::Synth { refresh } => commands::synth(refresh).await?,
        Commands::Deploy { skip_image } => commands::deploy(skip_image).await?,
        Commands::Outputs { json } => commands::outputs(json).await?,
        Commands::Status => commands::status().await?,
        Commands::Logs { follow, since } => commands::logs(follow, since).await?,
        Commands::Destroy { yes } => commands::destroy(yes).await?,
        Commands::Doctor => commands::doctor().await?,
    }

    Ok(())
}
