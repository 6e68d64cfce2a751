use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod pipeline;
mod progress;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("cvl error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    let config = lens_config::LensConfig::load_with_dotenv()
        .context("failed to load configuration")?;

    match &cli.command {
        cli::Commands::Run(args) => commands::run::handle(args, &flags, &config).await,
        cli::Commands::Verify => commands::verify::handle(&flags, &config),
        cli::Commands::Trends(args) => commands::trends::handle(args, &flags, &config),
        cli::Commands::Export(args) => commands::export::handle(args, &flags, &config),
        cli::Commands::Bundle(args) => commands::bundle::handle(args, &flags, &config),
        cli::Commands::Heatmap(args) => commands::heatmap::handle(args, &flags, &config),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CONVOLENS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
