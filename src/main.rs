use clap::Parser;
use prompt_pipeline::cli::Cli;
use prompt_pipeline::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = commands::dispatch(cli.command).await {
        eprintln!("• {}", e);
        std::process::exit(1);
    }
}
