use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "realm-tracker")]
#[command(about = "Game session tracker for PvPGN / Diablo II logs", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Run a single poll cycle, flush the outputs and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(tracker_infrastructure::CONFIG_ENV, config);
    }

    if args.once {
        tracker_bootstrap::run_once().await
    } else {
        tracker_bootstrap::run_standalone().await
    }
}
