mod platform;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = platform::cli::Cli::parse().config();
    tracker_logging::initialize(&config.logging);
    platform::run_app(config).await
}
