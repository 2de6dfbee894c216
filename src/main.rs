use anyhow::anyhow;
use tracing::info;

use tldr_bot::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tldr_bot::setup_logging();

    let config = AppConfig::from_env().map_err(|e| anyhow!("configuration error: {e}"))?;

    info!("Starting TLDR Bot...");
    tldr_bot::bot::run(config).await
}
