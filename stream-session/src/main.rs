mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use stream_session_core::{
    bootstrap::{init_repository, init_services, load_config, log_effective_config},
    logging,
};

use server::StreamSessionServer;

#[derive(Parser, Debug)]
#[command(name = "stream-session")]
#[command(about = "Stream session broker for a MediaMTX relay", long_about = None)]
struct Args {
    /// Config file (YAML or TOML); written with defaults when it does not exist
    #[arg(short, long, env = "STREAM_SESSION_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so it can feed both the CLI and the config layer
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&config.logging)?;
    info!("Starting stream-session v{}", env!("CARGO_PKG_VERSION"));
    log_effective_config(&config);

    // 3. Record store
    let repository = init_repository(&config.redis).await?;

    // 4. Relay client and services
    let services = init_services(&config, repository)?;

    // 5. Serve until a signal arrives
    StreamSessionServer::new(config, services).start().await
}
