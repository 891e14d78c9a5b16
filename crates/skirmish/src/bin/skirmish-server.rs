//! Standalone Skirmish server.
//!
//! Reads `HOST`, `PORT` and `ROUND_SECONDS` from the environment and logs
//! through `RUST_LOG` (default `info`).

use skirmish::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = ServerSettings::from_env()?;
    let mut config = ArenaConfig::default();
    settings.apply(&mut config);

    let server = SkirmishServer::builder()
        .bind(&settings.addr())
        .config(config)
        .build()
        .await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "skirmish server listening");
    }
    server.run().await
}
