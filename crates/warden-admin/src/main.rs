//! warden-admin: opens the store, creates the root org on first start and
//! waits for shutdown.

use std::sync::Arc;

use tracing::info;
use warden_admin::config::{AdminConfig, Secrets};
use warden_admin::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = AdminConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("warden={}", config.logging.log_level).parse()?),
        )
        .init();

    info!("Warden admin starting");

    // 3. Keys come from the environment only
    let secrets = Secrets::from_env()?;

    // 4. Open the store and bootstrap the root org
    let (state, root) = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || AppState::bootstrap(&config, secrets)).await??
    };
    let state = Arc::new(state);

    if let Some(root) = root {
        // Printed once, never logged.
        println!("root org:        {}", root.org);
        println!("root user:       {}", root.user);
        println!("root api secret: {}", root.api_secret);
    }

    info!(
        root_org = %state.root_org(),
        replicas = config.storage.replicas,
        database = %config.storage.database_path,
        "Warden admin ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
