//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::models::bundled_catalog;

use super::App;

impl App {
    /// Ensure the schema exists and optionally load the bundled catalog.
    pub async fn run_init(&self, seed: bool) -> Result<()> {
        let config = Config::load()?;
        tracing::info!(
            "Loaded configuration (backend: {:?}, graph: {})",
            config.store.backend,
            config.postgres.graph_name
        );

        let ctx = Context::connect(config)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        tracing::info!("Ensuring schema...");
        ctx.schema
            .ensure_schema()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Schema setup failed: {}", e))?;
        tracing::info!("Schema ready");

        if seed {
            let seeds = bundled_catalog()?;
            let _guard = ctx.seed_lock.acquire().await;
            let count = ctx
                .catalog
                .seed(&seeds)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Seeding failed: {}", e))?;
            tracing::info!("Seeded {} products", count);
        }

        Ok(())
    }
}
