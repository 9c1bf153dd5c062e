/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use silex_storage::{Config, FsStorage, StorageConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silex_storage=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    config
        .asset_url_translator()
        .context("SILEX_URL is not a valid base URL")?;
    tracing::info!("Using storage folder {}", config.data_path.display());

    // Create the data folder and default website on first run
    let storage = FsStorage::from_config(&config).await.with_context(|| {
        format!(
            "Failed to initialize storage in {}",
            config.data_path.display()
        )
    })?;

    let session = serde_json::json!({});
    let websites = storage
        .list_websites(&session)
        .await
        .context("Failed to list websites")?;

    tracing::info!("{} website(s) in storage", websites.len());
    for website in &websites {
        tracing::info!("  {} ({})", website.name, website.website_id);
    }

    Ok(())
}
