/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Silex Storage Library
//!
//! Persistence layer of the Silex website builder: storage connectors,
//! the split/merge codec for website data and the asset URL translation
//! between stored and displayed forms.

pub mod config;
pub mod connectors;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::Config;
pub use connectors::{ConnectorRegistry, FsStorage, StorageConnector};
pub use error::{ConnectorError, ConnectorResult};
pub use models::{ConnectorFile, ConnectorType, WebsiteData, WebsiteMeta};
pub use services::AssetUrlTranslator;
