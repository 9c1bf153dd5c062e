/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Configuration for Silex storage
//!
//! Loads settings from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;

use crate::error::ConnectorResult;
use crate::models::constants;
use crate::services::AssetUrlTranslator;

/// Storage configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL where the editor is accessible (e.g., "http://localhost:6805")
    pub url: String,

    /// Path where website data is stored (FsStorage)
    pub data_path: PathBuf,

    /// Folder name for assets within each website
    pub assets_folder: String,

    /// Default website ID created on first run
    pub default_website_id: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - SILEX_URL: Base URL (default: "http://localhost:6805")
    /// - SILEX_DATA_PATH or SILEX_FS_ROOT: Website data storage path (default: "./silex/storage")
    /// - SILEX_ASSETS_FOLDER: Assets folder name (default: "assets")
    /// - SILEX_DEFAULT_WEBSITE_ID: Website created on first run (default: "default")
    pub fn from_env() -> Self {
        // Try to load .env file, but don't fail if it doesn't exist
        let _ = dotenvy::dotenv();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let non_empty = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        Config {
            url: non_empty("SILEX_URL").unwrap_or(defaults.url),
            data_path: non_empty("SILEX_DATA_PATH")
                .or_else(|| non_empty("SILEX_FS_ROOT"))
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            assets_folder: non_empty("SILEX_ASSETS_FOLDER").unwrap_or(defaults.assets_folder),
            default_website_id: non_empty("SILEX_DEFAULT_WEBSITE_ID")
                .unwrap_or(defaults.default_website_id),
        }
    }

    /// Translator between stored and displayed asset URLs for this server
    pub fn asset_url_translator(&self) -> ConnectorResult<AssetUrlTranslator> {
        AssetUrlTranslator::new(&self.url, &self.assets_folder)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            url: "http://localhost:6805".to_string(),
            data_path: PathBuf::from("./silex/storage"),
            assets_folder: "assets".to_string(),
            default_website_id: constants::DEFAULT_WEBSITE_ID.to_string(),
        }
    }
}
