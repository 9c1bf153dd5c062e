/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Website-related data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Unique identifier for a website
pub type WebsiteId = String;

/// Identifier of the connector which owns a website's storage
pub type ConnectorId = String;

/// Content stored in meta.json file
///
/// This is the metadata saved alongside the website data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMetaFileContent {
    /// Human-readable website name
    pub name: String,

    /// Preview image URL (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Per-connector settings for this website
    #[serde(default)]
    pub connector_user_settings: HashMap<String, Value>,
}

/// Website metadata returned to callers
///
/// Includes fields computed on each read like creation/modification dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteMeta {
    /// Unique website identifier
    pub website_id: WebsiteId,

    /// Human-readable website name
    pub name: String,

    /// Preview image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Per-connector settings
    #[serde(default)]
    pub connector_user_settings: HashMap<String, Value>,

    /// When the website was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the website was last modified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WebsiteMeta {
    /// Create WebsiteMeta from file content and additional fields
    pub fn from_file_content(
        website_id: WebsiteId,
        content: WebsiteMetaFileContent,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        WebsiteMeta {
            website_id,
            name: content.name,
            image_url: content.image_url,
            connector_user_settings: content.connector_user_settings,
            created_at,
            updated_at,
        }
    }

    /// The part of the metadata which is persisted
    pub fn file_content(&self) -> WebsiteMetaFileContent {
        WebsiteMetaFileContent {
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            connector_user_settings: self.connector_user_settings.clone(),
        }
    }
}

/// An asset used in the website (image, video...)
///
/// Only `src` is interpreted, every other field is kept as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset URL, stored or displayed form depending on context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A CSS rule of the website
///
/// The `style` map holds CSS properties, e.g. `background-image`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full website data including pages, styles, and assets
///
/// This is the in-memory document; on disk it is split into website.json
/// and one file per page.
/// Pages are kept as serde_json::Value to stay compatible with the
/// GrapesJS editor format without defining every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteData {
    /// Array of page objects (GrapesJS Page format)
    #[serde(default)]
    pub pages: Vec<Value>,

    /// Folder where individual page files are stored
    #[serde(default = "default_pages_folder")]
    pub pages_folder: String,

    /// Array of asset objects (images, etc.)
    #[serde(default)]
    pub assets: Vec<Asset>,

    /// Array of style objects (CSS rules)
    #[serde(default)]
    pub styles: Vec<Style>,

    /// Website settings (title, description, etc.)
    #[serde(default)]
    pub settings: Value,

    /// Font definitions
    #[serde(default)]
    pub fonts: Vec<Value>,

    /// Symbol definitions (reusable components)
    #[serde(default)]
    pub symbols: Vec<Value>,

    /// Publication settings
    #[serde(default)]
    pub publication: Value,

    /// Any other top level key written by the editor or its plugins
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_pages_folder() -> String {
    constants::WEBSITE_PAGES_FOLDER.to_string()
}

impl Default for WebsiteData {
    fn default() -> Self {
        // Empty website as created for new projects
        WebsiteData {
            pages: vec![serde_json::json!({})], // GrapesJS expects this to create an empty page
            pages_folder: default_pages_folder(),
            assets: Vec::new(),
            styles: Vec::new(),
            settings: serde_json::json!({}),
            fonts: Vec::new(),
            symbols: Vec::new(),
            publication: serde_json::json!({}),
            extra: Map::new(),
        }
    }
}

/// Content of a file to be written to storage
pub enum ConnectorFileContent {
    /// Raw bytes
    Bytes(Vec<u8>),

    /// Text, written as UTF-8
    Text(String),

    /// Streaming source, consumed until EOF when written
    Stream(Pin<Box<dyn AsyncRead + Send>>),
}

impl ConnectorFileContent {
    /// Wrap any async reader in a streaming content
    pub fn stream<R: AsyncRead + Send + 'static>(reader: R) -> Self {
        ConnectorFileContent::Stream(Box::pin(reader))
    }

    /// In-memory bytes, `None` for streams
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ConnectorFileContent::Bytes(bytes) => Some(bytes),
            ConnectorFileContent::Text(text) => Some(text.as_bytes()),
            ConnectorFileContent::Stream(_) => None,
        }
    }
}

impl fmt::Debug for ConnectorFileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorFileContent::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ConnectorFileContent::Text(text) => write!(f, "Text({} chars)", text.len()),
            ConnectorFileContent::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Vec<u8>> for ConnectorFileContent {
    fn from(bytes: Vec<u8>) -> Self {
        ConnectorFileContent::Bytes(bytes)
    }
}

impl From<String> for ConnectorFileContent {
    fn from(text: String) -> Self {
        ConnectorFileContent::Text(text)
    }
}

impl From<&str> for ConnectorFileContent {
    fn from(text: &str) -> Self {
        ConnectorFileContent::Text(text.to_string())
    }
}

/// A file to be written to storage
#[derive(Debug)]
pub struct ConnectorFile {
    /// Path relative to the target folder
    pub path: String,

    /// File content
    pub content: ConnectorFileContent,
}

impl ConnectorFile {
    pub fn new(path: impl Into<String>, content: impl Into<ConnectorFileContent>) -> Self {
        ConnectorFile {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// File and folder names used in storage
pub mod constants {
    /// Main website data file
    pub const WEBSITE_DATA_FILE: &str = "website.json";

    /// Website metadata file
    pub const WEBSITE_META_DATA_FILE: &str = "meta.json";

    /// Default folder for page files
    pub const WEBSITE_PAGES_FOLDER: &str = "pages";

    /// Legacy pages folder (for backwards compatibility)
    pub const LEGACY_WEBSITE_PAGES_FOLDER: &str = "src";

    /// Id of the website created when the storage is initialized
    pub const DEFAULT_WEBSITE_ID: &str = "default";

    /// Name of the website created when the storage is initialized
    pub const DEFAULT_WEBSITE_NAME: &str = "Default website";

    /// API routes used to read assets
    pub const API_PATH: &str = "/api";
    pub const API_WEBSITE_PATH: &str = "/website";
    pub const API_WEBSITE_ASSET_READ: &str = "/assets";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn website_data_keeps_unknown_keys() {
        let raw = json!({
            "pages": [],
            "pagesFolder": "pages",
            "assets": [{ "src": "/assets/a.png", "type": "image", "height": 10 }],
            "styles": [{ "selectors": ["#a"], "style": { "color": "red" } }],
            "dataSources": [{ "id": "ds" }],
        });
        let data: WebsiteData = serde_json::from_value(raw).unwrap();
        assert_eq!(data.assets[0].src.as_deref(), Some("/assets/a.png"));
        assert_eq!(data.assets[0].extra["height"], json!(10));
        assert_eq!(data.styles[0].extra["selectors"], json!(["#a"]));
        assert_eq!(data.extra["dataSources"], json!([{ "id": "ds" }]));

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["dataSources"], json!([{ "id": "ds" }]));
        assert_eq!(back["assets"][0]["type"], json!("image"));
    }

    #[test]
    fn missing_pages_folder_uses_default() {
        let data: WebsiteData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(data.pages_folder, "pages");
        assert!(data.pages.is_empty());
    }

    #[test]
    fn meta_file_content_is_camel_case() {
        let meta = WebsiteMetaFileContent {
            name: "Site".to_string(),
            image_url: Some("/img.png".to_string()),
            connector_user_settings: HashMap::new(),
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["imageUrl"], json!("/img.png"));
        assert_eq!(value["connectorUserSettings"], json!({}));
    }
}
