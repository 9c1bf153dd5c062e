/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Connector-related data models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque session passed to every connector call
///
/// Each backend decides what it stores there (tokens, user info...).
/// Connectors without authentication receive an empty object.
pub type ConnectorSession = serde_json::Value;

/// Type of connector, serialized as "STORAGE"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectorType {
    Storage,
}

/// Description of a connector for the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorData {
    /// Unique identifier for this connector
    pub connector_id: String,

    /// Type of connector (STORAGE or HOSTING)
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,

    /// Human-readable name shown in UI
    pub display_name: String,

    /// URL or data URI for the connector icon
    pub icon: String,

    /// If true, hide the logout button for this connector
    pub disable_logout: bool,

    /// Whether the user is currently logged in
    pub is_logged_in: bool,

    /// OAuth URL if this connector uses OAuth (null for basic auth)
    pub oauth_url: Option<String>,

    /// Primary color for UI styling
    pub color: String,

    /// Background color for UI styling
    pub background: String,
}

/// User data returned by a logged in connector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorUser {
    /// User's display name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// URL to user's profile picture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// The storage connector this user is associated with
    pub storage: ConnectorData,
}

/// Connector-specific options extracted from a settings form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorOptions {
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_type_and_options_serialize_for_the_editor() {
        assert_eq!(
            serde_json::to_string(&ConnectorType::Storage).unwrap(),
            "\"STORAGE\""
        );
        assert!(serde_json::from_str::<ConnectorType>("\"HOSTING\"").is_err());

        let options: ConnectorOptions =
            serde_json::from_value(serde_json::json!({ "websiteUrl": "https://example.com" }))
                .unwrap();
        assert_eq!(options.extra["websiteUrl"], "https://example.com");
    }
}
