/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Connector trait definitions
//!
//! These traits define the interface that all storage connectors implement.
//! Callers only depend on `StorageConnector`, never on a concrete backend.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::models::{
    ConnectorData, ConnectorFile, ConnectorOptions, ConnectorSession, ConnectorType,
    ConnectorUser, StatusCallback, WebsiteData, WebsiteId, WebsiteMeta, WebsiteMetaFileContent,
};

/// Base information that all connectors must provide
pub trait ConnectorInfo: Send + Sync {
    /// Unique identifier for this connector (e.g., "fs-storage")
    fn connector_id(&self) -> &str;

    /// Type of connector
    fn connector_type(&self) -> ConnectorType;

    /// Human-readable name for UI display
    fn display_name(&self) -> &str;

    /// Icon URL or data URI
    fn icon(&self) -> &str;

    /// Primary color for UI
    fn color(&self) -> &str;

    /// Background color for UI
    fn background(&self) -> &str;

    /// Whether to hide the logout button
    fn disable_logout(&self) -> bool {
        false
    }
}

/// StorageConnector stores website data and assets
///
/// Implementations might store data on:
/// - Local filesystem (FsStorage)
/// - GitLab repositories
/// - FTP servers
/// - Cloud storage (S3, etc.)
///
/// The session is opaque: connectors without authentication ignore it.
#[async_trait]
pub trait StorageConnector: ConnectorInfo {
    // ==================
    // Authentication
    // ==================

    /// Check if the user is currently logged in
    ///
    /// For connectors without authentication (like FsStorage),
    /// this always returns true.
    async fn is_logged_in(&self, session: &ConnectorSession) -> ConnectorResult<bool>;

    /// Get the OAuth URL to start authentication
    ///
    /// Returns None if this connector uses basic auth or no auth.
    async fn get_oauth_url(&self, session: &ConnectorSession) -> ConnectorResult<Option<String>>;

    /// HTML login form for connectors using basic auth
    async fn get_login_form(
        &self,
        session: &ConnectorSession,
        redirect_to: &str,
    ) -> ConnectorResult<Option<String>>;

    /// HTML form with the connector settings
    async fn get_settings_form(
        &self,
        session: &ConnectorSession,
        redirect_to: &str,
    ) -> ConnectorResult<Option<String>>;

    /// Store authentication tokens in the session
    ///
    /// Called after OAuth callback or form submission.
    async fn set_token(
        &self,
        session: &mut ConnectorSession,
        token: &serde_json::Value,
    ) -> ConnectorResult<()>;

    /// Log out the user (clear session data)
    async fn logout(&self, session: &mut ConnectorSession) -> ConnectorResult<()>;

    /// Get the currently logged in user's data
    async fn get_user(&self, session: &ConnectorSession) -> ConnectorResult<ConnectorUser>;

    /// Extract connector options from form data
    fn get_options(&self, form_data: &serde_json::Value) -> ConnectorOptions;

    // ==================
    // Website CRUD
    // ==================

    /// List all websites accessible to the user
    async fn list_websites(&self, session: &ConnectorSession) -> ConnectorResult<Vec<WebsiteMeta>>;

    /// Read a website's data
    async fn read_website(
        &self,
        session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteData>;

    /// Create a new website with empty data
    ///
    /// Returns the new website's ID.
    async fn create_website(
        &self,
        session: &ConnectorSession,
        meta: &WebsiteMetaFileContent,
    ) -> ConnectorResult<WebsiteId>;

    /// Update an existing website's data
    async fn update_website(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        data: &WebsiteData,
    ) -> ConnectorResult<()>;

    /// Delete a website and all its files
    async fn delete_website(&self, session: &ConnectorSession, website_id: &str)
        -> ConnectorResult<()>;

    /// Copy a website under a new ID, its name gets a " copy" suffix
    ///
    /// Returns the new website's ID.
    async fn duplicate_website(
        &self,
        session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteId>;

    // ==================
    // Assets
    // ==================

    /// Get an asset with its path
    async fn get_asset(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        path: &str,
    ) -> ConnectorResult<ConnectorFile>;

    /// Write multiple asset files
    ///
    /// The status callback is called for each file and once more with the
    /// final status. Returns the stored paths of the written assets.
    async fn write_assets(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        files: Vec<ConnectorFile>,
        status: Option<&StatusCallback>,
    ) -> ConnectorResult<Vec<String>>;

    /// Delete asset files
    async fn delete_assets(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        paths: &[String],
    ) -> ConnectorResult<()>;

    /// Read a single asset file
    async fn read_asset(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        file_name: &str,
    ) -> ConnectorResult<Vec<u8>>;

    // ==================
    // Metadata
    // ==================

    /// Get website metadata
    async fn get_website_meta(
        &self,
        session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteMeta>;

    /// Update website metadata
    async fn set_website_meta(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        meta: &WebsiteMetaFileContent,
    ) -> ConnectorResult<()>;
}

/// Helper function to convert a connector to ConnectorData for the editor
pub async fn to_connector_data<C: StorageConnector + ?Sized>(
    session: &ConnectorSession,
    connector: &C,
) -> ConnectorResult<ConnectorData> {
    Ok(ConnectorData {
        connector_id: connector.connector_id().to_string(),
        connector_type: connector.connector_type(),
        display_name: connector.display_name().to_string(),
        icon: connector.icon().to_string(),
        disable_logout: connector.disable_logout(),
        is_logged_in: connector.is_logged_in(session).await?,
        oauth_url: connector.get_oauth_url(session).await?,
        color: connector.color().to_string(),
        background: connector.background().to_string(),
    })
}
