/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Connector registry
//!
//! Holds the available storage connectors and looks them up by ID.

use std::sync::Arc;

use crate::connectors::traits::StorageConnector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::models::ConnectorSession;

/// Registry of available storage connectors
pub struct ConnectorRegistry {
    storage_connectors: Vec<Arc<dyn StorageConnector>>,
}

impl ConnectorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ConnectorRegistry {
            storage_connectors: Vec::new(),
        }
    }

    /// Register a storage connector
    pub fn register_storage(&mut self, connector: Arc<dyn StorageConnector>) {
        self.storage_connectors.push(connector);
    }

    /// Get all storage connectors
    pub fn storage_connectors(&self) -> &[Arc<dyn StorageConnector>] {
        &self.storage_connectors
    }

    /// Find a storage connector by ID
    pub fn get_storage_connector(&self, connector_id: &str) -> Option<Arc<dyn StorageConnector>> {
        self.storage_connectors
            .iter()
            .find(|c| c.connector_id() == connector_id)
            .cloned()
    }

    /// Get a specific storage connector, or the first one when no ID is given
    pub fn get_storage_connector_or_default(
        &self,
        connector_id: Option<&str>,
    ) -> Option<Arc<dyn StorageConnector>> {
        match connector_id {
            Some(id) => self.get_storage_connector(id),
            None => self.storage_connectors.first().cloned(),
        }
    }

    /// Get the storage connector for a session, checking authentication
    pub async fn storage_for_session(
        &self,
        session: &ConnectorSession,
        connector_id: Option<&str>,
    ) -> ConnectorResult<Arc<dyn StorageConnector>> {
        let connector = self
            .get_storage_connector_or_default(connector_id)
            .ok_or_else(|| ConnectorError::NotFound("No storage connector found".to_string()))?;

        if !connector.is_logged_in(session).await? {
            return Err(ConnectorError::NotAuthenticated);
        }

        Ok(connector)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::FsStorage;

    fn registry(dir: &tempfile::TempDir) -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::new();
        registry.register_storage(Arc::new(FsStorage::new(
            dir.path().to_path_buf(),
            "assets".to_string(),
        )));
        registry
    }

    #[tokio::test]
    async fn finds_connector_by_id_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);

        assert_eq!(registry.storage_connectors().len(), 1);
        assert!(registry.get_storage_connector("fs-storage").is_some());
        assert!(registry.get_storage_connector("gitlab").is_none());
        let default = registry.get_storage_connector_or_default(None).unwrap();
        assert_eq!(default.connector_id(), "fs-storage");
    }

    #[tokio::test]
    async fn session_lookup_fails_for_unknown_connector() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);
        let session = serde_json::json!({});

        assert!(registry.storage_for_session(&session, None).await.is_ok());
        let err = match registry.storage_for_session(&session, Some("ftp")).await {
            Err(err) => err,
            Ok(_) => panic!("ftp is not registered"),
        };
        assert!(err.is_not_found());

        let empty = ConnectorRegistry::default();
        assert!(empty.storage_for_session(&session, None).await.is_err());
    }
}
