/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Error types for Silex storage
//!
//! This module defines all error types used by connectors and codecs.

use thiserror::Error;

/// Errors that can occur in connector operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// User is not authenticated with the connector
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Requested website, metadata or asset does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A required identifier is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem or stream operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An asset path could not be classified as stored, displayed or inline
    ///
    /// Never returned by the public URL translation functions, which log it
    /// and pass the value through.
    #[error("Unrecognized asset path: {0}")]
    UnrecognizedPath(String),
}

impl ConnectorError {
    /// Map an IO error to `NotFound` when the file is missing
    pub(crate) fn from_io(e: std::io::Error, what: impl FnOnce() -> String) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConnectorError::NotFound(what())
        } else {
            ConnectorError::Io(e)
        }
    }

    /// True for `NotFound` errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectorError::NotFound(_))
    }
}

/// Result type alias for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Fail with `InvalidArgument` when a required parameter is empty
pub fn required_param<'a>(value: &'a str, name: &str) -> ConnectorResult<&'a str> {
    if value.trim().is_empty() {
        return Err(ConnectorError::InvalidArgument(format!("Missing {}", name)));
    }
    Ok(value)
}
