/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Job-related data models for tracking multi-file operations

use serde::{Deserialize, Serialize};

/// Unique identifier for a job
pub type JobId = String;

/// Status of an async job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is currently running
    InProgress,

    /// Job completed successfully
    Success,

    /// Job failed with an error
    Error,
}

impl JobStatus {
    /// Success and Error end the job
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }
}

/// Basic job data for tracking progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    /// Unique job identifier
    pub job_id: JobId,

    /// Current status
    pub status: JobStatus,

    /// Human-readable status message
    pub message: String,
}

/// Progress of a single file in a multi-file operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProgress {
    /// Path of the file, as given by the caller
    pub path: String,

    pub status: JobStatus,

    /// "Waiting", "Writing", "Success" or "Error (...)"
    pub message: String,
}

/// Payload sent to status callbacks during multi-file operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Aggregate status, terminal on the last call
    pub status: JobStatus,

    /// Human-readable summary of all files
    pub message: String,

    /// Status of each file, in input order
    pub files: Vec<FileProgress>,
}

/// Observer of multi-file operations
pub type StatusCallback = dyn Fn(&JobProgress) + Send + Sync;
