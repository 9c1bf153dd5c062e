/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Job tracking
//!
//! `FileJob` reports the progress of a multi-file write to a status callback.
//! `JobManager` keeps the last known state of jobs so they can be queried by ID.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::models::{FileProgress, JobData, JobId, JobProgress, JobStatus, StatusCallback};

/// Progress of a multi-file operation
///
/// Every change is sent to the optional callback with the status of all files.
pub struct FileJob<'a> {
    files: Vec<FileProgress>,
    callback: Option<&'a StatusCallback>,
}

impl<'a> FileJob<'a> {
    /// Start tracking the given files, all waiting
    pub fn new<I, S>(paths: I, callback: Option<&'a StatusCallback>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FileJob {
            files: paths
                .into_iter()
                .map(|path| FileProgress {
                    path: path.into(),
                    status: JobStatus::InProgress,
                    message: "Waiting".to_string(),
                })
                .collect(),
            callback,
        }
    }

    /// The file at `index` is being written
    pub fn writing(&mut self, index: usize) {
        self.set(index, JobStatus::InProgress, "Writing".to_string());
    }

    /// The file at `index` was written
    pub fn success(&mut self, index: usize) {
        self.set(index, JobStatus::Success, "Success".to_string());
    }

    /// The file at `index` could not be written
    pub fn error(&mut self, index: usize, error: &dyn std::fmt::Display) {
        self.set(index, JobStatus::Error, format!("Error ({})", error));
    }

    /// Send the terminal status: Error if any file failed, Success otherwise
    pub fn finish(self) -> JobStatus {
        let status = if self.files.iter().any(|f| f.status == JobStatus::Error) {
            JobStatus::Error
        } else {
            JobStatus::Success
        };
        self.report(status);
        status
    }

    fn set(&mut self, index: usize, status: JobStatus, message: String) {
        if let Some(file) = self.files.get_mut(index) {
            file.status = status;
            file.message = message;
        }
        self.report(JobStatus::InProgress);
    }

    fn report(&self, status: JobStatus) {
        if let Some(callback) = self.callback {
            callback(&JobProgress {
                status,
                message: self.summary(),
                files: self.files.clone(),
            });
        }
    }

    fn summary(&self) -> String {
        let lines: Vec<String> = self
            .files
            .iter()
            .map(|f| format!("{}: {}", f.path, f.message))
            .collect();
        format!("Writing files: {}", lines.join(", "))
    }
}

/// Job manager for tracking async operations
///
/// The job manager maintains a registry of active and completed jobs.
#[derive(Clone)]
pub struct JobManager {
    /// Map of job ID to job data
    /// Using RwLock for thread-safe access
    jobs: Arc<RwLock<HashMap<JobId, JobData>>>,
}

impl JobManager {
    /// Create a new job manager
    pub fn new() -> Self {
        JobManager {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a new job
    ///
    /// Creates a new job with a unique ID and IN_PROGRESS status.
    pub fn start_job(&self, message: String) -> JobData {
        let job = JobData {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::InProgress,
            message,
        };

        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        jobs.insert(job.job_id.clone(), job.clone());

        job
    }

    /// Get a job by ID
    pub fn get_job(&self, job_id: &str) -> Option<JobData> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(job_id).cloned()
    }

    /// Record the progress of a job
    ///
    /// Jobs only move forward: once SUCCESS or ERROR, later updates are ignored.
    pub fn update_job(&self, job_id: &str, progress: &JobProgress) {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        match jobs.get_mut(job_id) {
            Some(job) if job.status.is_terminal() => {
                tracing::warn!("Ignoring update of finished job {}", job_id);
            }
            Some(job) => {
                job.status = progress.status;
                job.message = progress.message.clone();
                if progress.status == JobStatus::Error {
                    tracing::error!("Job {} failed: {}", job_id, progress.message);
                }
            }
            None => tracing::warn!("Update for unknown job {}", job_id),
        }
    }

    /// Status callback which records progress into the given job
    pub fn observer(&self, job_id: &str) -> Box<StatusCallback> {
        let manager = self.clone();
        let job_id = job_id.to_string();
        Box::new(move |progress: &JobProgress| manager.update_job(&job_id, progress))
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
