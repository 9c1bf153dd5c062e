/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Filesystem storage connector
//!
//! Stores website data on the local filesystem.
//! Each website is a directory containing:
//! - website.json (main data file)
//! - meta.json (metadata file)
//! - assets/ (uploaded assets)
//! - pages/ (individual page files)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::Config;
use crate::connectors::traits::{to_connector_data, ConnectorInfo, StorageConnector};
use crate::error::{required_param, ConnectorError, ConnectorResult};
use crate::models::{
    constants, ConnectorFile, ConnectorFileContent, ConnectorOptions, ConnectorSession,
    ConnectorType, ConnectorUser, StatusCallback, WebsiteData, WebsiteId, WebsiteMeta,
    WebsiteMetaFileContent,
};
use crate::services::website_data::{self, PAGE_FILE_EXTENSION};
use crate::services::FileJob;

/// Icon for filesystem connector (user silhouette SVG as data URI)
const USER_ICON: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' height='1em' viewBox='0 0 448 512'%3E%3Cpath d='M304 128a80 80 0 1 0 -160 0 80 80 0 1 0 160 0zM96 128a128 128 0 1 1 256 0A128 128 0 1 1 96 128zM49.3 464H398.7c-8.9-63.3-63.3-112-129-112H178.3c-65.7 0-120.1 48.7-129 112zM0 482.3C0 383.8 79.8 304 178.3 304h91.4C368.2 304 448 383.8 448 482.3c0 16.4-13.3 29.7-29.7 29.7H29.7C13.3 512 0 498.7 0 482.3z'/%3E%3C/svg%3E";

/// Icon for the connector (laptop icon)
const FILE_ICON: &str = "/assets/laptop.png";

/// Filesystem storage connector
///
/// Stores websites in a directory structure:
/// ```text
/// data_path/
///   {website_id}/
///     website.json
///     meta.json
///     assets/
///       image.png
///     pages/
///       {page_id}.json
/// ```
pub struct FsStorage {
    /// Root path where all websites are stored
    data_path: PathBuf,

    /// Folder name for assets within each website
    assets_folder: String,
}

impl FsStorage {
    /// Create a new FsStorage connector
    ///
    /// # Arguments
    /// * `data_path` - Directory where websites will be stored
    /// * `assets_folder` - Name of the assets folder within each website
    pub fn new(data_path: PathBuf, assets_folder: String) -> Self {
        FsStorage {
            data_path,
            assets_folder: assets_folder.trim_matches('/').to_string(),
        }
    }

    /// Create the connector and its data folder from the configuration
    pub async fn from_config(config: &Config) -> ConnectorResult<Self> {
        let storage = FsStorage::new(config.data_path.clone(), config.assets_folder.clone());
        storage.init(&config.default_website_id).await?;
        Ok(storage)
    }

    /// Root path where all websites are stored
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Get the path to a website's directory
    fn website_path(&self, website_id: &str) -> ConnectorResult<PathBuf> {
        Ok(self.data_path.join(check_website_id(website_id)?))
    }

    /// Get the path to a website's data file
    fn website_data_path(&self, website_id: &str) -> ConnectorResult<PathBuf> {
        Ok(self.website_path(website_id)?.join(constants::WEBSITE_DATA_FILE))
    }

    /// Get the path to a website's metadata file
    fn website_meta_path(&self, website_id: &str) -> ConnectorResult<PathBuf> {
        Ok(self
            .website_path(website_id)?
            .join(constants::WEBSITE_META_DATA_FILE))
    }

    /// Get the path to a website's assets folder
    fn assets_path(&self, website_id: &str) -> ConnectorResult<PathBuf> {
        Ok(self.website_path(website_id)?.join(&self.assets_folder))
    }

    /// Get the path to an asset file
    ///
    /// Accepts the stored form (`/assets/img/a.png`) as returned by
    /// `write_assets`, or a path relative to the assets folder (`img/a.png`).
    fn asset_file_path(&self, website_id: &str, path: &str) -> ConnectorResult<PathBuf> {
        let stored_prefix = format!("/{}/", self.assets_folder);
        let relative = path.strip_prefix(&stored_prefix).unwrap_or(path);
        Ok(self.assets_path(website_id)?.join(relative_path(relative)?))
    }

    /// Initialize the data directory
    ///
    /// When the data directory does not exist yet, it is created with one
    /// empty website so that a fresh install is usable right away.
    pub async fn init(&self, default_website_id: &str) -> ConnectorResult<()> {
        if fs::metadata(&self.data_path).await.is_ok() {
            return Ok(());
        }

        let session = serde_json::json!({});
        fs::create_dir_all(self.assets_path(default_website_id)?).await?;

        let meta = WebsiteMetaFileContent {
            name: constants::DEFAULT_WEBSITE_NAME.to_string(),
            image_url: None,
            connector_user_settings: Default::default(),
        };
        self.set_website_meta(&session, default_website_id, &meta)
            .await?;
        self.update_website(&session, default_website_id, &WebsiteData::default())
            .await?;

        tracing::info!(
            "Created default website '{}' in {}",
            default_website_id,
            self.data_path.display()
        );

        Ok(())
    }

    /// Write files into a folder of a website
    ///
    /// Files are written one at a time, in order. A failing file does not stop
    /// the others: it is reported to the status callback and the first error
    /// is returned once every file has been attempted.
    /// Returns the paths of the written files, relative to `folder`.
    pub async fn write(
        &self,
        website_id: &str,
        files: Vec<ConnectorFile>,
        folder: &str,
        status: Option<&StatusCallback>,
    ) -> ConnectorResult<Vec<String>> {
        let website_path = self.website_path(website_id)?;
        let is_dir = fs::metadata(&website_path)
            .await
            .map_err(|e| {
                ConnectorError::from_io(e, || format!("Website '{}' not found", website_id))
            })?
            .is_dir();
        if !is_dir {
            return Err(ConnectorError::NotFound(format!(
                "Website '{}' not found",
                website_id
            )));
        }

        let target_dir = website_path.join(relative_path(folder)?);
        let mut job = FileJob::new(files.iter().map(|file| file.path.clone()), status);
        let mut written = Vec::with_capacity(files.len());
        let mut first_error = None;

        for (index, file) in files.into_iter().enumerate() {
            job.writing(index);
            match write_file(&target_dir, &file.path, file.content).await {
                Ok(path) => {
                    tracing::debug!("Wrote {}", target_dir.join(&path).display());
                    job.success(index);
                    written.push(path);
                }
                Err(e) => {
                    tracing::error!("Error writing {}: {}", file.path, e);
                    job.error(index, &e);
                    first_error.get_or_insert(e);
                }
            }
        }

        job.finish();
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Delete page files which are not part of the website anymore
    async fn remove_stale_pages(
        &self,
        pages_path: &Path,
        page_files: &HashSet<String>,
    ) -> ConnectorResult<()> {
        let mut entries = match fs::read_dir(pages_path).await {
            Ok(entries) => entries,
            // Nothing to clean up before the first page is written
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name.ends_with(PAGE_FILE_EXTENSION)
                && !page_files.contains(&file_name)
                && entry.file_type().await?.is_file()
            {
                tracing::debug!("Removing stale page file {}", entry.path().display());
                fs::remove_file(entry.path()).await?;
            }
        }

        Ok(())
    }
}

impl ConnectorInfo for FsStorage {
    fn connector_id(&self) -> &str {
        "fs-storage"
    }

    fn connector_type(&self) -> ConnectorType {
        ConnectorType::Storage
    }

    fn display_name(&self) -> &str {
        "File system storage"
    }

    fn icon(&self) -> &str {
        FILE_ICON
    }

    fn color(&self) -> &str {
        "#ffffff"
    }

    fn background(&self) -> &str {
        "#006400"
    }

    fn disable_logout(&self) -> bool {
        // FsStorage has no authentication, so hide logout button
        true
    }
}

#[async_trait]
impl StorageConnector for FsStorage {
    // ==================
    // Authentication
    // FsStorage has no authentication - always logged in
    // ==================

    async fn is_logged_in(&self, _session: &ConnectorSession) -> ConnectorResult<bool> {
        Ok(true)
    }

    async fn get_oauth_url(&self, _session: &ConnectorSession) -> ConnectorResult<Option<String>> {
        Ok(None)
    }

    async fn get_login_form(
        &self,
        _session: &ConnectorSession,
        _redirect_to: &str,
    ) -> ConnectorResult<Option<String>> {
        Ok(None)
    }

    async fn get_settings_form(
        &self,
        _session: &ConnectorSession,
        _redirect_to: &str,
    ) -> ConnectorResult<Option<String>> {
        Ok(None)
    }

    async fn set_token(
        &self,
        _session: &mut ConnectorSession,
        _token: &serde_json::Value,
    ) -> ConnectorResult<()> {
        Ok(())
    }

    async fn logout(&self, _session: &mut ConnectorSession) -> ConnectorResult<()> {
        Ok(())
    }

    async fn get_user(&self, session: &ConnectorSession) -> ConnectorResult<ConnectorUser> {
        // The user is whoever runs the server
        Ok(ConnectorUser {
            name: whoami::username(),
            email: None,
            picture: Some(USER_ICON.to_string()),
            storage: to_connector_data(session, self).await?,
        })
    }

    fn get_options(&self, _form_data: &serde_json::Value) -> ConnectorOptions {
        ConnectorOptions::default()
    }

    // ==================
    // Website CRUD
    // ==================

    async fn list_websites(&self, session: &ConnectorSession) -> ConnectorResult<Vec<WebsiteMeta>> {
        let mut websites = Vec::new();

        let mut entries = fs::read_dir(&self.data_path).await.map_err(|e| {
            ConnectorError::from_io(e, || {
                format!("Storage folder '{}' not found", self.data_path.display())
            })
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let website_id = entry.file_name().to_string_lossy().to_string();
            match self.get_website_meta(session, &website_id).await {
                Ok(meta) => websites.push(meta),
                Err(e) => {
                    tracing::warn!("Failed to get metadata for website {}: {}", website_id, e);
                }
            }
        }

        Ok(websites)
    }

    async fn read_website(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteData> {
        let website_path = self.website_path(website_id)?;
        let content = fs::read_to_string(self.website_data_path(website_id)?)
            .await
            .map_err(|e| {
                ConnectorError::from_io(e, || format!("Website '{}' not found", website_id))
            })?;

        website_data::merge(&content, |page_path: String| {
            let path = relative_path(&page_path).map(|relative| website_path.join(relative));
            async move {
                let path = path?;
                fs::read_to_string(&path).await.map_err(|e| {
                    ConnectorError::from_io(e, || {
                        format!("Page file '{}' not found", path.display())
                    })
                })
            }
        })
        .await
    }

    async fn create_website(
        &self,
        session: &ConnectorSession,
        meta: &WebsiteMetaFileContent,
    ) -> ConnectorResult<WebsiteId> {
        let website_id = Uuid::new_v4().to_string();

        fs::create_dir_all(self.assets_path(&website_id)?).await?;
        self.set_website_meta(session, &website_id, meta).await?;
        self.update_website(session, &website_id, &WebsiteData::default())
            .await?;

        tracing::info!("Created website '{}' ({})", meta.name, website_id);
        Ok(website_id)
    }

    async fn update_website(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
        data: &WebsiteData,
    ) -> ConnectorResult<()> {
        let website_path = self.website_path(website_id)?;
        fs::create_dir_all(&website_path).await?;

        let files = website_data::split(data)?;

        let pages_folder = website_data::get_pages_folder(data);
        let pages_path = website_path.join(relative_path(pages_folder)?);
        let pages_prefix = format!("{}/", pages_folder);
        let page_files: HashSet<String> = files
            .iter()
            .filter_map(|file| file.path.strip_prefix(&pages_prefix))
            .map(str::to_string)
            .collect();

        if !page_files.is_empty() {
            fs::create_dir_all(&pages_path).await?;
        }

        // New files are all in place before stale pages go away
        for file in files {
            let content = file.content.as_bytes().ok_or_else(|| {
                ConnectorError::InvalidArgument(format!("Unexpected stream for {}", file.path))
            })?;
            write_replace(&website_path.join(relative_path(&file.path)?), content).await?;
        }

        self.remove_stale_pages(&pages_path, &page_files).await
    }

    async fn delete_website(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<()> {
        let path = self.website_path(website_id)?;

        fs::remove_dir_all(&path).await.map_err(|e| {
            ConnectorError::from_io(e, || format!("Website '{}' not found", website_id))
        })?;

        tracing::info!("Deleted website {}", website_id);
        Ok(())
    }

    async fn duplicate_website(
        &self,
        session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteId> {
        let meta = self.get_website_meta(session, website_id).await?;
        let new_website_id = Uuid::new_v4().to_string();

        copy_dir_recursive(
            self.website_path(website_id)?,
            self.website_path(&new_website_id)?,
        )
        .await?;

        let new_meta = WebsiteMetaFileContent {
            name: format!("{} copy", meta.name),
            ..meta.file_content()
        };
        self.set_website_meta(session, &new_website_id, &new_meta)
            .await?;

        tracing::info!("Duplicated website {} to {}", website_id, new_website_id);
        Ok(new_website_id)
    }

    // ==================
    // Assets
    // ==================

    async fn get_asset(
        &self,
        session: &ConnectorSession,
        website_id: &str,
        path: &str,
    ) -> ConnectorResult<ConnectorFile> {
        let content = self.read_asset(session, website_id, path).await?;
        Ok(ConnectorFile::new(path, content))
    }

    async fn write_assets(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
        files: Vec<ConnectorFile>,
        status: Option<&StatusCallback>,
    ) -> ConnectorResult<Vec<String>> {
        let written = self
            .write(website_id, files, &self.assets_folder, status)
            .await?;

        // Stored form of the asset paths
        Ok(written
            .into_iter()
            .map(|path| format!("/{}/{}", self.assets_folder, path))
            .collect())
    }

    async fn delete_assets(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
        paths: &[String],
    ) -> ConnectorResult<()> {
        for path in paths {
            let file_path = self.asset_file_path(website_id, path)?;
            fs::remove_file(&file_path).await.map_err(|e| {
                ConnectorError::from_io(e, || format!("Asset '{}' not found", path))
            })?;
        }

        Ok(())
    }

    async fn read_asset(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
        file_name: &str,
    ) -> ConnectorResult<Vec<u8>> {
        let path = self.asset_file_path(website_id, file_name)?;

        fs::read(&path).await.map_err(|e| {
            ConnectorError::from_io(e, || format!("Asset '{}' not found", file_name))
        })
    }

    // ==================
    // Metadata
    // ==================

    async fn get_website_meta(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
    ) -> ConnectorResult<WebsiteMeta> {
        let not_found = || format!("Website '{}' not found", website_id);

        // Timestamps come from the website folder
        let metadata = fs::metadata(self.website_path(website_id)?)
            .await
            .map_err(|e| ConnectorError::from_io(e, not_found))?;
        let created_at = metadata.created().ok().map(DateTime::<Utc>::from);
        let updated_at = metadata.modified().ok().map(DateTime::<Utc>::from);

        let content = fs::read_to_string(self.website_meta_path(website_id)?)
            .await
            .map_err(|e| ConnectorError::from_io(e, not_found))?;
        let file_content: WebsiteMetaFileContent = serde_json::from_str(&content)?;

        Ok(WebsiteMeta::from_file_content(
            website_id.to_string(),
            file_content,
            created_at,
            updated_at,
        ))
    }

    async fn set_website_meta(
        &self,
        _session: &ConnectorSession,
        website_id: &str,
        meta: &WebsiteMetaFileContent,
    ) -> ConnectorResult<()> {
        let path = self.website_meta_path(website_id)?;
        let content = website_data::stringify(meta)?;

        fs::write(&path, content).await.map_err(|e| {
            ConnectorError::from_io(e, || format!("Website '{}' not found", website_id))
        })
    }
}

/// Website IDs are folder names
fn check_website_id(website_id: &str) -> ConnectorResult<&str> {
    let website_id = required_param(website_id, "website id")?;
    match Path::new(website_id).components().collect::<Vec<_>>().as_slice() {
        [Component::Normal(_)] if !website_id.contains(['/', '\\']) => Ok(website_id),
        _ => Err(ConnectorError::InvalidArgument(format!(
            "Invalid website id '{}'",
            website_id
        ))),
    }
}

/// Turn a path from the caller into a path which stays inside its folder
///
/// A leading slash is ignored, `..` and `.` are rejected.
fn relative_path(path: &str) -> ConnectorResult<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    let is_plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if relative.as_os_str().is_empty() || !is_plain {
        return Err(ConnectorError::InvalidArgument(format!(
            "Invalid path '{}'",
            path
        )));
    }
    Ok(relative.to_path_buf())
}

/// Write one file of a batch, creating its parent folders
///
/// Streams are copied until EOF and flushed before the file counts as written.
/// Returns the path relative to `target_dir`.
async fn write_file(
    target_dir: &Path,
    path: &str,
    content: ConnectorFileContent,
) -> ConnectorResult<String> {
    let relative = relative_path(path)?;
    let file_path = target_dir.join(&relative);

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    match content {
        ConnectorFileContent::Bytes(bytes) => fs::write(&file_path, bytes).await?,
        ConnectorFileContent::Text(text) => fs::write(&file_path, text).await?,
        ConnectorFileContent::Stream(mut reader) => {
            let mut file = fs::File::create(&file_path).await?;
            tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
        }
    }

    Ok(path.trim_start_matches('/').to_string())
}

/// Replace a file through a temporary file and a rename
async fn write_replace(path: &Path, content: &[u8]) -> ConnectorResult<()> {
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Recursively copy a directory
///
/// Uses Box::pin to handle the recursive async calls.
fn copy_dir_recursive(
    source: PathBuf,
    dest: PathBuf,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ConnectorResult<()>> + Send>> {
    Box::pin(async move {
        fs::create_dir_all(&dest).await?;

        let mut entries = fs::read_dir(&source).await?;

        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            let dest_path = dest.join(entry.file_name());

            if entry.file_type().await?.is_dir() {
                copy_dir_recursive(entry_path, dest_path).await?;
            } else {
                fs::copy(&entry_path, &dest_path).await?;
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn fs_storage_is_send_sync() {
        assert_send_sync::<FsStorage>();
    }

    #[test]
    fn website_ids_must_be_folder_names() {
        assert!(check_website_id("default").is_ok());
        assert!(check_website_id("0f8fad5b-d9cb-469f-a165-70867728950e").is_ok());
        for id in ["", " ", "..", ".", "a/b", "/etc", "a\\b"] {
            assert!(check_website_id(id).is_err(), "{:?}", id);
        }
    }

    #[test]
    fn relative_paths_stay_inside() {
        assert_eq!(relative_path("/img/a.png").unwrap(), PathBuf::from("img/a.png"));
        assert_eq!(relative_path("a.png").unwrap(), PathBuf::from("a.png"));
        for path in ["", "/", "../a.png", "img/../../a.png", "./a.png"] {
            assert!(relative_path(path).is_err(), "{:?}", path);
        }
    }

    #[tokio::test]
    async fn write_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("website.json");
        write_replace(&path, b"one").await.unwrap();
        write_replace(&path, b"two").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn write_file_consumes_streams() {
        let dir = tempfile::tempdir().unwrap();
        let reader = tokio_test::io::Builder::new()
            .read(b"hello ")
            .read(b"world")
            .build();
        let path = write_file(dir.path(), "/sub/greeting.txt", ConnectorFileContent::stream(reader))
            .await
            .unwrap();

        assert_eq!(path, "sub/greeting.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("sub/greeting.txt")).unwrap(),
            "hello world"
        );
    }
}
