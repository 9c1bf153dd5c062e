/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Website data serialization
//!
//! Website data is stored as several files:
//! - website.json with settings, assets, styles and references to the pages
//! - one `<pagesFolder>/<pageId>.json` file per page
//!
//! This module has no storage dependency: `merge` receives a page loader so
//! that every connector can fetch page files its own way.

use std::collections::HashSet;
use std::future::Future;

use serde_json::Value;

use crate::error::{ConnectorError, ConnectorResult};
use crate::models::{constants, ConnectorFile, WebsiteData};

/// Extension of page files, also used to spot stale pages
pub const PAGE_FILE_EXTENSION: &str = ".json";

/// Serialize data to pretty JSON with sorted keys for stable output
///
/// serde_json maps are ordered, so going through `Value` sorts every object.
pub fn stringify<T: serde::Serialize>(data: &T) -> ConnectorResult<String> {
    let value = serde_json::to_value(data)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Folder where page files are stored, relative to the website root
pub fn get_pages_folder(data: &WebsiteData) -> &str {
    if data.pages_folder.is_empty() {
        constants::LEGACY_WEBSITE_PAGES_FOLDER
    } else {
        &data.pages_folder
    }
}

/// Path of a page file, relative to the website root
pub fn page_file_path(pages_folder: &str, page_id: &str) -> String {
    format!("{}/{}{}", pages_folder, page_id, PAGE_FILE_EXTENSION)
}

/// Split website data into separate files
///
/// Page files come first and website.json last.
/// Pages without an id are kept inline in website.json.
pub fn split(data: &WebsiteData) -> ConnectorResult<Vec<ConnectorFile>> {
    let pages_folder = check_pages_folder(get_pages_folder(data))?;
    let mut files = Vec::new();
    let mut page_refs = Vec::with_capacity(data.pages.len());
    let mut page_ids = HashSet::new();

    for page in &data.pages {
        let page_id = match page.get("id").and_then(Value::as_str) {
            Some(id) => check_page_id(id)?,
            None => {
                page_refs.push(page.clone());
                continue;
            }
        };
        if !page_ids.insert(page_id) {
            return Err(ConnectorError::InvalidArgument(format!(
                "Duplicate page id '{}'",
                page_id
            )));
        }

        files.push(ConnectorFile::new(
            page_file_path(pages_folder, page_id),
            stringify(page)?,
        ));

        let mut page_ref = serde_json::json!({
            "id": page_id,
            "isFile": true,
        });
        if let Some(name) = page.get("name") {
            page_ref["name"] = name.clone();
        }
        page_refs.push(page_ref);
    }

    let main = WebsiteData {
        pages: page_refs,
        pages_folder: pages_folder.to_string(),
        ..data.clone()
    };
    files.push(ConnectorFile::new(
        constants::WEBSITE_DATA_FILE,
        stringify(&main)?,
    ));

    Ok(files)
}

/// Rebuild website data from website.json and the page files it references
///
/// `page_loader` receives the page path relative to the website root.
/// Pages which are not file references (older format) are kept as is.
pub async fn merge<F, Fut>(website_content: &str, mut page_loader: F) -> ConnectorResult<WebsiteData>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ConnectorResult<String>>,
{
    let mut parsed: Value = serde_json::from_str(website_content)?;
    if !parsed.is_object() {
        return Err(ConnectorError::InvalidArgument(
            "Website data is not a JSON object".to_string(),
        ));
    }

    let pages_folder = parsed
        .get("pagesFolder")
        .and_then(Value::as_str)
        .filter(|folder| !folder.is_empty())
        .unwrap_or(constants::LEGACY_WEBSITE_PAGES_FOLDER)
        .to_string();
    check_pages_folder(&pages_folder)?;

    let page_refs = match parsed.get_mut("pages").map(Value::take) {
        Some(Value::Array(pages)) => pages,
        _ => Vec::new(),
    };

    let mut pages = Vec::with_capacity(page_refs.len());
    for page_ref in page_refs {
        let is_file = page_ref
            .get("isFile")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !is_file {
            pages.push(page_ref);
            continue;
        }

        let page_id = page_ref
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ConnectorError::InvalidArgument("Page reference without id".to_string()))?;
        let page_path = page_file_path(&pages_folder, check_page_id(page_id)?);

        tracing::debug!("Loading page file {}", page_path);
        let content = page_loader(page_path).await?;
        pages.push(serde_json::from_str(&content)?);
    }

    parsed["pages"] = Value::Array(pages);
    parsed["pagesFolder"] = Value::String(pages_folder);

    Ok(serde_json::from_value(parsed)?)
}

/// The pages folder is a plain relative path inside the website
fn check_pages_folder(pages_folder: &str) -> ConnectorResult<&str> {
    let is_plain = !pages_folder.starts_with('/')
        && !pages_folder.contains('\\')
        && pages_folder
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if !is_plain {
        return Err(ConnectorError::InvalidArgument(format!(
            "Invalid pages folder '{}'",
            pages_folder
        )));
    }
    Ok(pages_folder)
}

/// Page ids become file names, they cannot hold paths
fn check_page_id(page_id: &str) -> ConnectorResult<&str> {
    if page_id.is_empty()
        || page_id == "."
        || page_id == ".."
        || page_id.contains(['/', '\\'])
    {
        return Err(ConnectorError::InvalidArgument(format!(
            "Invalid page id '{}'",
            page_id
        )));
    }
    Ok(page_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, Style};
    use serde_json::json;
    use std::collections::HashMap;

    fn sample_website() -> WebsiteData {
        WebsiteData {
            pages: vec![
                json!({ "id": "home-1", "name": "Home", "frames": [{ "component": { "type": "wrapper" } }] }),
                json!({ "id": "about-2", "name": "About us", "frames": [] }),
            ],
            assets: vec![Asset {
                src: Some("/assets/logo.png".to_string()),
                extra: serde_json::Map::from_iter([("type".to_string(), json!("image"))]),
            }],
            styles: vec![Style {
                style: Some(serde_json::Map::from_iter([(
                    "background-image".to_string(),
                    json!("url('/assets/bg.png')"),
                )])),
                extra: serde_json::Map::from_iter([("selectors".to_string(), json!(["#a"]))]),
            }],
            settings: json!({ "title": "My site", "lang": "en" }),
            ..WebsiteData::default()
        }
    }

    fn files_by_path(files: Vec<ConnectorFile>) -> HashMap<String, String> {
        files
            .into_iter()
            .map(|file| {
                let content = String::from_utf8(file.content.as_bytes().unwrap().to_vec()).unwrap();
                (file.path, content)
            })
            .collect()
    }

    async fn merge_files(files: &HashMap<String, String>) -> ConnectorResult<WebsiteData> {
        merge(&files[constants::WEBSITE_DATA_FILE], |path| {
            let content = files
                .get(&path)
                .cloned()
                .ok_or_else(|| ConnectorError::NotFound(path));
            async move { content }
        })
        .await
    }

    #[test]
    fn split_writes_one_file_per_page() {
        let files = split(&sample_website()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["pages/home-1.json", "pages/about-2.json", "website.json"]);

        let files = files_by_path(files);
        let main: Value = serde_json::from_str(&files["website.json"]).unwrap();
        assert_eq!(main["pagesFolder"], json!("pages"));
        assert_eq!(
            main["pages"],
            json!([
                { "id": "home-1", "name": "Home", "isFile": true },
                { "id": "about-2", "name": "About us", "isFile": true },
            ])
        );
        assert_eq!(main["settings"]["title"], json!("My site"));

        let page: Value = serde_json::from_str(&files["pages/about-2.json"]).unwrap();
        assert_eq!(page["name"], json!("About us"));
    }

    #[test]
    fn split_uses_declared_pages_folder() {
        let data = WebsiteData {
            pages_folder: "content/pages".to_string(),
            ..sample_website()
        };
        let files = split(&data).unwrap();
        assert_eq!(files[0].path, "content/pages/home-1.json");
        assert_eq!(get_pages_folder(&data), "content/pages");
    }

    #[test]
    fn empty_pages_folder_falls_back_to_legacy() {
        let data = WebsiteData {
            pages_folder: String::new(),
            ..sample_website()
        };
        assert_eq!(get_pages_folder(&data), "src");
        assert_eq!(split(&data).unwrap()[0].path, "src/home-1.json");
    }

    #[test]
    fn split_rejects_page_ids_with_paths() {
        for id in ["../escape", "a/b", "..", ""] {
            let data = WebsiteData {
                pages: vec![json!({ "id": id })],
                ..WebsiteData::default()
            };
            assert!(matches!(split(&data), Err(ConnectorError::InvalidArgument(_))), "{}", id);
        }
    }

    #[test]
    fn split_rejects_duplicate_page_ids() {
        let data = WebsiteData {
            pages: vec![json!({ "id": "p", "name": "One" }), json!({ "id": "p", "name": "Two" })],
            ..WebsiteData::default()
        };
        let err = split(&data).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidArgument(_)), "{}", err);
    }

    #[test]
    fn split_rejects_pages_folder_outside_website() {
        for folder in ["/tmp/pages", "../pages", "content/../../x", "a//b", "pages/", "a\\b"] {
            let data = WebsiteData {
                pages_folder: folder.to_string(),
                ..sample_website()
            };
            assert!(matches!(split(&data), Err(ConnectorError::InvalidArgument(_))), "{}", folder);
        }
    }

    #[tokio::test]
    async fn merge_rejects_absolute_pages_folder() {
        let content = json!({
            "pages": [{ "id": "p1", "isFile": true }],
            "pagesFolder": "/etc",
        })
        .to_string();
        let err = merge(&content, |path: String| async move {
            Err(ConnectorError::NotFound(path))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidArgument(_)), "{}", err);
    }

    #[test]
    fn stringify_sorts_keys() {
        let json = stringify(&json!({ "b": 1, "a": { "d": 2, "c": 3 } })).unwrap();
        let a = json.find("\"a\"").unwrap();
        let b = json.find("\"b\"").unwrap();
        let c = json.find("\"c\"").unwrap();
        let d = json.find("\"d\"").unwrap();
        assert!(a < b && c < d);
    }

    #[tokio::test]
    async fn merge_of_split_is_lossless() {
        let data = sample_website();
        let files = files_by_path(split(&data).unwrap());
        assert_eq!(merge_files(&files).await.unwrap(), data);
    }

    #[tokio::test]
    async fn empty_website_round_trip() {
        let data = WebsiteData::default();
        let files = split(&data).unwrap();
        assert_eq!(files.len(), 1, "the empty page has no id and stays inline");
        let files = files_by_path(files);
        assert_eq!(merge_files(&files).await.unwrap(), data);
    }

    #[tokio::test]
    async fn merge_keeps_inline_pages() {
        let content = json!({
            "pages": [{ "id": "p1", "name": "Inline", "frames": [] }],
            "pagesFolder": "pages",
        })
        .to_string();
        let data = merge(&content, |path: String| async move {
            Err(ConnectorError::NotFound(path))
        })
        .await
        .unwrap();
        assert_eq!(data.pages[0]["name"], json!("Inline"));
    }

    #[tokio::test]
    async fn merge_reads_legacy_folder_when_undeclared() {
        let content = json!({ "pages": [{ "id": "p1", "isFile": true }] }).to_string();
        let requested = std::sync::Mutex::new(Vec::new());
        let data = merge(&content, |path: String| {
            requested.lock().unwrap().push(path);
            async { Ok(json!({ "id": "p1", "name": "Loaded" }).to_string()) }
        })
        .await
        .unwrap();
        assert_eq!(*requested.lock().unwrap(), vec!["src/p1.json".to_string()]);
        assert_eq!(data.pages_folder, "src");
        assert_eq!(data.pages[0]["name"], json!("Loaded"));
    }

    #[tokio::test]
    async fn merge_surfaces_missing_page() {
        let data = sample_website();
        let mut files = files_by_path(split(&data).unwrap());
        files.remove("pages/home-1.json");
        let err = merge_files(&files).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
