/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Asset URL translation
//!
//! Asset URLs are stored in their "stored" form: `/assets/image.webp`.
//! The editor works with the "displayed" form, which goes through the asset
//! API and carries the website and connector:
//! `/api/website/assets/image.webp?websiteId=47868975&connectorId=gitlab`.
//!
//! Website data is converted to the displayed form after loading and back to
//! the stored form before saving. Translation never fails: values which are
//! not recognized are logged and returned unchanged.

use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::error::{ConnectorError, ConnectorResult};
use crate::models::constants::{API_PATH, API_WEBSITE_ASSET_READ, API_WEBSITE_PATH};
use crate::models::{Asset, Style, WebsiteData};

const WEBSITE_ID_PARAM: &str = "websiteId";
const CONNECTOR_ID_PARAM: &str = "connectorId";

/// The only style property which may hold asset URLs
const BACKGROUND_IMAGE: &str = "background-image";

/// What an asset reference looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPathKind {
    /// `/assets/...`
    Stored,
    /// `<base>/api/website/assets/...?websiteId=..&connectorId=..`
    Displayed,
    /// Inline SVG markup or data URL
    Inline,
    /// Anything else (external URL, typo...)
    Unrecognized,
}

/// Which way to translate asset references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlDirection<'a> {
    ToDisplayed {
        website_id: &'a str,
        connector_id: Option<&'a str>,
    },
    ToStored,
}

/// Translates asset references between stored and displayed forms
///
/// The serving root is given at construction so the translation does not
/// depend on where the process runs.
#[derive(Debug, Clone)]
pub struct AssetUrlTranslator {
    /// Scheme, host and port where the editor is served, used to parse paths
    origin: Url,

    /// Path where the editor is served, without trailing slash ("" at the root)
    base_path: String,

    /// Stored form prefix, e.g. "/assets"
    assets_prefix: String,

    /// Displayed form prefix, e.g. "/api/website/assets"
    api_asset_path: String,
}

impl AssetUrlTranslator {
    /// Create a translator
    ///
    /// # Arguments
    /// * `base_url` - URL where the editor is served, e.g. `http://localhost:6805/`
    /// * `assets_folder` - Name of the assets folder within each website
    pub fn new(base_url: &str, assets_folder: &str) -> ConnectorResult<Self> {
        let url = Url::parse(base_url).map_err(|e| {
            ConnectorError::InvalidArgument(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(ConnectorError::InvalidArgument(format!(
                "Base URL '{}' cannot hold paths",
                base_url
            )));
        }

        let base_path = url.path().trim_end_matches('/').to_string();
        let mut origin = url;
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        let assets_folder = assets_folder.trim_matches('/');
        if assets_folder.is_empty() {
            return Err(ConnectorError::InvalidArgument(
                "Missing assets folder".to_string(),
            ));
        }

        Ok(AssetUrlTranslator {
            origin,
            api_asset_path: format!(
                "{}{}{}{}",
                base_path, API_PATH, API_WEBSITE_PATH, API_WEBSITE_ASSET_READ
            ),
            base_path,
            assets_prefix: format!("/{}", assets_folder),
        })
    }

    /// Path where the editor is served
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Classify an asset reference
    pub fn classify(&self, path: &str) -> AssetPathKind {
        if is_under(path, &self.api_asset_path) {
            AssetPathKind::Displayed
        } else if is_under(path, &self.assets_prefix) {
            AssetPathKind::Stored
        } else if is_inline(path) {
            AssetPathKind::Inline
        } else {
            AssetPathKind::Unrecognized
        }
    }

    /// Convert a stored path to the displayed form
    ///
    /// `/assets/image.webp` becomes
    /// `/api/website/assets/image.webp?websiteId=<id>&connectorId=<id>`.
    /// Other values are returned unchanged.
    pub fn stored_to_displayed(
        &self,
        path: &str,
        website_id: &str,
        connector_id: Option<&str>,
    ) -> String {
        match self.classify(path) {
            AssetPathKind::Stored => self
                .try_stored_to_displayed(path, website_id, connector_id)
                .unwrap_or_else(|e| pass_through("stored_to_displayed", path, e)),
            AssetPathKind::Inline => path.to_string(),
            AssetPathKind::Displayed => {
                tracing::debug!("Asset path is already displayed: {}", path);
                path.to_string()
            }
            AssetPathKind::Unrecognized => pass_through(
                "stored_to_displayed",
                path,
                ConnectorError::UnrecognizedPath(path.to_string()),
            ),
        }
    }

    /// Convert a displayed path back to the stored form
    ///
    /// `/api/website/assets/image.webp?websiteId=1&connectorId=gitlab` becomes
    /// `/assets/image.webp`. Other values are returned unchanged.
    pub fn displayed_to_stored(&self, path: &str) -> String {
        match self.classify(path) {
            AssetPathKind::Displayed => self
                .try_displayed_to_stored(path)
                .unwrap_or_else(|e| pass_through("displayed_to_stored", path, e)),
            AssetPathKind::Inline => path.to_string(),
            AssetPathKind::Stored => {
                tracing::debug!("Asset path is already stored: {}", path);
                path.to_string()
            }
            AssetPathKind::Unrecognized => pass_through(
                "displayed_to_stored",
                path,
                ConnectorError::UnrecognizedPath(path.to_string()),
            ),
        }
    }

    fn try_stored_to_displayed(
        &self,
        path: &str,
        website_id: &str,
        connector_id: Option<&str>,
    ) -> ConnectorResult<String> {
        let url = self.parse(path)?;
        let relative = url
            .path()
            .strip_prefix(self.assets_prefix.as_str())
            .ok_or_else(|| ConnectorError::UnrecognizedPath(path.to_string()))?;

        let mut params = foreign_params(url.query());
        params.push(format!("{}={}", WEBSITE_ID_PARAM, encode_param(website_id)));
        params.push(format!(
            "{}={}",
            CONNECTOR_ID_PARAM,
            encode_param(connector_id.unwrap_or(""))
        ));

        let displayed_path = decode(&format!("{}{}", self.api_asset_path, relative));
        Ok(format!("{}?{}", displayed_path, params.join("&")))
    }

    fn try_displayed_to_stored(&self, path: &str) -> ConnectorResult<String> {
        let url = self.parse(path)?;
        let relative = url
            .path()
            .strip_prefix(self.api_asset_path.as_str())
            .ok_or_else(|| ConnectorError::UnrecognizedPath(path.to_string()))?;

        // Only the path is decoded, other parameters keep their encoding
        let mut stored = decode(&format!("{}{}", self.assets_prefix, relative));
        let params = foreign_params(url.query());
        if !params.is_empty() {
            stored.push('?');
            stored.push_str(&params.join("&"));
        }
        Ok(stored)
    }

    /// Resolve a root-relative path against the serving origin
    fn parse(&self, path: &str) -> ConnectorResult<Url> {
        self.origin
            .join(path)
            .map_err(|_| ConnectorError::UnrecognizedPath(path.to_string()))
    }

    /// Translate a single reference in the given direction
    pub fn translate(&self, path: &str, direction: UrlDirection<'_>) -> String {
        match direction {
            UrlDirection::ToDisplayed {
                website_id,
                connector_id,
            } => self.stored_to_displayed(path, website_id, connector_id),
            UrlDirection::ToStored => self.displayed_to_stored(path),
        }
    }

    /// Translate the `src` of every asset, assets without `src` are kept as is
    pub fn rewrite_asset_references(
        &self,
        assets: Vec<Asset>,
        direction: UrlDirection<'_>,
    ) -> Vec<Asset> {
        assets
            .into_iter()
            .map(|mut asset| {
                if let Some(src) = asset.src.as_deref() {
                    asset.src = Some(self.translate(src, direction));
                }
                asset
            })
            .collect()
    }

    /// Translate the `url(...)` references of every style's background image
    ///
    /// The value may hold gradients and several URLs, e.g.
    /// `linear-gradient(#0ca311 0%, #0ca311 100%), url('/assets/qIg7JPRc.webp')`.
    /// Only the content of the `url(...)` tokens changes.
    pub fn rewrite_style_urls(&self, styles: Vec<Style>, direction: UrlDirection<'_>) -> Vec<Style> {
        styles
            .into_iter()
            .map(|mut style| {
                if let Some(Value::String(background)) = style
                    .style
                    .as_mut()
                    .and_then(|properties| properties.get_mut(BACKGROUND_IMAGE))
                {
                    let rewritten =
                        rewrite_css_urls(background, |url| self.translate(url, direction));
                    *background = rewritten;
                }
                style
            })
            .collect()
    }

    /// Convert loaded website data to the form used while editing
    pub fn to_displayed(
        &self,
        mut data: WebsiteData,
        website_id: &str,
        connector_id: Option<&str>,
    ) -> WebsiteData {
        let direction = UrlDirection::ToDisplayed {
            website_id,
            connector_id,
        };
        data.assets = self.rewrite_asset_references(std::mem::take(&mut data.assets), direction);
        data.styles = self.rewrite_style_urls(std::mem::take(&mut data.styles), direction);
        data
    }

    /// Convert edited website data to the form which is saved
    pub fn to_stored(&self, mut data: WebsiteData) -> WebsiteData {
        data.assets =
            self.rewrite_asset_references(std::mem::take(&mut data.assets), UrlDirection::ToStored);
        data.styles =
            self.rewrite_style_urls(std::mem::take(&mut data.styles), UrlDirection::ToStored);
        data
    }
}

/// True when `path` is `prefix` or a sub path / query of it
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Inline SVG or data URL
fn is_inline(path: &str) -> bool {
    path.starts_with("<svg") || path.starts_with("data:image")
}

fn pass_through(context: &str, path: &str, error: ConnectorError) -> String {
    tracing::warn!("{}: {}, value left unchanged", context, error);
    path.to_string()
}

/// Raw query parameters other than websiteId and connectorId, in order
fn foreign_params(query: Option<&str>) -> Vec<String> {
    query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            let key = decode(key);
            key != WEBSITE_ID_PARAM && key != CONNECTOR_ID_PARAM
        })
        .map(str::to_string)
        .collect()
}

fn encode_param(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Apply `rewrite` to the inner value of each `url(...)` token
///
/// Quotes around the value are kept. Tokens which are not well formed are
/// copied as is.
fn rewrite_css_urls(value: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("url(") {
        out.push_str(&rest[..start]);
        let args = &rest[start + "url(".len()..];

        match parse_url_token(args) {
            Some(token) => {
                out.push_str("url(");
                out.push_str(token.quote);
                out.push_str(&rewrite(token.inner));
                out.push_str(token.quote);
                out.push(')');
                rest = &args[token.len..];
            }
            None => {
                out.push_str("url(");
                rest = args;
            }
        }
    }

    out.push_str(rest);
    out
}

struct UrlToken<'a> {
    /// `'`, `"` or empty
    quote: &'a str,
    inner: &'a str,
    /// Bytes consumed after `url(`, closing parenthesis included
    len: usize,
}

/// Parse what follows `url(`
fn parse_url_token(args: &str) -> Option<UrlToken<'_>> {
    let quote = match args.chars().next()? {
        '\'' => "'",
        '"' => "\"",
        _ => "",
    };
    let body = &args[quote.len()..];

    // Quoted values end at the quote, bare ones at the parenthesis
    let end = if quote.is_empty() {
        body.find(|c: char| c == '\'' || c == '"' || c == ')')?
    } else {
        body.find(|c: char| c == '\'' || c == '"')?
    };
    let inner = &body[..end];
    if inner.is_empty() {
        return None;
    }

    let closing = &body[end..];
    if !closing.starts_with(quote) || !closing[quote.len()..].starts_with(')') {
        return None;
    }

    Some(UrlToken {
        quote,
        inner,
        len: quote.len() + end + quote.len() + 1,
    })
}
