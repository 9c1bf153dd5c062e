/*
 * Silex website builder, free/libre no-code tool for makers.
 * Copyright (c) 2023 lexoyo and Silex Labs foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or any later version.
 */

//! Storage services
//!
//! Codecs and helpers shared by all connectors.

pub mod asset_url;
mod jobs;
pub mod website_data;

pub use asset_url::{AssetPathKind, AssetUrlTranslator, UrlDirection};
pub use jobs::{FileJob, JobManager};
