//! Navigator configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::NavError;
use crate::overlay::DEFAULT_MARKER_ZOOM;

pub const DEFAULT_BASE_URL: &str = "https://scriptures.byu.edu/";
pub const DEFAULT_BOOKS_PATH: &str = "mapscrip/model/books.php";
pub const DEFAULT_VOLUMES_PATH: &str = "mapscrip/model/volumes.php";
pub const DEFAULT_SCRIPTURES_PATH: &str = "mapscrip/mapgetscrip.php";
pub const DEFAULT_TOP_LEVEL_TITLE: &str = "The Scriptures";

const MIN_TIMEOUT_MS: u64 = 250;
const MAX_TIMEOUT_MS: u64 = 120_000;
const MAX_ZOOM: u8 = 20;
const MAX_CACHE_CAPACITY: usize = 4096;

/// Endpoint, transport and presentation settings.
///
/// Every field has a default, so config files only need the keys they
/// change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub base_url: String,
    pub books_path: String,
    pub volumes_path: String,
    pub scriptures_path: String,
    pub http_timeout_ms: u64,
    pub user_agent: String,
    pub marker_zoom: u8,
    /// Fetched chapters kept in memory; `0` disables the cache.
    pub chapter_cache_capacity: usize,
    pub top_level_title: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            books_path: DEFAULT_BOOKS_PATH.to_string(),
            volumes_path: DEFAULT_VOLUMES_PATH.to_string(),
            scriptures_path: DEFAULT_SCRIPTURES_PATH.to_string(),
            http_timeout_ms: 10_000,
            user_agent: concat!("scripture-nav/", env!("CARGO_PKG_VERSION")).to_string(),
            marker_zoom: DEFAULT_MARKER_ZOOM,
            chapter_cache_capacity: 32,
            top_level_title: DEFAULT_TOP_LEVEL_TITLE.to_string(),
        }
    }
}

impl NavConfig {
    /// Clamp numeric settings into supported ranges and repair empty strings.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        for (value, fallback) in [
            (&mut self.books_path, defaults.books_path),
            (&mut self.volumes_path, defaults.volumes_path),
            (&mut self.scriptures_path, defaults.scriptures_path),
            (&mut self.top_level_title, defaults.top_level_title),
            (&mut self.user_agent, defaults.user_agent),
        ] {
            if value.trim().is_empty() {
                *value = fallback;
            }
        }
        self.http_timeout_ms = self.http_timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        self.marker_zoom = self.marker_zoom.clamp(1, MAX_ZOOM);
        self.chapter_cache_capacity = self.chapter_cache_capacity.min(MAX_CACHE_CAPACITY);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, NavError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| NavError::Config(format!("invalid config json: {}", e)))?;
        Ok(cfg.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn books_url(&self) -> String {
        self.endpoint(&self.books_path)
    }

    pub fn volumes_url(&self) -> String {
        self.endpoint(&self.volumes_path)
    }

    /// Chapter text URL.
    ///
    /// `verses` (e.g. `"3-5"`) is form-encoded into the query; `jst`
    /// requests the Joseph Smith Translation text.
    pub fn chapter_url(&self, book_id: u32, chapter: u32, verses: Option<&str>, jst: bool) -> String {
        let mut url = format!(
            "{}?book={}&chap={}&verses={}",
            self.endpoint(&self.scriptures_path),
            book_id,
            chapter,
            form_urlencoded::byte_serialize(verses.unwrap_or_default().as_bytes())
                .collect::<String>()
        );
        if jst {
            url.push_str("&jst=JST");
        }
        url
    }
}
