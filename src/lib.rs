//! Hash-routed scriptures navigator.
//!
//! Loads the volume/book catalog from the scriptures API, resolves URL hash
//! fragments to views, renders them as HTML fragments, fetches chapter text on
//! demand, and plots the geotags embedded in chapter HTML on a map surface.
//!
//! ```rust,no_run
//! use scripture_nav::{MockTransport, NavConfig, Navigator, RecordingMap};
//!
//! # fn example() -> Result<(), scripture_nav::NavError> {
//! let config = NavConfig::default();
//! let transport = MockTransport::new()
//!     .with_body(config.volumes_url(), "[]")
//!     .with_body(config.books_url(), "{}");
//! let mut navigator = Navigator::init(transport, config)?;
//! let mut map = RecordingMap::default();
//! let page = navigator.on_hash_changed("#1:101:1", &mut map);
//! println!("{}", page.breadcrumbs);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod html;
pub mod loader;
pub mod marker;
pub mod navigator;
pub mod overlay;
pub mod route;
pub mod sequence;
pub mod view;

pub use cache::{ChapterCacheStore, ChapterKey, MemoryChapterCache, NoChapterCache};
pub use catalog::{Book, Catalog, Volume};
pub use config::NavConfig;
pub use error::NavError;
#[cfg(feature = "http")]
pub use fetch::HttpTransport;
pub use fetch::{MockTransport, Transport};
pub use loader::load_catalog;
pub use marker::{parse_show_location, scan_geotags, GeoTag, GeoView};
pub use navigator::{catalog_unavailable_page, Navigator, Page};
pub use overlay::{GeoBounds, LatLng, MapCall, MapMarker, MapSurface, MarkerOverlay, RecordingMap};
pub use route::{route, NavigationIntent};
pub use sequence::{next_chapter, previous_chapter, ChapterLink};
