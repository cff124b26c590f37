//! Navigation context: owns the loaded catalog and turns hash changes into
//! rendered pages and map updates.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{ChapterCacheStore, ChapterKey, MemoryChapterCache};
use crate::catalog::Catalog;
use crate::config::NavConfig;
use crate::error::NavError;
use crate::fetch::Transport;
use crate::loader::load_catalog;
use crate::marker::parse_show_location;
use crate::overlay::{MapSurface, MarkerOverlay};
use crate::route::{route, NavigationIntent};
use crate::view::{
    append_to_class_divs, breadcrumbs, chapters_grid, next_prev_block, volumes_grid,
    CLASS_NAV_HEADING,
};

pub const TEXT_CATALOG_UNAVAILABLE: &str = "Unable to load the scriptures catalog.";
pub const TEXT_CHAPTER_UNAVAILABLE: &str = "Unable to retrieve chapter contents.";

/// Rendered result of one navigation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Contents of the scriptures pane.
    pub scriptures: String,
    /// Breadcrumb list markup.
    pub breadcrumbs: String,
    /// Intent the page was rendered for.
    pub intent: NavigationIntent,
    /// Chapter title when a chapter was shown.
    pub title: Option<String>,
}

/// Page shown when the catalog could not be loaded.
pub fn catalog_unavailable_page(config: &NavConfig) -> Page {
    Page {
        scriptures: TEXT_CATALOG_UNAVAILABLE.to_string(),
        breadcrumbs: breadcrumbs(&config.top_level_title, None, None, None),
        intent: NavigationIntent::HOME,
        title: None,
    }
}

/// Session state for one reader.
pub struct Navigator<T, C = MemoryChapterCache> {
    catalog: Catalog,
    transport: T,
    cache: C,
    config: NavConfig,
    overlay: MarkerOverlay,
    requested: Option<ChapterKey>,
}

impl<T: Transport> Navigator<T> {
    /// Load the catalog through `transport` and start a session with an
    /// in-memory chapter cache.
    pub fn init(transport: T, config: NavConfig) -> Result<Self, NavError> {
        let config = config.normalized();
        let catalog = load_catalog(&transport, &config)?;
        let cache = MemoryChapterCache::new(config.chapter_cache_capacity);
        Ok(Self::with_parts(catalog, transport, cache, config))
    }
}

impl<T: Transport, C: ChapterCacheStore> Navigator<T, C> {
    /// Build a session around an already loaded catalog.
    pub fn with_parts(catalog: Catalog, transport: T, cache: C, config: NavConfig) -> Self {
        let config = config.normalized();
        Self {
            overlay: MarkerOverlay::new(config.marker_zoom),
            catalog,
            transport,
            cache,
            config,
            requested: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn overlay(&self) -> &MarkerOverlay {
        &self.overlay
    }

    /// Chapter most recently requested, whether or not the fetch succeeded.
    pub fn requested_chapter(&self) -> Option<ChapterKey> {
        self.requested
    }

    /// Route `hash` and render the resulting page.
    pub fn on_hash_changed<M: MapSurface + ?Sized>(&mut self, hash: &str, map: &mut M) -> Page {
        let intent = route(hash, &self.catalog);
        log::debug!("hash {:?} -> {:?}", hash, intent);
        self.navigate(intent, map)
    }

    /// Render `intent`. Intents naming unknown books render home.
    pub fn navigate<M: MapSurface + ?Sized>(
        &mut self,
        intent: NavigationIntent,
        map: &mut M,
    ) -> Page {
        match intent {
            NavigationIntent::Home { volume_id } => self.navigate_home(volume_id),
            NavigationIntent::Book { book_id } => self.navigate_book(book_id, map),
            NavigationIntent::Chapter { book_id, chapter } => {
                self.navigate_chapter(ChapterKey::new(book_id, chapter), map)
            }
        }
    }

    fn navigate_home(&self, volume_id: Option<u32>) -> Page {
        let volume_id = volume_id.filter(|id| self.catalog.volume(*id).is_some());
        Page {
            scriptures: volumes_grid(&self.catalog, volume_id),
            breadcrumbs: breadcrumbs(
                &self.config.top_level_title,
                volume_id.and_then(|id| self.catalog.volume(id)),
                None,
                None,
            ),
            intent: NavigationIntent::Home { volume_id },
            title: None,
        }
    }

    fn navigate_book<M: MapSurface + ?Sized>(&mut self, book_id: u32, map: &mut M) -> Page {
        let Some(book) = self.catalog.book(book_id) else {
            return self.navigate_home(None);
        };
        if book.num_chapters <= 1 {
            let key = ChapterKey::new(book_id, book.num_chapters);
            return self.navigate_chapter(key, map);
        }
        Page {
            scriptures: chapters_grid(book),
            breadcrumbs: breadcrumbs(
                &self.config.top_level_title,
                self.catalog.volume_for_book(book),
                Some(book),
                None,
            ),
            intent: NavigationIntent::Book { book_id },
            title: None,
        }
    }

    fn fetch_chapter(&self, key: ChapterKey) -> Result<Arc<str>, NavError> {
        if let Some(html) = self.cache.load(key) {
            log::debug!("chapter {}:{} served from cache", key.book_id, key.chapter);
            return Ok(html);
        }
        let url = self
            .config
            .chapter_url(key.book_id, key.chapter, None, false);
        let html: Arc<str> = Arc::from(self.transport.get_text(&url)?);
        self.cache.store(key, Arc::clone(&html));
        Ok(html)
    }

    /// Raw chapter text, optionally limited to `verses` or switched to the
    /// JST variant. Only the plain chapter goes through the cache.
    pub fn chapter_text(
        &self,
        key: ChapterKey,
        verses: Option<&str>,
        jst: bool,
    ) -> Result<String, NavError> {
        if verses.is_none() && !jst {
            return self.fetch_chapter(key).map(|html| html.to_string());
        }
        let url = self
            .config
            .chapter_url(key.book_id, key.chapter, verses, jst);
        self.transport.get_text(&url)
    }

    fn navigate_chapter<M: MapSurface + ?Sized>(&mut self, key: ChapterKey, map: &mut M) -> Page {
        if !self.catalog.book_chapter_valid(key.book_id, key.chapter) {
            return self.navigate_home(None);
        }
        self.requested = Some(key);
        let intent = NavigationIntent::Chapter {
            book_id: key.book_id,
            chapter: key.chapter,
        };

        let html = match self.fetch_chapter(key) {
            Ok(html) => html,
            Err(err) => {
                log::warn!(
                    "chapter {}:{} fetch failed: {}",
                    key.book_id,
                    key.chapter,
                    err
                );
                return Page {
                    scriptures: TEXT_CHAPTER_UNAVAILABLE.to_string(),
                    breadcrumbs: breadcrumbs(&self.config.top_level_title, None, None, None),
                    intent,
                    title: None,
                };
            }
        };

        let scriptures = match next_prev_block(&self.catalog, key) {
            Some(block) => append_to_class_divs(&html, CLASS_NAV_HEADING, &block),
            None => html.to_string(),
        };
        let book = self.catalog.book(key.book_id);
        let page = Page {
            breadcrumbs: breadcrumbs(
                &self.config.top_level_title,
                book.and_then(|b| self.catalog.volume_for_book(b)),
                book,
                Some(key.chapter),
            ),
            title: book.map(|b| b.title_for_chapter(key.chapter)),
            intent,
            scriptures,
        };
        self.overlay.setup_from_html(&page.scriptures, map);
        page
    }

    /// Plot the single location named by a legacy `showLocation(...)` call.
    ///
    /// Returns `false`, leaving the map untouched, when the call does not
    /// parse.
    pub fn show_location<M: MapSurface + ?Sized>(&mut self, call: &str, map: &mut M) -> bool {
        match parse_show_location(call) {
            Some(tag) => {
                self.overlay.show_location(&tag, map);
                true
            }
            None => {
                log::debug!("ignoring unparseable location call: {}", call);
                false
            }
        }
    }
}
