//! Fetched-chapter cache.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifies one chapter request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterKey {
    pub book_id: u32,
    pub chapter: u32,
}

impl ChapterKey {
    pub const fn new(book_id: u32, chapter: u32) -> Self {
        Self { book_id, chapter }
    }
}

/// Storage hooks for fetched chapter HTML.
pub trait ChapterCacheStore {
    /// Cached HTML for `key`, if available.
    fn load(&self, _key: ChapterKey) -> Option<Arc<str>> {
        None
    }

    /// Remember the HTML fetched for `key`.
    fn store(&self, _key: ChapterKey, _html: Arc<str>) {}
}

/// Cache that never stores anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoChapterCache;

impl ChapterCacheStore for NoChapterCache {}

/// Bounded in-memory cache with least-recently-used eviction.
#[derive(Debug)]
pub struct MemoryChapterCache {
    capacity: usize,
    entries: Mutex<VecDeque<(ChapterKey, Arc<str>)>>,
}

impl MemoryChapterCache {
    /// A capacity of `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(ChapterKey, Arc<str>)>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ChapterCacheStore for MemoryChapterCache {
    fn load(&self, key: ChapterKey) -> Option<Arc<str>> {
        let mut entries = self.lock();
        let idx = entries.iter().position(|(k, _)| *k == key)?;
        // Most recently used entries live at the back.
        let entry = entries.remove(idx)?;
        let html = Arc::clone(&entry.1);
        entries.push_back(entry);
        Some(html)
    }

    fn store(&self, key: ChapterKey, html: Arc<str>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if let Some(idx) = entries.iter().position(|(k, _)| *k == key) {
            entries.remove(idx);
        }
        while entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.pop_front() {
                log::debug!(
                    "evicting cached chapter {}:{}",
                    evicted.book_id,
                    evicted.chapter
                );
            }
        }
        entries.push_back((key, html));
    }
}
