//! Previous/next chapter resolution across book and volume boundaries.

use crate::cache::ChapterKey;
use crate::catalog::{Book, Catalog};

/// A neighbouring chapter and its display title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterLink {
    pub key: ChapterKey,
    pub title: String,
}

impl ChapterLink {
    fn new(book: &Book, chapter: u32) -> Self {
        Self {
            key: ChapterKey::new(book.id, chapter),
            title: book.title_for_chapter(chapter),
        }
    }
}

fn first_chapter(book: &Book) -> u32 {
    if book.num_chapters > 0 {
        1
    } else {
        0
    }
}

fn neighbour_book(catalog: &Catalog, book_id: u32, forward: bool) -> Option<&Book> {
    let mut previous = None;
    let mut order = catalog.reading_order();
    while let Some(book) = order.next() {
        if book.id == book_id {
            return if forward { order.next() } else { previous };
        }
        previous = Some(book);
    }
    None
}

/// Chapter after `key`, continuing into the next book in reading order.
pub fn next_chapter(catalog: &Catalog, key: ChapterKey) -> Option<ChapterLink> {
    let book = catalog.book(key.book_id)?;
    if key.chapter < book.num_chapters {
        return Some(ChapterLink::new(book, key.chapter + 1));
    }
    let next = neighbour_book(catalog, book.id, true)?;
    Some(ChapterLink::new(next, first_chapter(next)))
}

/// Chapter before `key`, continuing into the last chapter of the previous
/// book in reading order.
pub fn previous_chapter(catalog: &Catalog, key: ChapterKey) -> Option<ChapterLink> {
    let book = catalog.book(key.book_id)?;
    if key.chapter > 1 && key.chapter <= book.num_chapters {
        return Some(ChapterLink::new(book, key.chapter - 1));
    }
    let previous = neighbour_book(catalog, book.id, false)?;
    Some(ChapterLink::new(previous, previous.num_chapters))
}
