//! Hash fragment router.
//!
//! Fragments take the forms `` | `V` | `V:B` | `V:B:C`. Anything malformed or
//! out of range resolves to [`NavigationIntent::Home`] with no volume filter;
//! the router never reports an error.

use serde::Serialize;

use crate::catalog::Catalog;

/// What the page should show for a given fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum NavigationIntent {
    /// Volume grid, optionally filtered to one volume.
    Home { volume_id: Option<u32> },
    /// Chapter grid for a book with more than one chapter.
    Book { book_id: u32 },
    /// Chapter text.
    Chapter { book_id: u32, chapter: u32 },
}

impl NavigationIntent {
    pub const HOME: Self = Self::Home { volume_id: None };

    /// Canonical fragment for this intent, without the leading `#`.
    ///
    /// Book and chapter fragments carry the book's parent volume id; unknown
    /// books fall back to volume `0`, which the router ignores anyway.
    pub fn to_hash(&self, catalog: &Catalog) -> String {
        let volume_of = |book_id: u32| {
            catalog
                .book(book_id)
                .map(|book| book.volume_id)
                .unwrap_or(0)
        };
        match *self {
            Self::Home { volume_id: None } => String::new(),
            Self::Home {
                volume_id: Some(volume_id),
            } => volume_id.to_string(),
            Self::Book { book_id } => format!("{}:{}", volume_of(book_id), book_id),
            Self::Chapter { book_id, chapter } => {
                format!("{}:{}:{}", volume_of(book_id), book_id, chapter)
            }
        }
    }
}

fn parse_id(segment: &str) -> Option<u32> {
    segment.trim().parse::<u32>().ok()
}

/// Resolve a location hash against the loaded catalog.
pub fn route(hash: &str, catalog: &Catalog) -> NavigationIntent {
    let fragment = hash.strip_prefix('#').unwrap_or(hash);
    if fragment.is_empty() {
        return NavigationIntent::HOME;
    }

    let ids: Vec<&str> = fragment.split(':').collect();
    let intent = match ids.as_slice() {
        [volume] => parse_id(volume)
            .filter(|id| catalog.volume(*id).is_some())
            .map(|id| NavigationIntent::Home {
                volume_id: Some(id),
            }),
        [volume, book] => {
            parse_id(volume).and_then(|_| parse_id(book)).and_then(|book_id| {
                let book = catalog.book(book_id)?;
                Some(if book.num_chapters <= 1 {
                    NavigationIntent::Chapter {
                        book_id,
                        chapter: book.num_chapters,
                    }
                } else {
                    NavigationIntent::Book { book_id }
                })
            })
        }
        [volume, book, chapter] => parse_id(volume).and_then(|_| {
            let book_id = parse_id(book)?;
            let chapter = parse_id(chapter)?;
            catalog
                .book_chapter_valid(book_id, chapter)
                .then_some(NavigationIntent::Chapter { book_id, chapter })
        }),
        _ => None,
    };

    match intent {
        Some(intent) => intent,
        None => {
            log::debug!("hash {:?} does not resolve; showing home", hash);
            NavigationIntent::HOME
        }
    }
}
