//! Scriptures catalog: volumes, books and the id-range join between them.
//!
//! The remote API serves volumes and books from two separate endpoints. A
//! volume only names the inclusive `[min_book_id, max_book_id]` range of the
//! books it owns; [`Catalog::join`] resolves those ranges into per-volume book
//! lists once, after which the catalog is read-only for the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// A top-level scripture collection (e.g. Old Testament).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: u32,
    pub full_name: String,
    pub min_book_id: u32,
    pub max_book_id: u32,
    #[serde(default)]
    pub abbr: String,
    #[serde(default)]
    pub grid_name: String,
    #[serde(default)]
    pub web_title: String,
    #[serde(default)]
    pub url_path: String,
    /// Book ids owned by this volume, filled in by the join.
    #[serde(skip)]
    pub book_ids: Vec<u32>,
}

/// A named subdivision of a volume with a chapter count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u32,
    /// Owning volume id. The wire name is historical.
    #[serde(rename = "parentBookId")]
    pub volume_id: u32,
    pub full_name: String,
    #[serde(default)]
    pub grid_name: String,
    #[serde(default)]
    pub toc_name: String,
    #[serde(default)]
    pub abbr: String,
    #[serde(default)]
    pub cite_abbr: String,
    #[serde(default)]
    pub url_path: String,
    #[serde(default)]
    pub num_chapters: u32,
}

impl Book {
    /// Label used on grid buttons, falling back to the full name.
    pub fn grid_label(&self) -> &str {
        if self.grid_name.is_empty() {
            &self.full_name
        } else {
            &self.grid_name
        }
    }

    /// Label used in breadcrumbs and chapter titles.
    pub fn toc_label(&self) -> &str {
        if self.toc_name.is_empty() {
            &self.full_name
        } else {
            &self.toc_name
        }
    }

    /// Whether `chapter` addresses a real chapter of this book.
    ///
    /// Chapters run `1..=num_chapters`; a book without chapters is addressed
    /// by chapter `0` only.
    pub fn chapter_valid(&self, chapter: u32) -> bool {
        if self.num_chapters == 0 {
            chapter == 0
        } else {
            (1..=self.num_chapters).contains(&chapter)
        }
    }

    /// `"{toc} {chapter}"`, or just the TOC name for chapter `0`.
    pub fn title_for_chapter(&self, chapter: u32) -> String {
        if chapter > 0 {
            format!("{} {}", self.toc_label(), chapter)
        } else {
            self.toc_label().to_string()
        }
    }
}

/// Books endpoint payload: the live API keys books by id, older dumps are
/// plain arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum BooksPayload {
    Keyed(BTreeMap<String, Book>),
    List(Vec<Book>),
}

/// Parse the volumes endpoint body.
pub fn parse_volumes(json: &str) -> Result<Vec<Volume>, NavError> {
    serde_json::from_str(json).map_err(|e| NavError::decode("volumes", e))
}

/// Parse the books endpoint body.
pub fn parse_books(json: &str) -> Result<Vec<Book>, NavError> {
    let payload: BooksPayload =
        serde_json::from_str(json).map_err(|e| NavError::decode("books", e))?;
    Ok(match payload {
        BooksPayload::Keyed(map) => map.into_values().collect(),
        BooksPayload::List(list) => list,
    })
}

/// Loaded, joined catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    volumes: Vec<Volume>,
    books: BTreeMap<u32, Book>,
}

impl Catalog {
    /// Join volumes and books by each volume's book id range.
    ///
    /// Ids inside a range with no matching book are skipped.
    pub fn join(mut volumes: Vec<Volume>, books: Vec<Book>) -> Self {
        let books: BTreeMap<u32, Book> = books.into_iter().map(|b| (b.id, b)).collect();
        volumes.sort_by_key(|v| v.id);

        for volume in &mut volumes {
            volume.book_ids.clear();
            if volume.min_book_id > volume.max_book_id {
                log::warn!(
                    "volume {} has inverted book range {}..={}",
                    volume.id,
                    volume.min_book_id,
                    volume.max_book_id
                );
                continue;
            }
            volume.book_ids.extend(
                books
                    .range(volume.min_book_id..=volume.max_book_id)
                    .map(|(id, _)| *id),
            );
            let width = u64::from(volume.max_book_id - volume.min_book_id) + 1;
            let missing = width.saturating_sub(volume.book_ids.len() as u64);
            if missing > 0 {
                log::warn!(
                    "volume {} range {}..={} has {} ids without a book",
                    volume.id,
                    volume.min_book_id,
                    volume.max_book_id,
                    missing
                );
            }
        }

        Self { volumes, books }
    }

    /// Parse both endpoint bodies and join them.
    pub fn from_json(volumes_json: &str, books_json: &str) -> Result<Self, NavError> {
        Ok(Self::join(
            parse_volumes(volumes_json)?,
            parse_books(books_json)?,
        ))
    }

    /// Volumes ordered by id.
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn volume(&self, id: u32) -> Option<&Volume> {
        self.volumes
            .binary_search_by_key(&id, |v| v.id)
            .ok()
            .map(|idx| &self.volumes[idx])
    }

    pub fn book(&self, id: u32) -> Option<&Book> {
        self.books.get(&id)
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Volume owning `book`, by its parent id.
    pub fn volume_for_book(&self, book: &Book) -> Option<&Volume> {
        self.volume(book.volume_id)
    }

    /// Books of `volume` in id order.
    pub fn books_in<'a>(&'a self, volume: &'a Volume) -> impl Iterator<Item = &'a Book> + 'a {
        volume.book_ids.iter().filter_map(|id| self.books.get(id))
    }

    /// Whether `(book_id, chapter)` names an existing chapter.
    pub fn book_chapter_valid(&self, book_id: u32, chapter: u32) -> bool {
        self.book(book_id)
            .is_some_and(|book| book.chapter_valid(chapter))
    }

    /// All joined books in reading order: volume by volume, then by id.
    pub fn reading_order(&self) -> impl Iterator<Item = &Book> + '_ {
        self.volumes.iter().flat_map(|v| self.books_in(v))
    }
}
