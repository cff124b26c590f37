//! Page views: volume grid, chapter grid, breadcrumbs and chapter chrome.

use std::sync::OnceLock;

use regex::Regex;

use crate::cache::ChapterKey;
use crate::catalog::{Book, Catalog, Volume};
use crate::html::{
    escape_text, html_anchor, html_div, html_element, html_link, html_list_item,
    html_list_item_link, Div, Link, TAG_HEADERS, TAG_UNORDERED_LIST,
};
use crate::route::NavigationIntent;
use crate::sequence::{next_chapter, previous_chapter, ChapterLink};

pub const BOTTOM_PADDING: &str = "<br /><br />";
pub const CLASS_BOOKS: &str = "books";
pub const CLASS_BUTTON: &str = "btn";
pub const CLASS_CHAPTER: &str = "chapter";
pub const CLASS_VOLUME: &str = "volume";
pub const CLASS_NAV_HEADING: &str = "navheading";
pub const CLASS_NEXT_PREV: &str = "nextprev";
pub const DIV_SCRIPTURES_NAVIGATOR: &str = "scripnav";

fn navigator_div(content: &str) -> String {
    html_div(&Div {
        id: Some(DIV_SCRIPTURES_NAVIGATOR),
        content: Some(content),
        ..Div::default()
    })
}

fn books_grid(catalog: &Catalog, volume: &Volume) -> String {
    let mut grid = String::with_capacity(64 * volume.book_ids.len());
    for book in catalog.books_in(volume) {
        let id = book.id.to_string();
        let href = format!("#{}:{}", volume.id, book.id);
        grid.push_str(&html_link(&Link {
            id: Some(&id),
            class: Some(CLASS_BUTTON),
            href: Some(&href),
            content: Some(&escape_text(book.grid_label())),
            ..Link::default()
        }));
    }
    html_div(&Div {
        class: Some(CLASS_BOOKS),
        content: Some(&grid),
        ..Div::default()
    })
}

/// Volume headings with their book buttons, for all volumes or just
/// `volume_id`.
pub fn volumes_grid(catalog: &Catalog, volume_id: Option<u32>) -> String {
    let mut content = String::with_capacity(4096);
    for volume in catalog.volumes() {
        if volume_id.is_some_and(|id| id != volume.id) {
            continue;
        }
        let heading = html_anchor(volume.id)
            + &html_element(TAG_HEADERS, &escape_text(&volume.full_name));
        content.push_str(&html_div(&Div {
            class: Some(CLASS_VOLUME),
            content: Some(&heading),
            ..Div::default()
        }));
        content.push_str(&books_grid(catalog, volume));
    }
    content.push_str(BOTTOM_PADDING);
    navigator_div(&content)
}

/// Book heading with one button per chapter.
pub fn chapters_grid(book: &Book) -> String {
    let class = format!("{} {}", CLASS_BUTTON, CLASS_CHAPTER);
    let mut grid = String::with_capacity(64 * book.num_chapters as usize);
    for chapter in 1..=book.num_chapters {
        let id = chapter.to_string();
        let href = format!("#{}:{}:{}", book.volume_id, book.id, chapter);
        grid.push_str(&html_link(&Link {
            id: Some(&id),
            class: Some(&class),
            href: Some(&href),
            content: Some(&id),
            ..Link::default()
        }));
    }
    let heading = html_div(&Div {
        class: Some(CLASS_VOLUME),
        content: Some(&html_element(TAG_HEADERS, &escape_text(&book.full_name))),
        ..Div::default()
    });
    let chapters = html_div(&Div {
        class: Some(CLASS_BOOKS),
        content: Some(&grid),
        ..Div::default()
    });
    navigator_div(&(heading + &chapters))
}

/// Breadcrumb trail. Every level above the deepest one is a link.
pub fn breadcrumbs(
    top_level_title: &str,
    volume: Option<&Volume>,
    book: Option<&Book>,
    chapter: Option<u32>,
) -> String {
    let top = escape_text(top_level_title);
    let mut crumbs = String::with_capacity(256);

    match volume {
        None => crumbs.push_str(&html_list_item(&top)),
        Some(volume) => {
            crumbs.push_str(&html_list_item_link(&top, ""));
            let volume_name = escape_text(&volume.full_name);
            match book {
                None => crumbs.push_str(&html_list_item(&volume_name)),
                Some(book) => {
                    crumbs.push_str(&html_list_item_link(&volume_name, &volume.id.to_string()));
                    let toc = escape_text(book.toc_label());
                    match chapter.filter(|c| *c > 0) {
                        None => crumbs.push_str(&html_list_item(&toc)),
                        Some(chapter) => {
                            crumbs.push_str(&html_list_item_link(
                                &toc,
                                &format!("{}:{}", volume.id, book.id),
                            ));
                            crumbs.push_str(&html_list_item(&chapter.to_string()));
                        }
                    }
                }
            }
        }
    }

    html_element(TAG_UNORDERED_LIST, &crumbs)
}

fn neighbour_link(catalog: &Catalog, link: &ChapterLink, class: &str, label: &str) -> String {
    let href = format!(
        "#{}",
        NavigationIntent::Chapter {
            book_id: link.key.book_id,
            chapter: link.key.chapter,
        }
        .to_hash(catalog)
    );
    html_link(&Link {
        class: Some(class),
        href: Some(&href),
        title: Some(&link.title),
        content: Some(label),
        ..Link::default()
    })
}

/// `nextprev` block linking the chapters around `key`, or `None` when the
/// chapter has no neighbours.
pub fn next_prev_block(catalog: &Catalog, key: ChapterKey) -> Option<String> {
    let previous = previous_chapter(catalog, key);
    let next = next_chapter(catalog, key);
    if previous.is_none() && next.is_none() {
        return None;
    }

    let mut links = String::with_capacity(256);
    if let Some(previous) = &previous {
        links.push_str(&neighbour_link(catalog, previous, "prev", "&laquo;"));
    }
    if let Some(next) = &next {
        links.push_str(&neighbour_link(catalog, next, "next", "&raquo;"));
    }
    Some(html_div(&Div {
        class: Some(CLASS_NEXT_PREV),
        content: Some(&links),
        ..Div::default()
    }))
}

fn div_token_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)<div\b[^>]*>|</div\s*>").ok())
        .as_ref()
}

fn class_attr_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).ok())
        .as_ref()
}

fn has_class(open_tag: &str, class: &str) -> bool {
    let Some(caps) = class_attr_pattern().and_then(|p| p.captures(open_tag)) else {
        return false;
    };
    caps.get(1)
        .or_else(|| caps.get(2))
        .is_some_and(|value| value.as_str().split_whitespace().any(|c| c == class))
}

/// Append `fragment` inside every `<div>` carrying `class`, just before its
/// matching close tag.
pub fn append_to_class_divs(html: &str, class: &str, fragment: &str) -> String {
    let Some(pattern) = div_token_pattern() else {
        return html.to_string();
    };

    // Open-tag depth for each targeted div still waiting for its close.
    let mut pending: Vec<usize> = Vec::new();
    let mut insert_at: Vec<usize> = Vec::new();
    let mut depth = 0usize;

    for token in pattern.find_iter(html) {
        if token.as_str().starts_with("</") {
            if depth == 0 {
                continue;
            }
            if pending.last() == Some(&depth) {
                pending.pop();
                insert_at.push(token.start());
            }
            depth -= 1;
        } else {
            depth += 1;
            if has_class(token.as_str(), class) {
                pending.push(depth);
            }
        }
    }

    if insert_at.is_empty() {
        return html.to_string();
    }
    insert_at.sort_unstable();

    let mut out = String::with_capacity(html.len() + fragment.len() * insert_at.len());
    let mut cursor = 0usize;
    for at in insert_at {
        out.push_str(&html[cursor..at]);
        out.push_str(fragment);
        cursor = at;
    }
    out.push_str(&html[cursor..]);
    out
}
