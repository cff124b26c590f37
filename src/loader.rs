//! Catalog loader: fetch volumes and books, then join them.

use std::thread;

use crate::catalog::{parse_books, parse_volumes, Catalog};
use crate::config::NavConfig;
use crate::error::NavError;
use crate::fetch::Transport;

/// Fetch both catalog endpoints concurrently and join the results.
///
/// Both requests always run to completion; the books failure is reported
/// when both fail.
pub fn load_catalog<T: Transport + ?Sized>(
    transport: &T,
    config: &NavConfig,
) -> Result<Catalog, NavError> {
    let books_url = config.books_url();
    let volumes_url = config.volumes_url();

    let (books, volumes) = thread::scope(|scope| {
        let books = scope.spawn(|| {
            transport
                .get_text(&books_url)
                .and_then(|body| parse_books(&body))
        });
        let volumes = transport
            .get_text(&volumes_url)
            .and_then(|body| parse_volumes(&body));
        let books = books.join().unwrap_or_else(|_| {
            Err(NavError::Transport {
                url: books_url.clone(),
                message: "books fetch thread panicked".to_string(),
            })
        });
        (books, volumes)
    });

    let books = books.inspect_err(|e| log::warn!("books load failed: {}", e))?;
    let volumes = volumes.inspect_err(|e| log::warn!("volumes load failed: {}", e))?;

    let catalog = Catalog::join(volumes, books);
    log::info!(
        "loaded catalog: {} volumes, {} books",
        catalog.volumes().len(),
        catalog.book_count()
    );
    Ok(catalog)
}
