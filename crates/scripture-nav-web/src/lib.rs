//! Web shell for `scripture-nav`.
//!
//! The navigator runs server-side; the browser page only forwards hash
//! changes and marker clicks, then applies the returned HTML and replays the
//! recorded map commands against Leaflet.

use scripture_nav::{
    catalog_unavailable_page, Catalog, ChapterCacheStore, MapCall, MapMarker, NavConfig,
    NavigationIntent, Navigator, Page, RecordingMap, Transport,
};
use serde::Serialize;
use url::Url;

/// Everything the shell needs to show one navigation.
#[derive(Clone, Debug, Serialize)]
pub struct PagePayload {
    /// Canonical hash for the rendered view.
    pub hash: String,
    pub page: Page,
    /// Map commands issued while rendering, in order.
    pub map: Vec<MapCall>,
    /// Markers visible once `map` has been replayed.
    pub markers: Vec<MapMarker>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookSummary {
    pub id: u32,
    pub full_name: String,
    pub num_chapters: u32,
    pub hash: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct VolumeSummary {
    pub id: u32,
    pub full_name: String,
    pub books: Vec<BookSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CatalogSummary {
    pub available: bool,
    pub volumes: Vec<VolumeSummary>,
}

/// Result of a marker click.
#[derive(Clone, Debug, Serialize)]
pub struct LocationPayload {
    pub ok: bool,
    pub map: Vec<MapCall>,
}

/// Route `hash` and capture the rendered page with its map commands.
pub fn page_payload<T: Transport, C: ChapterCacheStore>(
    navigator: &mut Navigator<T, C>,
    hash: &str,
) -> PagePayload {
    let mut map = RecordingMap::default();
    let page = navigator.on_hash_changed(hash, &mut map);
    PagePayload {
        hash: page.intent.to_hash(navigator.catalog()),
        markers: navigator.overlay().markers().to_vec(),
        map: map.take(),
        page,
    }
}

/// Payload served when the catalog never loaded.
pub fn unavailable_payload(config: &NavConfig) -> PagePayload {
    log::debug!("rendering catalog-unavailable page");
    PagePayload {
        hash: String::new(),
        page: catalog_unavailable_page(config),
        map: Vec::new(),
        markers: Vec::new(),
    }
}

pub fn catalog_summary(catalog: &Catalog) -> CatalogSummary {
    let volumes = catalog
        .volumes()
        .iter()
        .map(|volume| VolumeSummary {
            id: volume.id,
            full_name: volume.full_name.clone(),
            books: catalog
                .books_in(volume)
                .map(|book| BookSummary {
                    id: book.id,
                    full_name: book.full_name.clone(),
                    num_chapters: book.num_chapters,
                    hash: NavigationIntent::Book { book_id: book.id }.to_hash(catalog),
                })
                .collect(),
        })
        .collect();
    CatalogSummary {
        available: true,
        volumes,
    }
}

/// Plot the location named by a legacy `showLocation(...)` call.
pub fn show_location_payload<T: Transport, C: ChapterCacheStore>(
    navigator: &mut Navigator<T, C>,
    call: &str,
) -> LocationPayload {
    let mut map = RecordingMap::default();
    let ok = navigator.show_location(call, &mut map);
    LocationPayload { ok, map: map.take() }
}

/// Decoded value of query parameter `name` in a request target such as
/// `/api/page?hash=1%3A101`.
pub fn query_param(target: &str, name: &str) -> Option<String> {
    let url = Url::parse("http://localhost/").ok()?.join(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Self-contained shell page. In server mode the page calls back into the
/// preview server on every hash change; otherwise it only shows the
/// embedded payload.
pub fn build_shell_html(initial_payload_json: &str, server_mode: bool, title: &str) -> String {
    let safe_json = initial_payload_json.replace("</script>", "<\\/script>");
    let server_mode_literal = if server_mode { "true" } else { "false" };
    let safe_title = scripture_nav::html::escape_text(title);

    let template = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>__TITLE__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <style>
    :root {
      --bg: #f2efe8;
      --panel: #fdfbf7;
      --ink: #252016;
      --muted: #675f50;
      --accent: #226a52;
      --line: #d7cebc;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      height: 100vh;
      display: grid;
      grid-template-columns: minmax(320px, 1fr) minmax(320px, 1fr);
      grid-template-rows: auto 1fr;
      background: var(--bg);
      color: var(--ink);
      font: 15px/1.5 Georgia, "Times New Roman", serif;
    }
    #crumbs {
      grid-column: 1 / span 2;
      padding: 8px 16px;
      border-bottom: 1px solid var(--line);
      background: var(--panel);
    }
    #crumbs ul { list-style: none; margin: 0; padding: 0; }
    #crumbs li { display: inline; }
    #crumbs li + li::before { content: " \203A "; color: var(--muted); }
    #scriptures { overflow-y: auto; padding: 12px 20px; }
    #map { height: 100%; border-left: 1px solid var(--line); }
    a { color: var(--accent); }
    .btn {
      display: inline-block;
      min-width: 3em;
      margin: 3px;
      padding: 4px 10px;
      border: 1px solid var(--line);
      border-radius: 4px;
      background: var(--panel);
      text-align: center;
      text-decoration: none;
    }
    .btn:hover { border-color: var(--accent); }
    .nextprev { float: right; }
    .nextprev a { margin-left: 8px; text-decoration: none; }
  </style>
</head>
<body>
  <div id="crumbs"></div>
  <div id="scriptures"></div>
  <div id="map"></div>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <script>
    const SERVER_MODE = __SERVER_MODE__;
    const INITIAL_PAYLOAD = __INITIAL_PAYLOAD__;

    const el = {
      crumbs: document.getElementById('crumbs'),
      scriptures: document.getElementById('scriptures'),
    };
    const map = L.map('map').setView([31.7683, 35.2137], 8);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap contributors',
    }).addTo(map);
    let markers = [];

    function replay(calls) {
      for (const call of calls || []) {
        switch (call.op) {
          case 'clear':
            markers.forEach((m) => m.remove());
            markers = [];
            break;
          case 'add': {
            const p = call.marker.position;
            const marker = L.marker([p.lat, p.lng]).addTo(map);
            // Placenames come from chapter HTML; show them as text only.
            const label = document.createElement('span');
            label.textContent = call.marker.label;
            marker.bindPopup(label);
            markers.push(marker);
            break;
          }
          case 'fit_bounds': {
            const b = call.bounds;
            map.fitBounds([[b.south, b.west], [b.north, b.east]]);
            break;
          }
          case 'set_zoom':
            map.setZoom(call.zoom);
            break;
        }
      }
    }

    function applyPayload(payload) {
      el.crumbs.innerHTML = payload.page.breadcrumbs;
      el.scriptures.innerHTML = payload.page.scriptures;
      el.scriptures.scrollTop = 0;
      document.title = payload.page.title || '__TITLE__';
      replay(payload.map);
    }

    async function fetchJson(path) {
      const res = await fetch(path);
      if (!res.ok) {
        const text = await res.text();
        throw new Error(`HTTP ${res.status}: ${text}`);
      }
      return res.json();
    }

    async function onHashChanged() {
      if (!SERVER_MODE) {
        return;
      }
      const hash = location.hash.replace(/^#/, '');
      try {
        applyPayload(await fetchJson(`/api/page?hash=${encodeURIComponent(hash)}`));
      } catch (err) {
        console.error('navigation failed', err);
      }
    }

    // Chapter HTML carries inline showLocation(...) handlers; route them to
    // the server instead of evaluating them.
    el.scriptures.addEventListener('click', async (event) => {
      const anchor = event.target.closest('a[onclick^="showLocation("]');
      if (!anchor) {
        return;
      }
      event.preventDefault();
      event.stopPropagation();
      if (!SERVER_MODE) {
        return;
      }
      const call = anchor.getAttribute('onclick');
      try {
        const payload = await fetchJson(`/api/show-location?call=${encodeURIComponent(call)}`);
        replay(payload.map);
      } catch (err) {
        console.error('location failed', err);
      }
    }, true);
    window.showLocation = () => false;

    window.addEventListener('hashchange', onHashChanged);
    applyPayload(INITIAL_PAYLOAD);
    if (SERVER_MODE && location.hash.replace(/^#/, '') !== INITIAL_PAYLOAD.hash) {
      onHashChanged();
    }
  </script>
</body>
</html>
"#;

    template
        .replace("__INITIAL_PAYLOAD__", &safe_json)
        .replace("__SERVER_MODE__", server_mode_literal)
        .replace("__TITLE__", &safe_title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripture_nav::{MemoryChapterCache, MockTransport};

    const VOLUMES: &str = r#"[{"id":1,"fullName":"Old Testament","minBookId":101,"maxBookId":101}]"#;
    const BOOKS: &str = r#"{"101":{"id":101,"parentBookId":1,"fullName":"Genesis","tocName":"Genesis","numChapters":50}}"#;
    const CHAPTER: &str = r#"<div class="navheading">Genesis 2</div><a onclick="showLocation(1047,'Eden',32.5,44.4,32.5,44.4,0,0,650000,0,'')">Eden</a>"#;

    fn navigator() -> Navigator<MockTransport, MemoryChapterCache> {
        let config = NavConfig::default();
        let transport = MockTransport::new()
            .with_body(config.volumes_url(), VOLUMES)
            .with_body(config.books_url(), BOOKS)
            .with_body(config.chapter_url(101, 2, None, false), CHAPTER);
        Navigator::init(transport, config).expect("catalog loads")
    }

    #[test]
    fn page_payload_records_markers() {
        let mut navigator = navigator();
        let payload = page_payload(&mut navigator, "#0:101:2");
        assert_eq!(payload.hash, "1:101:2");
        assert_eq!(payload.markers.len(), 1);
        assert_eq!(payload.markers[0].label, "Eden");
        assert!(payload
            .map
            .iter()
            .any(|call| matches!(call, MapCall::SetZoom { zoom: 8 })));
        assert!(payload.page.scriptures.contains("nextprev"));
    }

    #[test]
    fn show_location_payload_reports_parse_failure() {
        let mut navigator = navigator();
        let bad = show_location_payload(&mut navigator, "alert(1)");
        assert!(!bad.ok);
        assert!(bad.map.is_empty());

        let good = show_location_payload(
            &mut navigator,
            "showLocation(1,'Jerusalem',31.78,35.23,31.78,35.23,0,0,5000,0,'')",
        );
        assert!(good.ok);
        assert_eq!(good.map.len(), 3);
    }

    #[test]
    fn catalog_summary_lists_book_hashes() {
        let navigator = navigator();
        let summary = catalog_summary(navigator.catalog());
        assert!(summary.available);
        assert_eq!(summary.volumes[0].books[0].hash, "1:101");
    }

    #[test]
    fn query_param_decodes_percent_escapes() {
        assert_eq!(
            query_param("/api/page?hash=1%3A101%3A2", "hash").as_deref(),
            Some("1:101:2")
        );
        assert_eq!(query_param("/api/page?hash=", "hash").as_deref(), Some(""));
        assert_eq!(query_param("/api/page", "hash"), None);
        assert_eq!(
            query_param("/api/show-location?call=showLocation(1%2C'A%20B')", "call").as_deref(),
            Some("showLocation(1,'A B')")
        );
    }

    #[test]
    fn shell_escapes_script_terminator() {
        let html = build_shell_html(r#"{"x":"</script>"}"#, true, "The Scriptures");
        assert!(html.contains(r#"{"x":"<\/script>"}"#));
        assert!(html.contains("const SERVER_MODE = true;"));
        assert!(html.contains("<title>The Scriptures</title>"));
    }

    #[test]
    fn shell_binds_marker_labels_as_text() {
        let html = build_shell_html("{}", false, "The Scriptures");
        assert!(html.contains("label.textContent = call.marker.label;"));
        assert!(!html.contains("bindPopup(call.marker.label)"));
    }
}
