//! Legacy geotag parser.
//!
//! Chapter HTML from the scriptures server carries place references as inline
//! handlers of the form
//!
//! ```text
//! <a onclick="showLocation(108,'Assyria',36.359410,43.152887,33.515336,44.551217,0.000000,0.000000,1202300.000000,0.000000,'>')">
//! ```
//!
//! The argument list is positional and is matched with a fixed regex, so any
//! change to the server format breaks extraction. All parsing lives here and
//! takes plain string input.

use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Serialize;

/// Handler prefix that marks an anchor as a geotag.
pub const SHOW_LOCATION_PREFIX: &str = "showLocation(";

const INDEX_GEOTAG_ID: usize = 1;
const INDEX_PLACENAME: usize = 2;
const INDEX_LATITUDE: usize = 3;
const INDEX_LONGITUDE: usize = 4;
const INDEX_VIEW_LATITUDE: usize = 5;
const INDEX_VIEW_LONGITUDE: usize = 6;
const INDEX_VIEW_TILT: usize = 7;
const INDEX_VIEW_ROLL: usize = 8;
const INDEX_VIEW_ALTITUDE: usize = 9;
const INDEX_VIEW_HEADING: usize = 10;
const INDEX_FLAG: usize = 11;

fn lat_lon_parser() -> Option<&'static Regex> {
    static PARSER: OnceLock<Option<Regex>> = OnceLock::new();
    PARSER
        .get_or_init(|| {
            Regex::new(
                r"\((.*),\s*'(.*)',(.*),(.*),(.*),(.*),(.*),(.*),(.*),(.*),\s*'(.*)'\)",
            )
            .ok()
        })
        .as_ref()
}

/// Camera hints carried by a geotag; unused by flat map widgets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GeoView {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tilt: Option<f64>,
    pub roll: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
}

/// One parsed `showLocation(...)` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeoTag {
    pub geotag_id: Option<u32>,
    pub placename: String,
    pub latitude: f64,
    pub longitude: f64,
    pub view: GeoView,
    pub flag: String,
}

impl GeoTag {
    /// Marker label: the placename, followed by the flag when present.
    pub fn label(&self) -> String {
        if self.flag.is_empty() {
            self.placename.clone()
        } else {
            format!("{} {}", self.placename, self.flag)
        }
    }
}

fn number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a handler string such as `showLocation(108,'Assyria',...)`.
///
/// Returns `None` when the positional pattern does not match or when the
/// latitude/longitude are not finite numbers.
pub fn parse_show_location(call: &str) -> Option<GeoTag> {
    let caps = lat_lon_parser()?.captures(call)?;
    let field = |idx: usize| caps.get(idx).map(|m| m.as_str()).unwrap_or_default();

    let latitude = number(field(INDEX_LATITUDE))?;
    let longitude = number(field(INDEX_LONGITUDE))?;

    Some(GeoTag {
        geotag_id: field(INDEX_GEOTAG_ID).trim().parse::<u32>().ok(),
        placename: field(INDEX_PLACENAME).to_string(),
        latitude,
        longitude,
        view: GeoView {
            latitude: number(field(INDEX_VIEW_LATITUDE)),
            longitude: number(field(INDEX_VIEW_LONGITUDE)),
            tilt: number(field(INDEX_VIEW_TILT)),
            roll: number(field(INDEX_VIEW_ROLL)),
            altitude: number(field(INDEX_VIEW_ALTITUDE)),
            heading: number(field(INDEX_VIEW_HEADING)),
        },
        flag: field(INDEX_FLAG).to_string(),
    })
}

fn decode_attr_value(reader: &Reader<&[u8]>, raw: &[u8]) -> Option<String> {
    let decoded = reader.decoder().decode(raw).ok()?;
    // HTML entities unknown to XML keep their raw spelling.
    match quick_xml::escape::unescape(&decoded) {
        Ok(unescaped) => Some(unescaped.into_owned()),
        Err(_) => Some(decoded.into_owned()),
    }
}

/// Collect `onclick` handlers of anchors whose handler begins with
/// [`SHOW_LOCATION_PREFIX`], in document order.
///
/// Chapter HTML is not guaranteed to be well formed, so the reader runs in a
/// lenient mode and stops at the first syntax error it cannot step past.
pub fn scan_show_location_calls(html: &str) -> Vec<String> {
    let mut reader = Reader::from_reader(html.as_bytes());
    {
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;
    }

    let mut buf = Vec::with_capacity(256);
    let mut calls = Vec::new();
    let mut last_position = reader.buffer_position();

    loop {
        let event = reader.read_event_into(&mut buf);
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().as_ref().eq_ignore_ascii_case(b"a") =>
            {
                for attr in e.html_attributes().flatten() {
                    if !attr.key.as_ref().eq_ignore_ascii_case(b"onclick") {
                        continue;
                    }
                    if let Some(value) = decode_attr_value(&reader, attr.value.as_ref()) {
                        if value.trim_start().starts_with(SHOW_LOCATION_PREFIX) {
                            calls.push(value.trim().to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                let position = reader.buffer_position();
                if position <= last_position {
                    log::warn!(
                        "geotag scan stopped at byte {}: {}; {} calls found",
                        position,
                        err,
                        calls.len()
                    );
                    break;
                }
                log::debug!("geotag scan skipped malformed markup at {}: {}", position, err);
            }
        }
        last_position = reader.buffer_position();
        buf.clear();
    }

    calls
}

/// Parse every geotag found in `html`.
pub fn scan_geotags(html: &str) -> Vec<GeoTag> {
    let calls = scan_show_location_calls(html);
    let mut tags = Vec::with_capacity(calls.len());
    for call in &calls {
        match parse_show_location(call) {
            Some(tag) => tags.push(tag),
            None => log::debug!("unparseable geotag handler: {}", call),
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSYRIA: &str = "showLocation(108,'Assyria',36.359410,43.152887,33.515336,44.551217,0.000000,0.000000,1202300.000000,0.000000,'>')";

    #[test]
    fn parses_well_formed_call() {
        let tag = parse_show_location(ASSYRIA).expect("assyria geotag parses");
        assert_eq!(tag.geotag_id, Some(108));
        assert_eq!(tag.placename, "Assyria");
        assert!((tag.latitude - 36.359410).abs() < 1e-9);
        assert!((tag.longitude - 43.152887).abs() < 1e-9);
        assert_eq!(tag.view.altitude, Some(1202300.0));
        assert_eq!(tag.flag, ">");
        assert_eq!(tag.label(), "Assyria >");
    }

    #[test]
    fn tolerates_space_before_quoted_fields() {
        let tag = parse_show_location(
            "showLocation(108, 'Assyria',36.359410,43.152887,33.515336,44.551217,0.000000,0.000000,1202300.000000,0.000000, '')",
        )
        .expect("spaced geotag parses");
        assert_eq!(tag.placename, "Assyria");
        assert_eq!(tag.label(), "Assyria");
    }

    #[test]
    fn rejects_short_or_non_numeric_calls() {
        assert!(parse_show_location("showLocation(1,'Nowhere',1,2)").is_none());
        assert!(parse_show_location(
            "showLocation(1,'Nowhere',north,2,0,0,0,0,0,0,'')"
        )
        .is_none());
    }

    #[test]
    fn scan_finds_only_prefixed_anchor_handlers() {
        let html = format!(
            "<div><p>Go to <a href=\"#\" onclick=\"{}\">Assyria</a>, \
             not <a onclick=\"alert('x')\">here</a>. <br> &nbsp;</p>\
             <span onclick=\"{}\">span</span></div>",
            ASSYRIA, ASSYRIA
        );
        let calls = scan_show_location_calls(&html);
        assert_eq!(calls, vec![ASSYRIA.to_string()]);
    }

    #[test]
    fn scan_geotags_parses_in_document_order() {
        let html = "<a onclick=\"showLocation(1,'Eden',1.5,2.5,0,0,0,0,0,0,'')\">Eden</a>\
                    <a onclick=\"showLocation(2,'Nod',3.5,4.5,0,0,0,0,0,0,'~')\">Nod</a>";
        let tags = scan_geotags(html);
        let names: Vec<String> = tags.iter().map(GeoTag::label).collect();
        assert_eq!(names, vec!["Eden".to_string(), "Nod ~".to_string()]);
    }
}
