//! Map marker overlay driven by geotags found in chapter HTML.

use serde::{Deserialize, Serialize};

use crate::marker::{scan_geotags, GeoTag};

/// Zoom applied after fitting the map to plotted markers.
pub const DEFAULT_MARKER_ZOOM: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Axis-aligned lat/lng bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Degenerate bounds around a single point.
    pub fn around(point: LatLng) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }
}

/// A labelled marker as handed to the map widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub label: String,
    pub position: LatLng,
}

/// Map widget seam. Implementations forward to whatever map library the
/// page embeds, or record calls for tests and payloads.
pub trait MapSurface {
    fn clear_markers(&mut self);
    fn add_marker(&mut self, marker: &MapMarker);
    fn fit_bounds(&mut self, bounds: &GeoBounds);
    fn set_zoom(&mut self, zoom: u8);
}

/// Tracks markers currently shown on a [`MapSurface`].
#[derive(Clone, Debug)]
pub struct MarkerOverlay {
    markers: Vec<MapMarker>,
    zoom: u8,
}

impl Default for MarkerOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_ZOOM)
    }
}

impl MarkerOverlay {
    pub fn new(zoom: u8) -> Self {
        Self {
            markers: Vec::new(),
            zoom,
        }
    }

    /// Markers currently plotted.
    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    /// Remove all plotted markers from `map`.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, map: &mut M) {
        if !self.markers.is_empty() {
            map.clear_markers();
            self.markers.clear();
        }
    }

    /// Record `tag` unless a marker already sits at the same coordinates.
    ///
    /// A second placename at an occupied position is appended to the
    /// existing label instead.
    fn merge(&mut self, tag: &GeoTag) {
        let position = LatLng {
            lat: tag.latitude,
            lng: tag.longitude,
        };
        let label = tag.label();

        if let Some(existing) = self.markers.iter_mut().find(|m| m.position == position) {
            if !existing.label.split(", ").any(|name| name == label) {
                existing.label.push_str(", ");
                existing.label.push_str(&label);
                log::debug!("merged geotag {:?} into marker {:?}", label, existing.label);
            }
            return;
        }

        self.markers.push(MapMarker { label, position });
    }

    /// Clear existing markers, then plot every geotag in `tags` and fit the
    /// map to them.
    ///
    /// Labels are merged before anything reaches `map`, so each position is
    /// added once with its final label.
    pub fn redraw<M: MapSurface + ?Sized>(&mut self, tags: &[GeoTag], map: &mut M) -> usize {
        self.clear(map);

        let mut bounds: Option<GeoBounds> = None;
        for tag in tags {
            self.merge(tag);
            let point = LatLng {
                lat: tag.latitude,
                lng: tag.longitude,
            };
            match bounds.as_mut() {
                Some(b) => b.extend(point),
                None => bounds = Some(GeoBounds::around(point)),
            }
        }

        for marker in &self.markers {
            map.add_marker(marker);
        }
        if let Some(bounds) = bounds {
            map.fit_bounds(&bounds);
            map.set_zoom(self.zoom);
        }
        self.markers.len()
    }

    /// Scan rendered chapter HTML and redraw markers for its geotags.
    pub fn setup_from_html<M: MapSurface + ?Sized>(&mut self, html: &str, map: &mut M) -> usize {
        let tags = scan_geotags(html);
        let plotted = self.redraw(&tags, map);
        log::debug!("plotted {} markers from {} geotags", plotted, tags.len());
        plotted
    }

    /// Replace all markers with the single location `tag` and center on it.
    pub fn show_location<M: MapSurface + ?Sized>(&mut self, tag: &GeoTag, map: &mut M) {
        self.redraw(core::slice::from_ref(tag), map);
    }
}

/// [`MapSurface`] that records every call, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingMap {
    pub calls: Vec<MapCall>,
}

/// One recorded [`MapSurface`] call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapCall {
    Clear,
    Add { marker: MapMarker },
    FitBounds { bounds: GeoBounds },
    SetZoom { zoom: u8 },
}

impl RecordingMap {
    /// Drain the recorded calls.
    pub fn take(&mut self) -> Vec<MapCall> {
        core::mem::take(&mut self.calls)
    }

    /// Labels of markers added since the last clear.
    pub fn visible_labels(&self) -> Vec<&str> {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, MapCall::Clear))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.calls[start..]
            .iter()
            .filter_map(|c| match c {
                MapCall::Add { marker } => Some(marker.label.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl MapSurface for RecordingMap {
    fn clear_markers(&mut self) {
        self.calls.push(MapCall::Clear);
    }

    fn add_marker(&mut self, marker: &MapMarker) {
        self.calls.push(MapCall::Add {
            marker: marker.clone(),
        });
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) {
        self.calls.push(MapCall::FitBounds { bounds: *bounds });
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.calls.push(MapCall::SetZoom { zoom });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::parse_show_location;

    fn tag(call: &str) -> GeoTag {
        parse_show_location(call).expect("test geotag parses")
    }

    #[test]
    fn redraw_fits_bounds_and_zooms_once() {
        let mut overlay = MarkerOverlay::default();
        let mut map = RecordingMap::default();
        let tags = [
            tag("showLocation(1,'Jerusalem',31.78,35.22,0,0,0,0,0,0,'')"),
            tag("showLocation(2,'Babylon',32.54,44.42,0,0,0,0,0,0,'')"),
        ];

        assert_eq!(overlay.redraw(&tags, &mut map), 2);
        assert_eq!(map.visible_labels(), vec!["Jerusalem", "Babylon"]);
        assert_eq!(
            &map.calls[2..],
            &[
                MapCall::FitBounds {
                    bounds: GeoBounds {
                        south: 31.78,
                        west: 35.22,
                        north: 32.54,
                        east: 44.42,
                    }
                },
                MapCall::SetZoom {
                    zoom: DEFAULT_MARKER_ZOOM
                },
            ]
        );
    }

    #[test]
    fn redraw_clears_previous_markers_first() {
        let mut overlay = MarkerOverlay::default();
        let mut map = RecordingMap::default();
        overlay.redraw(&[tag("showLocation(1,'Ur',30.96,46.10,0,0,0,0,0,0,'')")], &mut map);
        map.take();

        overlay.redraw(&[tag("showLocation(2,'Haran',36.86,39.03,0,0,0,0,0,0,'')")], &mut map);
        assert_eq!(map.calls.first(), Some(&MapCall::Clear));
        assert_eq!(map.visible_labels(), vec!["Haran"]);
        assert_eq!(overlay.markers().len(), 1);
    }

    #[test]
    fn empty_redraw_skips_clear_when_nothing_shown() {
        let mut overlay = MarkerOverlay::default();
        let mut map = RecordingMap::default();
        assert_eq!(overlay.redraw(&[], &mut map), 0);
        assert!(map.calls.is_empty());
    }

    #[test]
    fn duplicate_coordinates_merge_labels() {
        let mut overlay = MarkerOverlay::default();
        let mut map = RecordingMap::default();
        let tags = [
            tag("showLocation(1,'Salem',31.78,35.22,0,0,0,0,0,0,'')"),
            tag("showLocation(2,'Jerusalem',31.78,35.22,0,0,0,0,0,0,'')"),
            tag("showLocation(3,'Salem',31.78,35.22,0,0,0,0,0,0,'')"),
        ];
        assert_eq!(overlay.redraw(&tags, &mut map), 1);
        assert_eq!(overlay.markers()[0].label, "Salem, Jerusalem");
        assert_eq!(map.visible_labels(), vec!["Salem, Jerusalem"]);
        let added = map
            .calls
            .iter()
            .filter(|call| matches!(call, MapCall::Add { .. }))
            .count();
        assert_eq!(added, 1);
    }

    #[test]
    fn show_location_replaces_markers() {
        let mut overlay = MarkerOverlay::new(6);
        let mut map = RecordingMap::default();
        overlay.redraw(
            &[
                tag("showLocation(1,'Ur',30.96,46.10,0,0,0,0,0,0,'')"),
                tag("showLocation(2,'Haran',36.86,39.03,0,0,0,0,0,0,'')"),
            ],
            &mut map,
        );
        map.take();

        overlay.show_location(&tag("showLocation(3,'Egypt',26.0,30.0,0,0,0,0,0,0,'')"), &mut map);
        assert_eq!(map.visible_labels(), vec!["Egypt"]);
        assert_eq!(map.calls.last(), Some(&MapCall::SetZoom { zoom: 6 }));
        assert_eq!(
            GeoBounds::around(LatLng { lat: 26.0, lng: 30.0 }).center(),
            LatLng { lat: 26.0, lng: 30.0 }
        );
    }
}
