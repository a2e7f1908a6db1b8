//! Spherical Web-Mercator projection with 256 px tiles.
//!
//! World pixel space at zoom `z` is `256 · 2^z` pixels square, origin at the
//! north-west corner, y growing southwards.

use std::f64::consts::PI;

use super::{CameraView, LatLng, LatLngBounds};

pub const TILE_SIZE: f64 = 256.0;
/// Latitude where the square Mercator world ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 19.0;

/// A point in world pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

pub fn project(p: LatLng, zoom: f64) -> Point {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) * 0.5 * size;
    Point { x, y }
}

pub fn unproject(pt: Point, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = pt.x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * pt.y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Coordinates covered by a viewport of `width × height` pixels.
pub fn visible_bounds(view: CameraView, width: f64, height: f64) -> LatLngBounds {
    let c = project(view.center, view.zoom);
    let nw = unproject(
        Point {
            x: c.x - width * 0.5,
            y: c.y - height * 0.5,
        },
        view.zoom,
    );
    let se = unproject(
        Point {
            x: c.x + width * 0.5,
            y: c.y + height * 0.5,
        },
        view.zoom,
    );
    LatLngBounds {
        south: se.lat,
        west: nw.lng,
        north: nw.lat,
        east: se.lng,
    }
}

/// Screen position of `p` relative to the top-left corner of the viewport.
pub fn to_screen(p: LatLng, view: CameraView, width: f64, height: f64) -> Point {
    let c = project(view.center, view.zoom);
    let q = project(p, view.zoom);
    Point {
        x: q.x - c.x + width * 0.5,
        y: q.y - c.y + height * 0.5,
    }
}

pub fn from_screen(pt: Point, view: CameraView, width: f64, height: f64) -> LatLng {
    let c = project(view.center, view.zoom);
    unproject(
        Point {
            x: c.x + pt.x - width * 0.5,
            y: c.y + pt.y - height * 0.5,
        },
        view.zoom,
    )
}

/// Camera that shows `bounds` inside a padded viewport.
///
/// The zoom is snapped down to an integer and capped at `max_zoom`, so a
/// degenerate (single-point) box lands on `max_zoom` instead of infinity.
pub fn fit_view(
    bounds: LatLngBounds,
    width: f64,
    height: f64,
    padding: f64,
    max_zoom: f64,
) -> CameraView {
    let avail_w = (width - 2.0 * padding).max(1.0);
    let avail_h = (height - 2.0 * padding).max(1.0);

    let nw = project(LatLng::new(bounds.north, bounds.west), 0.0);
    let se = project(LatLng::new(bounds.south, bounds.east), 0.0);
    let dx = (se.x - nw.x).abs();
    let dy = (se.y - nw.y).abs();

    let zoom_for = |span: f64, avail: f64| {
        if span <= f64::EPSILON {
            f64::INFINITY
        } else {
            (avail / span).log2()
        }
    };
    let zoom = zoom_for(dx, avail_w)
        .min(zoom_for(dy, avail_h))
        .min(max_zoom)
        .floor();
    let zoom = clamp_zoom(zoom);

    let mid = Point {
        x: (nw.x + se.x) * 0.5,
        y: (nw.y + se.y) * 0.5,
    };
    CameraView {
        center: unproject(mid, 0.0),
        zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn project_unproject_identity() {
        let p = LatLng::new(52.05917, 1.15545);
        let back = unproject(project(p, 11.0), 11.0);
        assert!(close(back.lat, p.lat));
        assert!(close(back.lng, p.lng));
    }

    #[test]
    fn origin_is_world_centre() {
        let pt = project(LatLng::new(0.0, 0.0), 0.0);
        assert!(close(pt.x, 128.0));
        assert!(close(pt.y, 128.0));
    }

    #[test]
    fn visible_span_halves_per_zoom() {
        let c = LatLng::new(52.0, 1.1);
        let a = visible_bounds(CameraView { center: c, zoom: 12.0 }, 800.0, 600.0);
        let b = visible_bounds(CameraView { center: c, zoom: 13.0 }, 800.0, 600.0);
        assert!(a.contains(c) && b.contains(c));
        let ratio = a.lat_span() / b.lat_span();
        assert!((ratio - 2.0).abs() < 1e-3);
    }

    #[test]
    fn screen_roundtrip() {
        let view = CameraView {
            center: LatLng::new(52.0, 1.1),
            zoom: 14.0,
        };
        let p = LatLng::new(52.003, 1.104);
        let s = to_screen(p, view, 640.0, 480.0);
        let back = from_screen(s, view, 640.0, 480.0);
        assert!(close(back.lat, p.lat));
        assert!(close(back.lng, p.lng));
        let centre = to_screen(view.center, view, 640.0, 480.0);
        assert!(close(centre.x, 320.0) && close(centre.y, 240.0));
    }

    #[test]
    fn fit_contains_bounds_and_respects_cap() {
        let bounds = LatLngBounds {
            south: 52.0,
            west: 1.0,
            north: 52.1,
            east: 1.2,
        };
        let view = fit_view(bounds, 800.0, 600.0, 20.0, 13.0);
        assert!(view.zoom <= 13.0);
        assert_eq!(view.zoom, view.zoom.floor());
        let shown = visible_bounds(view, 800.0, 600.0);
        assert!(shown.contains(LatLng::new(52.0, 1.0)));
        assert!(shown.contains(LatLng::new(52.1, 1.2)));
    }

    #[test]
    fn degenerate_bounds_hit_max_zoom() {
        let p = LatLng::new(52.0, 1.1);
        let bounds = LatLngBounds::from_points([p, p]).unwrap();
        let view = fit_view(bounds, 800.0, 600.0, 20.0, 13.0);
        assert_eq!(view.zoom, 13.0);
        assert!(view.center.lat.is_finite() && view.center.lng.is_finite());
    }
}
