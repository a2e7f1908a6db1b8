//! Renderer-agnostic map widget state.
//!
//! `MapCanvas` owns the camera, the marker store, the optional cluster layer
//! and the set of open popups. It knows nothing about egui: the viewer asks
//! for a [`Scene`] in screen space each frame and feeds pointer input back
//! through `pan`, `zoom_at` and `hit_test`.

use std::collections::{BTreeMap, BTreeSet};

use super::cluster::{cluster_markers, Cluster};
use super::projection::{self, Point};
use super::{
    CameraView, ClusterOptions, FitOptions, LatLng, LatLngBounds, MapError, MapSurface, MarkerId,
    MarkerSpec,
};

/// Clicking a cluster zooms in by this much while below `CLUSTER_CLICK_MAX_ZOOM`.
const CLUSTER_CLICK_ZOOM_STEP: f64 = 2.0;
const CLUSTER_CLICK_MAX_ZOOM: f64 = 15.0;
/// Marker hit radius in pixels.
const MARKER_HIT_RADIUS: f64 = 12.0;
const CLUSTER_HIT_RADIUS: f64 = 20.0;

#[derive(Debug, Clone)]
struct PlacedMarker {
    spec: MarkerSpec,
    clustered: bool,
}

#[derive(Debug, Clone)]
struct ClusterLayer {
    options: ClusterOptions,
}

/// One drawable item in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem<'a> {
    Marker {
        id: MarkerId,
        pos: Point,
        spec: &'a MarkerSpec,
    },
    Cluster {
        pos: Point,
        count: usize,
        center: LatLng,
    },
}

/// Popup anchored above its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePopup<'a> {
    pub id: MarkerId,
    pub anchor: Point,
    pub spec: &'a MarkerSpec,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene<'a> {
    pub items: Vec<SceneItem<'a>>,
    pub popups: Vec<ScenePopup<'a>>,
}

/// What sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Marker(MarkerId),
    Cluster(LatLng),
}

#[derive(Debug, Clone)]
pub struct MapCanvas {
    view: CameraView,
    width: f64,
    height: f64,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    next_id: u64,
    cluster_layer: Option<ClusterLayer>,
    clustering_available: bool,
    open_popups: BTreeSet<MarkerId>,
}

impl MapCanvas {
    pub fn new(width: f64, height: f64, view: CameraView) -> Self {
        Self {
            view: CameraView {
                center: view.center,
                zoom: projection::clamp_zoom(view.zoom),
            },
            width: width.max(1.0),
            height: height.max(1.0),
            markers: BTreeMap::new(),
            next_id: 1,
            cluster_layer: None,
            clustering_available: true,
            open_popups: BTreeSet::new(),
        }
    }

    /// Build a canvas that reports no clustering capability.
    pub fn without_clustering(mut self) -> Self {
        self.clustering_available = false;
        self
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MarkerSpec> {
        self.markers.get(&id).map(|m| &m.spec)
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &MarkerSpec)> {
        self.markers.iter().map(|(id, m)| (*id, &m.spec))
    }

    pub fn has_cluster_layer(&self) -> bool {
        self.cluster_layer.is_some()
    }

    /// Target of a popup's "view node" action.
    pub fn popup_target(&self, id: MarkerId) -> Option<&crate::route::NodeLink> {
        self.markers.get(&id).map(|m| &m.spec.link)
    }

    pub fn close_popup(&mut self, id: MarkerId) {
        self.open_popups.remove(&id);
    }

    /// Drag the map by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let c = projection::project(self.view.center, self.view.zoom);
        self.view.center = projection::unproject(
            Point {
                x: c.x - dx,
                y: c.y - dy,
            },
            self.view.zoom,
        );
    }

    /// Zoom by `delta` keeping the coordinate under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, delta: f64) {
        let target = projection::clamp_zoom(self.view.zoom + delta);
        if target == self.view.zoom {
            return;
        }
        let under = projection::from_screen(anchor, self.view, self.width, self.height);
        self.view.zoom = target;
        let moved = projection::to_screen(under, self.view, self.width, self.height);
        self.pan(anchor.x - moved.x, anchor.y - moved.y);
    }

    /// Step into a clicked cluster.
    pub fn cluster_clicked(&mut self, center: LatLng) {
        if self.view.zoom < CLUSTER_CLICK_MAX_ZOOM {
            self.view = CameraView {
                center,
                zoom: projection::clamp_zoom(self.view.zoom + CLUSTER_CLICK_ZOOM_STEP),
            };
        }
    }

    fn clusters(&self) -> Vec<Cluster> {
        let Some(layer) = &self.cluster_layer else {
            return Vec::new();
        };
        let members: Vec<(MarkerId, LatLng)> = self
            .markers
            .iter()
            .filter(|(_, m)| m.clustered)
            .map(|(id, m)| (*id, m.spec.position))
            .collect();
        cluster_markers(&members, self.view.zoom, &layer.options)
    }

    fn screen(&self, p: LatLng) -> Point {
        projection::to_screen(p, self.view, self.width, self.height)
    }

    /// Everything to draw this frame.
    pub fn scene(&self) -> Scene<'_> {
        let mut items = Vec::with_capacity(self.markers.len());

        for (id, m) in self.markers.iter().filter(|(_, m)| !m.clustered) {
            items.push(SceneItem::Marker {
                id: *id,
                pos: self.screen(m.spec.position),
                spec: &m.spec,
            });
        }

        for cluster in self.clusters() {
            if cluster.is_single() {
                let id = cluster.members[0];
                if let Some(m) = self.markers.get(&id) {
                    items.push(SceneItem::Marker {
                        id,
                        pos: self.screen(m.spec.position),
                        spec: &m.spec,
                    });
                }
            } else {
                items.push(SceneItem::Cluster {
                    pos: self.screen(cluster.center),
                    count: cluster.len(),
                    center: cluster.center,
                });
            }
        }

        let popups = self
            .open_popups
            .iter()
            .filter_map(|id| {
                self.markers.get(id).map(|m| ScenePopup {
                    id: *id,
                    anchor: self.screen(m.spec.position),
                    spec: &m.spec,
                })
            })
            .collect();

        Scene { items, popups }
    }

    /// Topmost marker or cluster under a screen position.
    pub fn hit_test(&self, pos: Point) -> Option<Hit> {
        let scene = self.scene();
        scene.items.iter().rev().find_map(|item| match item {
            SceneItem::Marker { id, pos: p, .. } => {
                within(*p, pos, MARKER_HIT_RADIUS).then_some(Hit::Marker(*id))
            }
            SceneItem::Cluster { pos: p, center, .. } => {
                within(*p, pos, CLUSTER_HIT_RADIUS).then_some(Hit::Cluster(*center))
            }
        })
    }

    fn insert(&mut self, spec: MarkerSpec, clustered: bool) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(id, PlacedMarker { spec, clustered });
        id
    }

    fn validate(spec: &MarkerSpec) -> Result<(), MapError> {
        let p = spec.position;
        if !p.lat.is_finite() || !p.lng.is_finite() {
            return Err(MapError::Rejected {
                node_id: spec.node_id.clone(),
                reason: "non-finite position".into(),
            });
        }
        Ok(())
    }
}

fn within(a: Point, b: Point, r: f64) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy <= r * r
}

impl MapSurface for MapCanvas {
    fn view(&self) -> CameraView {
        self.view
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.view = CameraView {
            center,
            zoom: projection::clamp_zoom(zoom),
        };
    }

    fn fit_bounds(&mut self, bounds: LatLngBounds, options: FitOptions) {
        self.view = projection::fit_view(
            bounds,
            self.width,
            self.height,
            options.padding_px,
            options.max_zoom,
        );
    }

    fn visible_bounds(&self) -> LatLngBounds {
        projection::visible_bounds(self.view, self.width, self.height)
    }

    fn viewport_height(&self) -> f64 {
        self.height
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError> {
        Self::validate(&marker)?;
        Ok(self.insert(marker, false))
    }

    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError> {
        self.markers
            .remove(&id)
            .map(|_| {
                self.open_popups.remove(&id);
            })
            .ok_or(MapError::UnknownMarker(id))
    }

    fn supports_clustering(&self) -> bool {
        self.clustering_available
    }

    fn add_cluster_layer(&mut self, options: ClusterOptions) -> Result<(), MapError> {
        if !self.clustering_available {
            return Err(MapError::ClusteringUnsupported);
        }
        self.cluster_layer = Some(ClusterLayer { options });
        Ok(())
    }

    fn add_to_cluster(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError> {
        if self.cluster_layer.is_none() {
            return Err(MapError::NoClusterLayer);
        }
        Self::validate(&marker)?;
        Ok(self.insert(marker, true))
    }

    fn clear_cluster_layer(&mut self) -> Result<(), MapError> {
        if self.cluster_layer.is_none() {
            return Err(MapError::NoClusterLayer);
        }
        let clustered: Vec<MarkerId> = self
            .markers
            .iter()
            .filter(|(_, m)| m.clustered)
            .map(|(id, _)| *id)
            .collect();
        for id in clustered {
            self.markers.remove(&id);
            self.open_popups.remove(&id);
        }
        Ok(())
    }

    fn open_popup(&mut self, id: MarkerId) -> Result<(), MapError> {
        if !self.markers.contains_key(&id) {
            return Err(MapError::UnknownMarker(id));
        }
        self.open_popups.insert(id);
        Ok(())
    }

    fn close_popups(&mut self) {
        self.open_popups.clear();
    }

    fn open_popup_ids(&self) -> Vec<MarkerId> {
        self.open_popups.iter().copied().collect()
    }
}
