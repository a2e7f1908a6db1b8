//! Marker reconciliation and camera control.
//!
//! `MarkerReconciler` is the single writer of a map surface's marker layer.
//! Every `sync` tears the previous marker set down and rebuilds it from the
//! filtered nodes; node counts are small enough that a full rebuild beats
//! diffing for correctness.
//!
//! The surface arrives late (the widget has to be laid out first). Until
//! [`MarkerReconciler::attach`] is called, camera requests are queued and
//! the latest marker set is remembered; attaching replays both in order.

use std::collections::VecDeque;

use crate::config::CameraTuning;
use crate::model::{Member, Node};

use super::{
    CameraView, ClusterOptions, FitOptions, LatLng, LatLngBounds, MapSurface, MarkerId,
    MarkerSpec,
};

/// Camera operations the route state machine may request.
pub trait MapController {
    /// Centre on a node with popup clearance and open its popup.
    fn focus_on(&mut self, node: &Node);
    /// Frame every visible marker.
    fn fit_to_visible(&mut self);
    fn close_popups(&mut self);
}

/// Requests issued before the surface was ready.
#[derive(Debug, Clone, PartialEq)]
enum Deferred {
    Focus(Node),
    Fit,
    ClosePopups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clustering {
    /// Not probed yet (no surface).
    Unknown,
    Active,
    Unavailable,
}

#[derive(Debug, Clone)]
struct RenderedMarker {
    node_id: String,
    id: MarkerId,
    position: LatLng,
}

pub struct MarkerReconciler<S: MapSurface> {
    surface: Option<S>,
    clustering: Clustering,
    cluster_options: ClusterOptions,
    tuning: CameraTuning,
    /// Marker specs for the last synced node set, in filter order.
    targets: Vec<MarkerSpec>,
    rendered: Vec<RenderedMarker>,
    pending: VecDeque<Deferred>,
    focused: Option<String>,
}

impl<S: MapSurface> MarkerReconciler<S> {
    pub fn new(tuning: CameraTuning, cluster_options: ClusterOptions) -> Self {
        Self {
            surface: None,
            clustering: Clustering::Unknown,
            cluster_options,
            tuning,
            targets: Vec::new(),
            rendered: Vec::new(),
            pending: VecDeque::new(),
            focused: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Number of queued camera operations.
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }

    pub fn clustering_active(&self) -> bool {
        self.clustering == Clustering::Active
    }

    /// Node id of the popup focused by the last detail activation.
    pub fn focused_node(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Node ids that currently have a marker, in filter order.
    pub fn rendered_node_ids(&self) -> Vec<&str> {
        self.rendered.iter().map(|m| m.node_id.as_str()).collect()
    }

    /// Node whose popup is open, if any; the focused one wins.
    pub fn open_popup_node(&self) -> Option<&str> {
        let surface = self.surface.as_ref()?;
        let open = surface.open_popup_ids();
        if let Some(focused) = self.focused.as_deref() {
            if self
                .marker_for(focused)
                .is_some_and(|id| open.contains(&id))
            {
                return Some(focused);
            }
        }
        open.iter()
            .find_map(|id| self.rendered.iter().find(|m| m.id == *id))
            .map(|m| m.node_id.as_str())
    }

    pub fn camera(&self) -> Option<CameraView> {
        self.surface.as_ref().map(|s| s.view())
    }

    fn marker_for(&self, node_id: &str) -> Option<MarkerId> {
        self.rendered
            .iter()
            .find(|m| m.node_id == node_id)
            .map(|m| m.id)
    }

    /// Readiness signal: take ownership of the surface, probe clustering
    /// once, render the remembered marker set and replay queued requests.
    pub fn attach(&mut self, mut surface: S) {
        self.clustering = if surface.supports_clustering() {
            match surface.add_cluster_layer(self.cluster_options) {
                Ok(()) => Clustering::Active,
                Err(e) => {
                    log::warn!("cluster layer unavailable, using plain markers: {}", e);
                    Clustering::Unavailable
                }
            }
        } else {
            log::info!("map surface has no clustering, using plain markers");
            Clustering::Unavailable
        };
        self.surface = Some(surface);
        self.render();

        let queued: Vec<Deferred> = self.pending.drain(..).collect();
        if !queued.is_empty() {
            log::debug!("replaying {} deferred map operations", queued.len());
        }
        for op in queued {
            match op {
                Deferred::Focus(node) => self.focus_on(&node),
                Deferred::Fit => self.fit_to_visible(),
                Deferred::ClosePopups => self.close_popups(),
            }
        }
    }

    /// Replace the marker layer with one marker per mappable node.
    pub fn sync(&mut self, filtered: &[Node], members: &[Member]) {
        self.targets = filtered
            .iter()
            .filter_map(|n| MarkerSpec::for_node(n, members))
            .collect();
        self.render();
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        // Clear everything from the previous pass. A failed layer clear
        // falls back to removing markers one by one.
        let previous = std::mem::take(&mut self.rendered);
        let cleared = self.clustering == Clustering::Active
            && match surface.clear_cluster_layer() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("failed to clear cluster layer: {}", e);
                    false
                }
            };
        if !cleared {
            for marker in previous {
                if let Err(e) = surface.remove_marker(marker.id) {
                    log::warn!("failed to remove marker for {}: {}", marker.node_id, e);
                }
            }
        }

        for spec in &self.targets {
            let node_id = spec.node_id.clone();
            let added = if self.clustering == Clustering::Active {
                surface.add_to_cluster(spec.clone())
            } else {
                surface.add_marker(spec.clone())
            };
            match added {
                Ok(id) => self.rendered.push(RenderedMarker {
                    node_id,
                    id,
                    position: spec.position,
                }),
                Err(e) => log::warn!("failed to add marker for {}: {}", node_id, e),
            }
        }

        // The focused popup outlives a rebuild while its node keeps a marker.
        if let Some(focused) = self.focused.take() {
            let marker = self
                .rendered
                .iter()
                .find(|m| m.node_id == focused)
                .map(|m| m.id);
            match marker {
                Some(id) => match surface.open_popup(id) {
                    Ok(()) => self.focused = Some(focused),
                    Err(e) => log::warn!("could not reopen popup for {}: {}", focused, e),
                },
                None => log::debug!("{} lost its marker, popup dropped", focused),
            }
        }
        log::debug!(
            "rendered {} of {} markers",
            self.rendered.len(),
            self.targets.len()
        );
    }

    fn visible_points(&self) -> Vec<LatLng> {
        self.rendered.iter().map(|m| m.position).collect()
    }
}

/// Latitude shift that moves the focused node below the vertical midpoint
/// so its popup clears the page chrome above the map.
///
/// `min(max_px, ratio · height)` pixels, converted with the latitude span
/// the surface currently shows per pixel of height.
fn popup_clearance<S: MapSurface>(tuning: &CameraTuning, surface: &S) -> f64 {
    let height = surface.viewport_height();
    if height <= 0.0 || !height.is_finite() {
        return 0.0;
    }
    let offset_px = tuning
        .popup_clearance_max_px
        .min(height * tuning.popup_clearance_ratio);
    let lat_per_px = surface.visible_bounds().lat_span() / height;
    let offset = lat_per_px * offset_px;
    if offset.is_finite() {
        offset
    } else {
        0.0
    }
}

impl<S: MapSurface> MapController for MarkerReconciler<S> {
    fn focus_on(&mut self, node: &Node) {
        let Some(pos) = node.coordinates() else {
            log::debug!("{} has no location, camera left alone", node.id);
            return;
        };
        let zoom = self.tuning.focus_zoom;
        let tuning = self.tuning;
        let marker = self.marker_for(&node.id);

        let Some(surface) = self.surface.as_mut() else {
            self.pending.push_back(Deferred::Focus(node.clone()));
            return;
        };
        surface.invalidate_size();
        surface.set_view(pos, zoom);
        let offset = popup_clearance(&tuning, surface);
        surface.set_view(LatLng::new(pos.lat - offset, pos.lng), zoom);

        match marker {
            Some(id) => match surface.open_popup(id) {
                Ok(()) => self.focused = Some(node.id.clone()),
                Err(e) => log::warn!("could not open popup for {}: {}", node.id, e),
            },
            None => log::debug!("{} is focused but has no marker", node.id),
        }
    }

    fn fit_to_visible(&mut self) {
        if self.surface.is_none() {
            self.pending.push_back(Deferred::Fit);
            return;
        }
        let points = self.visible_points();
        let tuning = self.tuning;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match points.as_slice() {
            [] => {}
            [only] => surface.set_view(*only, tuning.single_node_zoom),
            _ => {
                if let Some(bounds) = LatLngBounds::from_points(points.iter().copied()) {
                    surface.fit_bounds(
                        bounds,
                        FitOptions {
                            padding_px: tuning.fit_padding_px,
                            max_zoom: tuning.fit_max_zoom,
                        },
                    );
                }
            }
        }
    }

    fn close_popups(&mut self) {
        self.focused = None;
        match self.surface.as_mut() {
            Some(surface) => surface.close_popups(),
            None => self.pending.push_back(Deferred::ClosePopups),
        }
    }
}
