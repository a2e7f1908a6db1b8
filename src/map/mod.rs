//! Map-facing types and the surface contract the reconciler drives.
//!
//! - `projection` — Web-Mercator maths (pixels ↔ coordinates, fit zoom)
//! - `cluster`    — pixel-radius marker grouping
//! - `canvas`     — renderer-agnostic `MapSurface` implementation
//! - `reconciler` — keeps markers in step with the filtered node set

pub mod projection;
pub mod cluster;
pub mod canvas;
pub mod reconciler;

use serde::{Deserialize, Serialize};

use crate::model::{owner_name, Member, Node};
use crate::route::NodeLink;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned coordinate box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Smallest box covering every point; `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lng);
        self.east = self.east.max(p.lng);
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) * 0.5,
            (self.west + self.east) * 0.5,
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }
}

/// Camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub padding_px: f64,
    pub max_zoom: f64,
}

/// Clustering container settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    /// Markers closer than this (screen pixels) share a cluster.
    pub max_cluster_radius_px: f64,
    /// At or above this zoom every marker stands alone.
    pub disable_clustering_at_zoom: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_cluster_radius_px: 50.0,
            disable_clustering_at_zoom: 16.0,
        }
    }
}

/// Handle for a marker placed on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

/// Marker colour class. Testing wins over online/offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStatus {
    Testing,
    Online,
    Offline,
}

impl MarkerStatus {
    pub fn of(node: &Node) -> Self {
        if node.is_testing() {
            MarkerStatus::Testing
        } else if node.is_online() {
            MarkerStatus::Online
        } else {
            MarkerStatus::Offline
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            MarkerStatus::Testing => [0xf5, 0x9e, 0x0b],
            MarkerStatus::Online => [0x10, 0xb9, 0x81],
            MarkerStatus::Offline => [0xef, 0x44, 0x44],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarkerStatus::Testing => "Testing",
            MarkerStatus::Online => "Online",
            MarkerStatus::Offline => "Offline",
        }
    }
}

/// Popup body bound to a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub owner: String,
}

/// Everything a surface needs to draw one node.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub node_id: String,
    pub position: LatLng,
    pub status: MarkerStatus,
    /// Permanent label next to the marker.
    pub label: String,
    pub popup: PopupContent,
    /// Where the popup's "view node" action leads. Owned per marker so two
    /// markers never share a target.
    pub link: NodeLink,
}

impl MarkerSpec {
    /// Build the marker for a node, or `None` if the node is not mappable.
    pub fn for_node(node: &Node, members: &[Member]) -> Option<Self> {
        if !node.show_on_map {
            return None;
        }
        let position = node.coordinates()?;
        Some(Self {
            node_id: node.id.clone(),
            position,
            status: MarkerStatus::of(node),
            label: node.id.clone(),
            popup: PopupContent {
                title: node.display_name().to_string(),
                owner: owner_name(members, node.member_id.as_deref()).to_string(),
            },
            link: NodeLink::of(node),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("unknown marker {0:?}")]
    UnknownMarker(MarkerId),
    #[error("surface has no clustering support")]
    ClusteringUnsupported,
    #[error("no cluster layer attached")]
    NoClusterLayer,
    #[error("marker for {node_id} rejected: {reason}")]
    Rejected { node_id: String, reason: String },
}

/// Operations a map widget offers to the reconciler.
///
/// The reconciler is the only writer; everything else reads through it.
pub trait MapSurface {
    fn view(&self) -> CameraView;
    fn set_view(&mut self, center: LatLng, zoom: f64);
    fn fit_bounds(&mut self, bounds: LatLngBounds, options: FitOptions);
    /// Coordinates currently on screen.
    fn visible_bounds(&self) -> LatLngBounds;
    /// Height of the map viewport in pixels.
    fn viewport_height(&self) -> f64;

    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError>;
    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError>;

    /// Capability probe; checked once per session.
    fn supports_clustering(&self) -> bool;
    fn add_cluster_layer(&mut self, options: ClusterOptions) -> Result<(), MapError>;
    fn add_to_cluster(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError>;
    /// Remove every marker held by the cluster layer.
    fn clear_cluster_layer(&mut self) -> Result<(), MapError>;

    fn open_popup(&mut self, id: MarkerId) -> Result<(), MapError>;
    fn close_popups(&mut self);
    fn open_popup_ids(&self) -> Vec<MarkerId>;

    /// Re-read the container size after layout changes.
    fn invalidate_size(&mut self) {}
}
