//! Page-level owner of the view-sync engine.
//!
//! A `Session` holds the immutable dataset, the current filter criteria and
//! their result, and a [`Router`] that in turn owns the marker reconciler.
//! Filter changes and route changes both flow through here so the marker
//! layer only ever has one writer.

use std::sync::Arc;

use crate::config::{EngineConfig, FALLBACK_VIEW, INITIAL_MULTI_NODE_ZOOM};
use crate::filter::{self, FilterCriteria, FilterOptions};
use crate::map::reconciler::{MapController, MarkerReconciler};
use crate::map::{CameraView, LatLng, LatLngBounds, MapSurface};
use crate::model::stats::{self, MemberRow, SiteStats};
use crate::model::{Dataset, Node};
use crate::route::machine::{RouteSender, Router};
use crate::route::RouteState;

/// Snapshot of what the map is showing.
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewState {
    pub center: LatLng,
    pub zoom: f64,
    /// Ids of filtered nodes that have a marker.
    pub visible_markers: Vec<String>,
    pub open_popup_node_id: Option<String>,
}

pub struct Session<S: MapSurface> {
    data: Arc<Dataset>,
    config: EngineConfig,
    criteria: FilterCriteria,
    filtered: Vec<Node>,
    options: FilterOptions,
    router: Router<MarkerReconciler<S>>,
}

impl<S: MapSurface> Session<S> {
    pub fn new(data: Arc<Dataset>, config: EngineConfig, start_url: &str) -> Self {
        let criteria = FilterCriteria::default();
        let filtered = filter::apply(&data.nodes, &criteria);
        let options = FilterOptions::from_nodes(&data.nodes);

        let mut reconciler = MarkerReconciler::new(config.camera, config.cluster);
        reconciler.sync(&filtered, &data.members);

        let router = Router::new(Arc::clone(&data), &config, reconciler, start_url);
        log::info!(
            "session started with {} nodes, {} members",
            data.nodes.len(),
            data.members.len()
        );
        Self {
            data,
            config,
            criteria,
            filtered,
            options,
            router,
        }
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filtered(&self) -> &[Node] {
        &self.filtered
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn route(&self) -> &RouteState {
        self.router.state()
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.router.current_node()
    }

    pub fn current_url(&self) -> &str {
        self.router.current_url()
    }

    pub fn router(&self) -> &Router<MarkerReconciler<S>> {
        &self.router
    }

    pub fn sender(&self) -> RouteSender {
        self.router.sender()
    }

    pub fn reconciler(&self) -> &MarkerReconciler<S> {
        self.router.map()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.router.map_mut().surface_mut()
    }

    pub fn can_go_back(&self) -> bool {
        self.router.history().can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.router.history().can_go_forward()
    }

    /// Camera to create the map widget with: the centre of the located
    /// nodes, else the site config, else a fixed fallback.
    pub fn initial_view(&self) -> CameraView {
        let located: Vec<LatLng> = self
            .filtered
            .iter()
            .filter(|n| n.is_mappable())
            .filter_map(Node::coordinates)
            .collect();
        if let Some(bounds) = LatLngBounds::from_points(located.iter().copied()) {
            let zoom = if located.len() == 1 {
                self.config.camera.single_node_zoom
            } else {
                INITIAL_MULTI_NODE_ZOOM
            };
            return CameraView {
                center: bounds.center(),
                zoom,
            };
        }
        match self.data.config.location {
            Some(loc) => CameraView {
                center: loc.center,
                zoom: loc.zoom,
            },
            None => FALLBACK_VIEW,
        }
    }

    /// The map widget is laid out and ready; hand it to the reconciler.
    /// The initial route's camera effects were queued at start-up and run now.
    pub fn attach_map(&mut self, surface: S) {
        self.router.map_mut().attach(surface);
    }

    pub fn is_map_ready(&self) -> bool {
        self.router.map().is_ready()
    }

    /// Re-filter, resync markers and, in list view, refit the camera.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.criteria = criteria;
        self.filtered = filter::apply(&self.data.nodes, &self.criteria);
        self.router
            .map_mut()
            .sync(&self.filtered, &self.data.members);
        if !self.router.state().is_detail() {
            self.router.map_mut().fit_to_visible();
        }
    }

    /// Drain pending route messages. Returns whether the route changed.
    pub fn pump(&mut self) -> bool {
        self.router.pump()
    }

    pub fn map_view_state(&self) -> MapViewState {
        let reconciler = self.router.map();
        let camera = reconciler.camera().unwrap_or_else(|| self.initial_view());
        MapViewState {
            center: camera.center,
            zoom: camera.zoom,
            visible_markers: reconciler
                .rendered_node_ids()
                .into_iter()
                .map(str::to_string)
                .collect(),
            open_popup_node_id: reconciler.open_popup_node().map(str::to_string),
        }
    }

    pub fn stats(&self) -> SiteStats {
        SiteStats::from_dataset(&self.data)
    }

    /// Members with node counts and avatar URLs under the path prefix.
    pub fn member_rows(&self) -> Vec<MemberRow> {
        stats::member_rows(&self.data, &self.config.path_prefix)
    }

    pub fn online_count(&self) -> usize {
        stats::online_count(&self.filtered)
    }

    pub fn repeater_count(&self) -> usize {
        stats::repeater_count(&self.filtered)
    }

    pub fn owner_name(&self, node: &Node) -> &str {
        self.data.owner_name(node.member_id.as_deref())
    }
}
