//! `ViewerApp` — the top-level egui application state.
//!
//! This module declares the `ViewerApp` struct and its constructor.
//! All methods are split across the sibling sub-modules:
//!
//! - `navigation` — background data load, route messages, history buttons
//! - `toolbar`    — address bar and controls
//! - `panels`     — filter controls and the node list
//! - `content`    — the map viewport and the detail / stats panel

pub mod content;
pub mod navigation;
pub mod panels;
pub mod toolbar;

use std::sync::mpsc;

use meshview::map::canvas::MapCanvas;
use meshview::net::source::Loaded;
use meshview::{Session, ViewerConfig};

// ─── Application state ───────────────────────────────────────────────────────

pub struct ViewerApp {
    pub config: ViewerConfig,
    /// Text in the address bar; follows the route unless being edited.
    pub address: String,
    /// Rewrite the address bar after the next pump even if the route did
    /// not change (redirects, rejected input).
    pub resync_address: bool,
    pub session: Option<Session<MapCanvas>>,
    pub error: Option<String>,
    pub loading: bool,
    pub load_rx: Option<mpsc::Receiver<Loaded>>,
    pub show_stats: bool,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            address: config.start_url.clone(),
            resync_address: false,
            config,
            session: None,
            error: None,
            loading: false,
            load_rx: None,
            show_stats: true,
        }
    }
}
