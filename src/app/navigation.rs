//! Navigation methods for `ViewerApp`.
//!
//! Covers the background data load (`reload`, `check_load`) and routing
//! input (`go_back`, `go_forward`, `navigate`, `pump_routes`). Route changes
//! are only ever sent as messages; the session's router applies them.

use std::sync::{mpsc, Arc};

use eframe::egui;

use meshview::net::source;
use meshview::Session;

use super::ViewerApp;

impl ViewerApp {
    /// Start loading the site data on a worker thread.
    pub fn reload(&mut self, ctx: &egui::Context) {
        if self.loading {
            return;
        }
        self.loading = true;
        self.error = None;

        // Keep the current route across reloads.
        if let Some(session) = &self.session {
            self.address = session.current_url().to_string();
        }

        let (tx, rx) = mpsc::channel();
        self.load_rx = Some(rx);

        let config = self.config.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let loaded = source::load(&config);
            let _ = tx.send(loaded);
            ctx.request_repaint();
        });
    }

    /// Poll the load channel and start a session when data arrives.
    pub fn check_load(&mut self) {
        let Some(rx) = &self.load_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(loaded) => {
                let engine = self.config.engine.clone().with_path_prefix(&loaded.prefix);
                if loaded.dataset.is_empty() {
                    self.error = Some("No node data could be loaded.".to_string());
                }
                let session = Session::new(Arc::new(loaded.dataset), engine, &self.address);
                self.address = session.current_url().to_string();
                self.session = Some(session);
                self.loading = false;
                self.load_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                log::error!("data loader exited without a result");
                self.error = Some("Loading failed.".to_string());
                self.loading = false;
                self.load_rx = None;
            }
        }
    }

    /// Apply queued route messages; keeps the address bar on the route.
    pub fn pump_routes(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let changed = session.pump();
        if changed || self.resync_address {
            self.address = session.current_url().to_string();
            self.resync_address = false;
        }
        changed
    }

    pub fn go_back(&mut self) {
        if let Some(session) = &self.session {
            session.sender().back();
            self.resync_address = true;
        }
    }

    pub fn go_forward(&mut self) {
        if let Some(session) = &self.session {
            session.sender().forward();
            self.resync_address = true;
        }
    }

    /// Navigate to whatever is typed in the address bar.
    pub fn navigate(&mut self) {
        if let Some(session) = &self.session {
            session.sender().navigate(self.address.trim());
            self.resync_address = true;
        }
    }

    pub fn show_list(&mut self) {
        if let Some(session) = &self.session {
            session.sender().show_list();
        }
    }
}
