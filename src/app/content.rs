//! Content-area rendering for `ViewerApp`.
//!
//! - `draw_content`     — top-level dispatcher (spinner, notice, map)
//! - `draw_map`         — paints the canvas scene and feeds input back
//! - `draw_stats_panel` — right-side node detail and site statistics

use eframe::egui;

use meshview::map::canvas::{Hit, MapCanvas, SceneItem};
use meshview::map::projection::Point;
use meshview::map::{MapSurface, MarkerId, MarkerStatus};
use meshview::model::stats::format_join_date;
use meshview::route::NodeLink;

use super::ViewerApp;

const MARKER_RADIUS: f32 = 7.0;
const CLUSTER_RADIUS: f32 = 16.0;
/// Scroll distance that zooms by one level.
const SCROLL_PER_ZOOM: f64 = 120.0;

fn status_color(status: MarkerStatus) -> egui::Color32 {
    let [r, g, b] = status.rgb();
    egui::Color32::from_rgb(r, g, b)
}

fn to_point(rect: egui::Rect, pos: egui::Pos2) -> Point {
    Point {
        x: (pos.x - rect.min.x) as f64,
        y: (pos.y - rect.min.y) as f64,
    }
}

fn to_pos(rect: egui::Rect, p: Point) -> egui::Pos2 {
    egui::pos2(rect.min.x + p.x as f32, rect.min.y + p.y as f32)
}

/// What a popup asked for this frame.
enum PopupAction {
    View(NodeLink),
    Close(MarkerId),
}

impl ViewerApp {
    // ── Main content dispatcher ──────────────────────────────────────────────

    /// Render the central content panel.
    pub fn draw_content(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.loading && self.session.is_none() {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        }

        if let Some(ref error) = self.error {
            ui.colored_label(egui::Color32::from_rgb(239, 68, 68), error);
        }

        if self.session.is_some() {
            self.draw_map(ui, ctx);
        } else {
            ui.centered_and_justified(|ui| {
                ui.label("Press \u{27F3} to load node data");
            });
        }
    }

    // ── Map viewport ─────────────────────────────────────────────────────────

    pub fn draw_map(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        // The first frame with a laid-out rect is the map-ready signal.
        if !session.is_map_ready() {
            let canvas = MapCanvas::new(
                rect.width() as f64,
                rect.height() as f64,
                session.initial_view(),
            );
            session.attach_map(canvas);
        }
        let sender = session.sender();
        let Some(canvas) = session.surface_mut() else {
            return;
        };
        canvas.resize(rect.width() as f64, rect.height() as f64);

        // Input
        if response.dragged() {
            let d = response.drag_delta();
            canvas.pan(d.x as f64, d.y as f64);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    canvas.zoom_at(to_point(rect, pos), scroll as f64 / SCROLL_PER_ZOOM);
                }
            }
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match canvas.hit_test(to_point(rect, pos)) {
                    Some(Hit::Marker(id)) => {
                        if let Err(e) = canvas.open_popup(id) {
                            log::warn!("{}", e);
                        }
                    }
                    Some(Hit::Cluster(center)) => canvas.cluster_clicked(center),
                    None => {}
                }
            }
        }

        // Paint
        let visuals = ui.visuals();
        painter.rect_filled(rect, 0.0, visuals.extreme_bg_color);
        let text_color = visuals.text_color();
        let outline = egui::Stroke::new(1.5, visuals.window_stroke.color);

        let scene = canvas.scene();
        for item in &scene.items {
            match item {
                SceneItem::Marker { pos, spec, .. } => {
                    let center = to_pos(rect, *pos);
                    painter.circle(center, MARKER_RADIUS, status_color(spec.status), outline);
                    painter.text(
                        center + egui::vec2(MARKER_RADIUS + 3.0, 0.0),
                        egui::Align2::LEFT_CENTER,
                        &spec.label,
                        egui::FontId::proportional(11.0),
                        text_color,
                    );
                }
                SceneItem::Cluster { pos, count, .. } => {
                    let center = to_pos(rect, *pos);
                    painter.circle(
                        center,
                        CLUSTER_RADIUS,
                        egui::Color32::from_rgba_unmultiplied(16, 185, 129, 180),
                        outline,
                    );
                    painter.text(
                        center,
                        egui::Align2::CENTER_CENTER,
                        count.to_string(),
                        egui::FontId::proportional(13.0),
                        egui::Color32::WHITE,
                    );
                }
            }
        }

        // Popups
        let mut actions = Vec::new();
        for popup in &scene.popups {
            let anchor = to_pos(rect, popup.anchor);
            if !rect.contains(anchor) {
                continue;
            }
            egui::Area::new(egui::Id::new(("popup", popup.id.0)))
                .fixed_pos(anchor + egui::vec2(-90.0, -MARKER_RADIUS - 86.0))
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_width(180.0);
                        ui.horizontal(|ui| {
                            ui.strong(popup.spec.popup.title.as_str());
                            if ui.small_button("\u{2715}").clicked() {
                                actions.push(PopupAction::Close(popup.id));
                            }
                        });
                        ui.label(format!("Owner: {}", popup.spec.popup.owner));
                        ui.colored_label(
                            status_color(popup.spec.status),
                            popup.spec.status.label(),
                        );
                        if ui.button("View node").clicked() {
                            actions.push(PopupAction::View(popup.spec.link.clone()));
                        }
                    });
                });
        }
        drop(scene);

        for action in actions {
            match action {
                PopupAction::View(link) => sender.select(link),
                PopupAction::Close(id) => canvas.close_popup(id),
            }
        }
    }

    // ── Detail / stats side panel ────────────────────────────────────────────

    /// Render the right-side panel: the routed node, then site totals.
    pub fn draw_stats_panel(&self, ui: &mut egui::Ui) {
        let Some(session) = &self.session else {
            return;
        };

        if let Some(node) = session.current_node() {
            ui.heading(node.display_name());
            ui.separator();
            egui::Grid::new("node_detail")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    let rows = [
                        ("ID", node.id.clone()),
                        ("Area", node.area.clone()),
                        ("Hardware", node.hardware.clone()),
                        ("Role", node.mesh_role.clone()),
                        ("Owner", session.owner_name(node).to_string()),
                        ("Status", MarkerStatus::of(node).label().to_string()),
                    ];
                    for (key, value) in rows {
                        ui.label(key);
                        ui.label(value);
                        ui.end_row();
                    }
                    if let Some(pos) = node.coordinates() {
                        ui.label("Location");
                        ui.label(format!("{:.5}, {:.5}", pos.lat, pos.lng));
                        ui.end_row();
                    }
                    if let Some(elevation) = node.elevation {
                        ui.label("Elevation");
                        ui.label(format!("{:.0} m", elevation));
                        ui.end_row();
                    }
                });

            let owner = node
                .member_id
                .as_deref()
                .and_then(|id| session.data().members.iter().find(|m| m.id == id));
            if let Some(member) = owner {
                ui.add_space(6.0);
                ui.label(format!(
                    "Member since {}",
                    format_join_date(member.join_date.as_deref())
                ));
            }

            ui.add_space(8.0);
            if ui.button("\u{2190} All nodes").clicked() {
                session.sender().show_list();
            }
            ui.separator();
        }

        let stats = session.stats();
        ui.heading("Network");
        ui.label(format!("Nodes: {}", stats.total_nodes));
        ui.label(format!("Members: {}", stats.total_members));
        ui.label(format!("Coverage: ~{} km\u{00B2}", stats.coverage_area_km2));

        ui.separator();
        egui::CollapsingHeader::new("Members")
            .default_open(false)
            .show(ui, |ui| {
                for row in session.member_rows() {
                    let label = ui.label(format!("{} ({} nodes)", row.name, row.node_count));
                    let mut hover = Vec::new();
                    if !row.joined.is_empty() {
                        hover.push(format!("Member since {}", row.joined));
                    }
                    if let Some(avatar) = &row.avatar_url {
                        hover.push(format!("Avatar: {}", avatar));
                    }
                    if !hover.is_empty() {
                        label.on_hover_text(hover.join("\n"));
                    }
                }
            });

        let view = session.map_view_state();
        ui.separator();
        ui.weak(format!(
            "{:.4}, {:.4} @ z{:.1} \u{00B7} {} markers",
            view.center.lat,
            view.center.lng,
            view.zoom,
            view.visible_markers.len()
        ));
    }
}
