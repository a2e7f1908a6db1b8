//! Toolbar rendering for `ViewerApp`.
//!
//! Draws back/forward, the address bar, the list shortcut, reload and the
//! details panel toggle.

use eframe::egui;

use super::ViewerApp;

impl ViewerApp {
    /// Render the top toolbar strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);

            // Back / Forward
            let (can_back, can_fwd) = self
                .session
                .as_ref()
                .map(|s| (s.can_go_back(), s.can_go_forward()))
                .unwrap_or((false, false));
            if ui
                .add_enabled(
                    can_back,
                    egui::Button::new("\u{25C0}").min_size(egui::vec2(28.0, 24.0)),
                )
                .clicked()
            {
                self.go_back();
            }
            if ui
                .add_enabled(
                    can_fwd,
                    egui::Button::new("\u{25B6}").min_size(egui::vec2(28.0, 24.0)),
                )
                .clicked()
            {
                self.go_forward();
            }

            // Address bar
            let response = ui.add_sized(
                [(ui.available_width() - 220.0).max(120.0), 24.0],
                egui::TextEdit::singleline(&mut self.address)
                    .hint_text("/nodes/")
                    .font(egui::TextStyle::Monospace),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.navigate();
            }
            if ui.button("Go").clicked() {
                self.navigate();
            }

            let in_detail = self
                .session
                .as_ref()
                .is_some_and(|s| s.route().is_detail());
            if ui.add_enabled(in_detail, egui::Button::new("List")).clicked() {
                self.show_list();
            }

            if ui
                .add_enabled(!self.loading, egui::Button::new("\u{27F3}"))
                .on_hover_text("Reload data")
                .clicked()
            {
                self.reload(ctx);
            }

            ui.toggle_value(&mut self.show_stats, "Details");
        });
    }
}
