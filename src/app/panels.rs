//! Filter controls and the node list for `ViewerApp`.

use eframe::egui;

use meshview::filter::FilterCriteria;
use meshview::map::MarkerStatus;
use meshview::Node;

use super::ViewerApp;

const ALL: &str = "All";

fn status_color(node: &Node) -> egui::Color32 {
    let [r, g, b] = MarkerStatus::of(node).rgb();
    egui::Color32::from_rgb(r, g, b)
}

/// Dropdown bound to an optional string; `None` is shown as "All".
fn choice(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut Option<String>,
    options: &[(String, String)],
) {
    ui.label(label);
    let selected = value
        .as_deref()
        .and_then(|v| options.iter().find(|(key, _)| key == v))
        .map(|(_, text)| text.as_str())
        .unwrap_or(ALL);
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected)
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            ui.selectable_value(value, None, ALL);
            for (key, text) in options {
                ui.selectable_value(value, Some(key.clone()), text.as_str());
            }
        });
}

impl ViewerApp {
    /// Left panel: filters, counts, then the filtered node list.
    pub fn draw_filter_panel(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.session.as_mut() else {
            ui.label("No data");
            return;
        };

        ui.heading("Nodes");
        ui.separator();

        let options = session.options().clone();
        let as_pairs = |values: &[String]| -> Vec<(String, String)> {
            values.iter().map(|v| (v.clone(), v.clone())).collect()
        };
        let owners: Vec<(String, String)> = options
            .owners
            .iter()
            .map(|id| (id.clone(), session.data().owner_name(Some(id.as_str())).to_string()))
            .collect();

        let mut criteria: FilterCriteria = session.criteria().clone();
        choice(ui, "hardware", "Hardware", &mut criteria.hardware, &as_pairs(&options.hardware));
        choice(ui, "role", "Role", &mut criteria.mesh_role, &as_pairs(&options.mesh_roles));
        choice(ui, "owner", "Owner", &mut criteria.member_id, &owners);
        ui.checkbox(&mut criteria.online_only, "Online only");
        ui.checkbox(&mut criteria.include_testing, "Include testing nodes");
        if &criteria != session.criteria() {
            session.set_criteria(criteria);
        }

        ui.separator();
        ui.label(format!(
            "{} shown \u{00B7} {} online \u{00B7} {} repeaters",
            session.filtered().len(),
            session.online_count(),
            session.repeater_count()
        ));
        ui.separator();

        let sender = session.sender();
        let current = session.current_node().map(|n| n.id.clone());
        egui::ScrollArea::vertical().show(ui, |ui| {
            for node in session.filtered() {
                let selected = current.as_deref() == Some(node.id.as_str());
                let text = egui::RichText::new(format!(
                    "{}  ({})",
                    node.display_name(),
                    session.owner_name(node)
                ))
                .color(status_color(node));
                if ui
                    .selectable_label(selected, text)
                    .on_hover_text(node.id.as_str())
                    .clicked()
                {
                    sender.select_node(node);
                }
            }
            if session.filtered().is_empty() {
                ui.weak("No nodes match the filters.");
            }
        });
    }
}
