mod app;

use eframe::egui;

use app::ViewerApp;
use meshview::ViewerConfig;

fn main() {
    env_logger::init();

    let mut config = ViewerConfig::from_env();
    // Optional deep link, e.g. `meshview /ip3/rep01`.
    if let Some(start) = std::env::args().nth(1) {
        config.start_url = start;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("meshview"),
        ..Default::default()
    };

    eframe::run_native(
        "meshview",
        options,
        Box::new(move |cc| {
            let mut app = ViewerApp::new(config);
            app.reload(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .expect("Failed to start meshview");
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load();
        self.pump_routes();

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui, ctx);
        });

        // Filters and node list
        egui::SidePanel::left("filters")
            .default_width(260.0)
            .show(ctx, |ui| {
                self.draw_filter_panel(ui);
            });

        // Detail / stats side panel
        if self.show_stats {
            egui::SidePanel::right("details")
                .default_width(240.0)
                .show(ctx, |ui| {
                    self.draw_stats_panel(ui);
                });
        }

        // Map
        let ctx_clone = ctx.clone();
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_content(ui, &ctx_clone);
        });

        // Messages sent by this frame's widgets are applied right away so the
        // next frame already shows their effect.
        if self.pump_routes() {
            ctx.request_repaint();
        }
    }
}
