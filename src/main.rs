mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::RedBusApp;
use eframe::egui;
use redbus_dashboard::DashboardConfig;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("{e}; falling back to defaults");
        DashboardConfig::default()
    });
    if let Some(path) = std::env::args_os().nth(1) {
        config.source = PathBuf::from(path);
    }

    // One load per session, before the first frame.
    let mut state = AppState::new(config);
    let source = state.config.source.clone();
    state.load_from(&source);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "RED BUS",
        options,
        Box::new(|cc| {
            // Install image loaders so the home banner can be shown.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(RedBusApp::new(state)))
        }),
    )
}
