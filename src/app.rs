use eframe::egui;

use crate::state::{AppState, Page, Tab};
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RedBusApp {
    pub state: AppState,
}

impl RedBusApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RedBusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: menu + filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: home page or analysis tabs ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.page {
            Page::Home => panels::home_page(ui, &self.state),
            Page::BusAnalysis => {
                if self.state.route_listings.is_empty() {
                    ui.label("No data available for the selected route.");
                    return;
                }
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.state.tab, Tab::Details, "Bus Details");
                    ui.selectable_value(&mut self.state.tab, Tab::Charts, "Chart Analysis");
                });
                ui.separator();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| match self.state.tab {
                        Tab::Details => table::details_tab(ui, &self.state),
                        Tab::Charts => charts::charts_tab(ui, &self.state),
                    });
            }
        });
    }
}
