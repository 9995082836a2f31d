use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};
use redbus_dashboard::Listing;
use redbus_dashboard::data::source::COLUMNS;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// "Bus Details" tab
// ---------------------------------------------------------------------------

pub fn details_tab(ui: &mut Ui, state: &AppState) {
    let route = state.filters.route.as_deref().unwrap_or("");
    ui.label(format!("Buses for Route: {route}"));

    if state.visible.is_empty() {
        ui.label(
            "No buses available for the selected route, rating filter, departure, and arrival.",
        );
        return;
    }

    ui.strong("Buses Details:");
    let listings = state.visible.listings();

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(30.0))
            .columns(Column::auto().at_least(70.0), COLUMNS.len())
            .min_scrolled_height(0.0)
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                for name in COLUMNS {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, listings.len(), |mut row| {
                    let i = row.index();
                    row.col(|ui: &mut Ui| {
                        ui.label(i.to_string());
                    });
                    for cell in cells(&listings[i]) {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

/// Display text per column, in [`COLUMNS`] order.
fn cells(l: &Listing) -> [String; 12] {
    [
        l.bus_name.clone(),
        l.route_link.clone(),
        l.route.clone(),
        l.bus_type.clone(),
        l.departing_time.format("%Y-%m-%d %H:%M").to_string(),
        l.duration.clone(),
        l.reaching_time.format("%Y-%m-%d %H:%M").to_string(),
        format!("{:.1}", l.star_rating),
        format!("{:.2}", l.price),
        l.seat_available.to_string(),
        l.departure.clone(),
        l.arrival.clone(),
    ]
}
