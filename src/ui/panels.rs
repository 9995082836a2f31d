use chrono::{NaiveTime, Timelike};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use redbus_dashboard::Aggregator;

use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – menu and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: page menu, then the filters on the analysis page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Main Menu");
    ui.selectable_value(&mut state.page, Page::Home, "Home");
    ui.selectable_value(&mut state.page, Page::BusAnalysis, "Bus Analysis");
    ui.separator();

    if state.page != Page::BusAnalysis {
        return;
    }
    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            route_selector(ui, state);

            if state.route_listings.is_empty() {
                ui.label("No data available for the selected route.");
                return;
            }

            let route_stats = Aggregator::new(&state.route_listings);
            if let Some(link) = route_stats.route_link() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("Route Link:");
                    ui.hyperlink_to(link, link);
                });
            }
            match route_stats.mean_price() {
                Ok(mean) => ui.label(format!("Average Price: {mean:.2}")),
                Err(e) => ui.label(format!("Average Price: – ({e})")),
            };
            ui.separator();

            rating_sliders(ui, state);
            price_sliders(ui, state);
            time_sliders(ui, state);
        });
}

fn route_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Select Route");
    let current = state.filters.route.clone().unwrap_or_default();
    let mut picked = None;
    egui::ComboBox::from_id_salt("route")
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for route in &state.routes {
                if ui.selectable_label(current == *route, route).clicked() {
                    picked = Some(route.clone());
                }
            }
        });
    if let Some(route) = picked {
        log::debug!("route selected: {route}");
        state.select_route(&route);
    }
    ui.add_space(4.0);
}

fn rating_sliders(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Filter by Star Rating");
    let mut lo = state.filters.rating.lo;
    let mut hi = state.filters.rating.hi;
    let changed = ui
        .add(egui::Slider::new(&mut lo, 0.0..=5.0).step_by(0.1).text("min"))
        .changed()
        | ui.add(egui::Slider::new(&mut hi, 0.0..=5.0).step_by(0.1).text("max"))
            .changed();
    if changed {
        state.set_rating(lo, hi);
    }
    ui.add_space(4.0);
}

fn price_sliders(ui: &mut Ui, state: &mut AppState) {
    let Some(bounds) = state.filters.bounds else {
        return;
    };
    ui.strong("Filter by Price Range");
    let range = bounds.price.lo..=bounds.price.hi;
    let mut lo = state.filters.price.lo;
    let mut hi = state.filters.price.hi;
    let changed = ui
        .add(egui::Slider::new(&mut lo, range.clone()).step_by(0.1).text("min"))
        .changed()
        | ui.add(egui::Slider::new(&mut hi, range).step_by(0.1).text("max"))
            .changed();
    if changed {
        state.set_price(lo, hi);
    }
    ui.add_space(4.0);
}

fn time_sliders(ui: &mut Ui, state: &mut AppState) {
    let Some(bounds) = state.filters.bounds else {
        return;
    };

    ui.strong("Filter by Departing Time");
    ui.label(RichText::new(state.filters.departing.to_string()).weak());
    let (dep_lo, dep_hi) = (state.filters.departing.lo, state.filters.departing.hi);
    if let Some((lo, hi)) = time_range(ui, "departing", bounds.departing.lo, bounds.departing.hi, dep_lo, dep_hi) {
        state.set_departing(lo, hi);
    }
    ui.add_space(4.0);

    ui.strong("Filter by Reaching Time");
    ui.label(RichText::new(state.filters.reaching.to_string()).weak());
    let (reach_lo, reach_hi) = (state.filters.reaching.lo, state.filters.reaching.hi);
    if let Some((lo, hi)) = time_range(ui, "reaching", bounds.reaching.lo, bounds.reaching.hi, reach_lo, reach_hi) {
        state.set_reaching(lo, hi);
    }
}

/// Two HH:MM sliders over minutes since midnight. Returns the new pair when
/// either one moved.
fn time_range(
    ui: &mut Ui,
    id: &str,
    min: NaiveTime,
    max: NaiveTime,
    lo: NaiveTime,
    hi: NaiveTime,
) -> Option<(NaiveTime, NaiveTime)> {
    let range = minutes(min)..=minutes(max);
    let mut lo_m = minutes(lo);
    let mut hi_m = minutes(hi);
    let changed = ui
        .push_id(id, |ui: &mut Ui| {
            ui.add(
                egui::Slider::new(&mut lo_m, range.clone())
                    .custom_formatter(|v, _| format_minutes(v))
                    .text("from"),
            )
            .changed()
                | ui.add(
                    egui::Slider::new(&mut hi_m, range)
                        .custom_formatter(|v, _| format_minutes(v))
                        .text("to"),
                )
                .changed()
        })
        .inner;
    changed.then(|| (from_minutes(lo_m), from_minutes(hi_m)))
}

fn minutes(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn from_minutes(m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt((m / 60).min(23), m % 60, 0).unwrap_or(NaiveTime::MIN)
}

fn format_minutes(v: f64) -> String {
    let m = v.round() as u32;
    format!("{:02}:{:02}", m / 60, m % 60)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} listings loaded, {} visible",
                ds.len(),
                state.visible.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Home page
// ---------------------------------------------------------------------------

pub fn home_page(ui: &mut Ui, state: &AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("RedBus Data Analysis");
        ui.add_space(8.0);
        if let Some(path) = &state.config.banner_image {
            ui.add(
                egui::Image::new(format!("file://{}", path.display()))
                    .max_width(ui.available_width())
                    .rounding(4.0),
            );
        }
        ui.label(RichText::new("WELCOME TO DATA INSIGHT").italics());
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open bus listings")
        .add_filter("Supported files", &["db", "sqlite", "sqlite3", "csv", "json", "parquet", "pq"])
        .add_filter("SQLite", &["db", "sqlite", "sqlite3"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.load_from(&path);
    }
}
