use std::f64::consts::TAU;

use chrono::{NaiveDateTime, Timelike};
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points, Polygon};
use redbus_dashboard::{AggregateError, Aggregator, Bucket, Dataset, NumericField};

use crate::color::{ColorMap, generate_palette};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// "Chart Analysis" tab
// ---------------------------------------------------------------------------

pub fn charts_tab(ui: &mut Ui, state: &AppState) {
    ui.label("Visual Analysis");
    let visible = Aggregator::new(&state.visible);

    chart_title(ui, &format!("Top {} Seat Availability Across Buses", state.config.top_n));
    if state.visible.is_empty() {
        placeholder(ui, AggregateError::EmptyInput);
    } else {
        seat_availability_chart(ui, &visible.top_n_by_availability(state.config.top_n), &state.color_map);
    }

    chart_title(ui, "Distribution of Prices");
    match visible.histogram(NumericField::Price, state.config.price_bins) {
        Ok(buckets) => histogram_chart(ui, "price_hist", NumericField::Price, &buckets),
        Err(e) => placeholder(ui, e),
    }

    chart_title(ui, "Distribution of Star Ratings");
    match visible.histogram(NumericField::StarRating, state.config.rating_bins) {
        Ok(buckets) => histogram_chart(ui, "rating_hist", NumericField::StarRating, &buckets),
        Err(e) => placeholder(ui, e),
    }

    // Bus types are shown for the whole dataset, not the filtered view.
    chart_title(ui, "Distribution of Bus Types");
    let types = state
        .dataset
        .as_ref()
        .map(|ds| Aggregator::new(ds).bus_type_distribution())
        .unwrap_or_default();
    if types.is_empty() {
        placeholder(ui, AggregateError::EmptyInput);
    } else {
        pie_chart(ui, &types);
    }

    chart_title(ui, "Price vs. Star Rating");
    let points: Vec<(&str, f64, f64)> = visible.price_vs_rating();
    if points.is_empty() {
        placeholder(ui, AggregateError::EmptyInput);
    } else {
        scatter(ui, "price_vs_rating", "Star Rating", "Price", &points, &state.color_map);
    }

    chart_title(ui, "Departure vs. Arrival Time");
    let times: Vec<(&str, f64, f64)> = visible
        .departure_vs_arrival()
        .into_iter()
        .map(|(name, dep, reach)| (name, hour_of_day(&dep), hour_of_day(&reach)))
        .collect();
    if times.is_empty() {
        placeholder(ui, AggregateError::EmptyInput);
    } else {
        scatter(
            ui,
            "departure_vs_arrival",
            "Departing (hour of day)",
            "Reaching (hour of day)",
            &times,
            &state.color_map,
        );
    }
}

fn chart_title(ui: &mut Ui, title: &str) {
    ui.add_space(12.0);
    ui.heading(title);
}

fn placeholder(ui: &mut Ui, err: AggregateError) {
    ui.label(RichText::new(format!("No data to chart ({err})")).weak());
}

fn hour_of_day(ts: &NaiveDateTime) -> f64 {
    ts.hour() as f64 + ts.minute() as f64 / 60.0
}

// ---------------------------------------------------------------------------
// Chart builders
// ---------------------------------------------------------------------------

/// One bar per listing, coloured and named by bus.
fn seat_availability_chart(ui: &mut Ui, top: &Dataset, colors: &ColorMap) {
    Plot::new("seat_availability")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Bus")
        .y_axis_label("Seats Available")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, l) in top.iter().enumerate() {
                let color = colors.color_for(&l.bus_name);
                let bar = Bar::new(i as f64, l.seat_available as f64)
                    .width(0.8)
                    .name(&l.bus_name)
                    .fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&l.bus_name).color(color));
            }
        });
}

fn histogram_chart(ui: &mut Ui, id: &str, field: NumericField, buckets: &[Bucket]) {
    let bars: Vec<Bar> = buckets
        .iter()
        .map(|b| {
            let width = (b.hi - b.lo).max(f64::EPSILON);
            Bar::new((b.lo + b.hi) / 2.0, b.count as f64)
                .width(width)
                .name(format!("{:.2} – {:.2}", b.lo, b.hi))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(field.label())
        .y_axis_label("count")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
        });
}

/// Pie as filled polygons, one slice per category.
fn pie_chart(ui: &mut Ui, shares: &[(String, usize)]) {
    let total: usize = shares.iter().map(|(_, n)| n).sum();
    let palette = generate_palette(shares.len());

    Plot::new("bus_type_pie")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            let mut start = 0.0;
            for ((label, count), color) in shares.iter().zip(palette) {
                let sweep = TAU * *count as f64 / total as f64;
                let steps = ((sweep / TAU) * 120.0).ceil().max(2.0) as usize;
                let mut outline = vec![[0.0, 0.0]];
                outline.extend((0..=steps).map(|s| {
                    let a = start + sweep * s as f64 / steps as f64;
                    [a.cos(), a.sin()]
                }));
                let pct = 100.0 * *count as f64 / total as f64;
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(outline))
                        .fill_color(color)
                        .name(format!("{label} ({pct:.1}%)")),
                );
                start += sweep;
            }
        });
}

fn scatter(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    points: &[(&str, f64, f64)],
    colors: &ColorMap,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for &(name, x, y) in points {
                plot_ui.points(
                    Points::new(vec![[x, y]])
                        .radius(4.0)
                        .color(colors.color_for(name))
                        .name(name),
                );
            }
        });
}
