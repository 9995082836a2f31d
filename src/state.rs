use std::path::Path;

use chrono::NaiveTime;
use redbus_dashboard::data::filter::{apply, route_subset};
use redbus_dashboard::data::loader::{LoadReport, loader_for_path};
use redbus_dashboard::{DashboardConfig, Dataset, FilterSpec, LoadError};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    BusAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Details,
    Charts,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Listings of the current session (None until a load succeeds).
    pub dataset: Option<Dataset>,

    /// Outcome of the last load, for the dropped-row notice.
    pub report: Option<LoadReport>,

    /// Distinct routes, in store order.
    pub routes: Vec<String>,

    /// Current selection.
    pub filters: FilterSpec,

    /// Listings of the selected route, before any other filter.
    pub route_listings: Dataset,

    /// Listings passing the current filters.
    pub visible: Dataset,

    /// Colour per bus name.
    pub color_map: ColorMap,

    pub page: Page,
    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            report: None,
            routes: Vec::new(),
            filters: FilterSpec::unselected(),
            route_listings: Dataset::empty(),
            visible: Dataset::empty(),
            color_map: ColorMap::default(),
            page: Page::Home,
            tab: Tab::Details,
            status_message: None,
        }
    }

    /// Start a new session from the store at `path`.
    pub fn load_from(&mut self, path: &Path) {
        let result = loader_for_path(path, &self.config.table)
            .and_then(|loader| loader.load_with_report());

        match result {
            Ok((dataset, report)) => {
                self.set_dataset(dataset, report);
                if let Some(r) = &self.report {
                    if !r.dropped.is_empty() {
                        self.status_message = Some(format!(
                            "{} of {} rows dropped (unreadable times or numbers)",
                            r.dropped.len(),
                            r.fetched
                        ));
                    }
                }
            }
            Err(e @ LoadError::EmptyDataset { .. }) => {
                log::warn!("{e}");
                self.set_dataset(Dataset::empty(), LoadReport::default());
                self.status_message = Some(format!("No data: {e}"));
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.dataset = None;
                self.report = None;
                self.color_map = ColorMap::default();
                self.routes.clear();
                self.filters = FilterSpec::unselected();
                self.refilter();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and select its first route.
    pub fn set_dataset(&mut self, dataset: Dataset, report: LoadReport) {
        self.routes = dataset.routes();
        self.color_map = ColorMap::new(dataset.iter().map(|l| l.bus_name.as_str()));
        self.dataset = Some(dataset);
        self.report = Some(report);
        self.status_message = None;

        match self.routes.first().cloned() {
            Some(route) => self.select_route(&route),
            None => {
                self.filters = FilterSpec::unselected();
                self.refilter();
            }
        }
    }

    /// New route: bounds and intervals are rebuilt from its listings.
    pub fn select_route(&mut self, route: &str) {
        if let Some(ds) = &self.dataset {
            self.filters = FilterSpec::for_route(ds, route);
        }
        self.refilter();
    }

    /// Recompute `route_listings` and `visible` from scratch.
    pub fn refilter(&mut self) {
        match (&self.dataset, &self.filters.route) {
            (Some(ds), Some(route)) => {
                self.route_listings = route_subset(ds, route);
                self.visible = apply(ds, &self.filters);
            }
            _ => {
                self.route_listings = Dataset::empty();
                self.visible = Dataset::empty();
            }
        }
    }

    pub fn set_rating(&mut self, lo: f64, hi: f64) {
        self.filters.set_rating(lo, hi);
        self.refilter();
    }

    pub fn set_price(&mut self, lo: f64, hi: f64) {
        self.filters.set_price(lo, hi);
        self.refilter();
    }

    pub fn set_departing(&mut self, lo: NaiveTime, hi: NaiveTime) {
        self.filters.set_departing(lo, hi);
        self.refilter();
    }

    pub fn set_reaching(&mut self, lo: NaiveTime, hi: NaiveTime) {
        self.filters.set_reaching(lo, hi);
        self.refilter();
    }
}
