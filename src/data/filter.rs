use chrono::NaiveTime;

use super::model::{Dataset, Interval, Listing};

// ---------------------------------------------------------------------------
// Filter bounds: slider limits derived from the route-selected subset
// ---------------------------------------------------------------------------

pub const RATING_BOUNDS: Interval<f64> = Interval { lo: 0.0, hi: 5.0 };

/// Last minute of the day; time-of-day values have minute resolution.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Observed min/max of price and both times of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBounds {
    pub price: Interval<f64>,
    pub departing: Interval<NaiveTime>,
    pub reaching: Interval<NaiveTime>,
}

impl FilterBounds {
    /// `None` when there are no listings to take bounds from.
    pub fn from_listings<'a, I>(listings: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Listing>,
    {
        let mut iter = listings.into_iter();
        let first = iter.next()?;
        let seed = FilterBounds {
            price: Interval::new(first.price, first.price),
            departing: Interval::new(first.departing_time_of_day(), first.departing_time_of_day()),
            reaching: Interval::new(first.reaching_time_of_day(), first.reaching_time_of_day()),
        };
        Some(iter.fold(seed, |mut b, l| {
            b.price.lo = b.price.lo.min(l.price);
            b.price.hi = b.price.hi.max(l.price);
            let dep = l.departing_time_of_day();
            b.departing.lo = b.departing.lo.min(dep);
            b.departing.hi = b.departing.hi.max(dep);
            let reach = l.reaching_time_of_day();
            b.reaching.lo = b.reaching.lo.min(reach);
            b.reaching.hi = b.reaching.hi.max(reach);
            b
        }))
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – the user's current selection
// ---------------------------------------------------------------------------

/// Current selection. Rebuild with [`FilterSpec::for_route`] whenever the
/// route changes; the other setters clamp into the route's bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Exact, case-sensitive match. `None` selects nothing.
    pub route: Option<String>,
    pub rating: Interval<f64>,
    pub price: Interval<f64>,
    pub departing: Interval<NaiveTime>,
    pub reaching: Interval<NaiveTime>,
    /// Limits for the intervals above, from the route-selected subset.
    pub bounds: Option<FilterBounds>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::unselected()
    }
}

impl FilterSpec {
    /// No route selected: every interval wide open, result always empty.
    pub fn unselected() -> Self {
        let whole_day = Interval::new(NaiveTime::MIN, end_of_day());
        FilterSpec {
            route: None,
            rating: RATING_BOUNDS,
            price: Interval::new(0.0, f64::MAX),
            departing: whole_day,
            reaching: whole_day,
            bounds: None,
        }
    }

    /// Select `route` and open every interval to the bounds observed in the
    /// listings of that route.
    pub fn for_route(dataset: &Dataset, route: &str) -> Self {
        let bounds = FilterBounds::from_listings(dataset.iter().filter(|l| l.route == route));
        let mut spec = FilterSpec {
            route: Some(route.to_string()),
            bounds,
            ..Self::unselected()
        };
        if let Some(b) = bounds {
            spec.price = b.price;
            spec.departing = b.departing;
            spec.reaching = b.reaching;
        }
        spec
    }

    pub fn set_rating(&mut self, lo: f64, hi: f64) {
        self.rating = Interval::new(lo, hi).clamped_to(&RATING_BOUNDS);
    }

    pub fn set_price(&mut self, lo: f64, hi: f64) {
        let iv = Interval::new(lo, hi);
        self.price = match &self.bounds {
            Some(b) => iv.clamped_to(&b.price),
            None => iv,
        };
    }

    pub fn set_departing(&mut self, lo: NaiveTime, hi: NaiveTime) {
        let iv = Interval::new(lo, hi);
        self.departing = match &self.bounds {
            Some(b) => iv.clamped_to(&b.departing),
            None => iv,
        };
    }

    pub fn set_reaching(&mut self, lo: NaiveTime, hi: NaiveTime) {
        let iv = Interval::new(lo, hi);
        self.reaching = match &self.bounds {
            Some(b) => iv.clamped_to(&b.reaching),
            None => iv,
        };
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// One independent predicate of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Route,
    Rating,
    Price,
    Departing,
    Reaching,
}

impl Stage {
    /// The order [`apply`] uses.
    pub const ALL: [Stage; 5] = [
        Stage::Route,
        Stage::Rating,
        Stage::Price,
        Stage::Departing,
        Stage::Reaching,
    ];

    pub fn keeps(self, spec: &FilterSpec, listing: &Listing) -> bool {
        match self {
            Stage::Route => spec.route.as_deref() == Some(listing.route.as_str()),
            Stage::Rating => spec.rating.contains(listing.star_rating),
            Stage::Price => spec.price.contains(listing.price),
            Stage::Departing => spec.departing.contains(listing.departing_time_of_day()),
            Stage::Reaching => spec.reaching.contains(listing.reaching_time_of_day()),
        }
    }
}

/// Listings of the dataset passing every stage, in their original order.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    apply_stages(dataset, spec, &Stage::ALL)
}

/// Run `stages` in the given order, each one on the output of the previous.
pub fn apply_stages(dataset: &Dataset, spec: &FilterSpec, stages: &[Stage]) -> Dataset {
    let mut kept: Vec<&Listing> = dataset.iter().collect();
    for stage in stages {
        kept.retain(|l| stage.keeps(spec, l));
    }
    log::trace!("filter kept {} of {} listings", kept.len(), dataset.len());
    Dataset::new(kept.into_iter().cloned().collect())
}

/// Listings of one route only.
pub fn route_subset(dataset: &Dataset, route: &str) -> Dataset {
    dataset.retain_cloned(|l| l.route == route)
}
