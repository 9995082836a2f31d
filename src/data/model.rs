use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Round to `digits` fractional digits, half away from zero.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Time-of-day of a timestamp at minute resolution.
pub fn time_of_day(ts: &NaiveDateTime) -> NaiveTime {
    NaiveTime::from_hms_opt(ts.hour(), ts.minute(), 0).unwrap_or(NaiveTime::MIN)
}

// ---------------------------------------------------------------------------
// Listing – one row of the store
// ---------------------------------------------------------------------------

/// One bus listing. Both timestamps are always present: rows whose times
/// could not be parsed never make it into a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub bus_name: String,
    pub route_link: String,
    pub route: String,
    pub bus_type: String,
    pub departing_time: NaiveDateTime,
    pub duration: String,
    pub reaching_time: NaiveDateTime,
    /// Rounded to one fractional digit.
    pub star_rating: f64,
    /// Rounded to two fractional digits.
    pub price: f64,
    pub seat_available: u32,
    pub departure: String,
    pub arrival: String,
}

impl Listing {
    pub fn departing_time_of_day(&self) -> NaiveTime {
        time_of_day(&self.departing_time)
    }

    pub fn reaching_time_of_day(&self) -> NaiveTime {
        time_of_day(&self.reaching_time)
    }
}

// ---------------------------------------------------------------------------
// Interval – inclusive [lo, hi]
// ---------------------------------------------------------------------------

/// Inclusive range. An interval with `lo > hi` contains nothing; time-of-day
/// intervals do not wrap past midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub lo: T,
    pub hi: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Interval { lo, hi }
    }

    pub fn contains(&self, value: T) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Clamp both ends into `outer`, keeping their order as given.
    pub fn clamped_to(&self, outer: &Interval<T>) -> Self {
        let clamp = |v: T| {
            if v < outer.lo {
                outer.lo
            } else if v > outer.hi {
                outer.hi
            } else {
                v
            }
        };
        Interval::new(clamp(self.lo), clamp(self.hi))
    }
}

impl fmt::Display for Interval<NaiveTime> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.lo.format("%H:%M"), self.hi.format("%H:%M"))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded listings
// ---------------------------------------------------------------------------

/// Ordered listings, immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    listings: Vec<Listing>,
}

impl Dataset {
    pub fn new(listings: Vec<Listing>) -> Self {
        Dataset { listings }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Listing> {
        self.listings.get(index)
    }

    /// Distinct routes in order of first appearance.
    pub fn routes(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.listings
            .iter()
            .filter(|l| seen.insert(l.route.as_str()))
            .map(|l| l.route.clone())
            .collect()
    }

    /// Keep the listings passing `keep`, preserving order.
    pub(crate) fn retain_cloned<F>(&self, keep: F) -> Dataset
    where
        F: Fn(&Listing) -> bool,
    {
        Dataset::new(self.listings.iter().filter(|l| keep(l)).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Listing;
    type IntoIter = std::slice::Iter<'a, Listing>;

    fn into_iter(self) -> Self::IntoIter {
        self.listings.iter()
    }
}
