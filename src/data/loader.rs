use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{Dataset, Listing, round_to};
use super::source::{ListingSource, RawListing, source_for_path};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Permissive timestamp parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Parse a timestamp the way a permissive datetime parser would.
///
/// Full date-times are taken as-is (offsets are dropped, wall time kept).
/// A bare time-of-day is anchored on `reference_date`, a bare date on
/// midnight. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str, reference_date: NaiveDate) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    if let Some(t) = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
    {
        return Some(reference_date.and_time(t));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// Row normalization
// ---------------------------------------------------------------------------

/// Why a fetched row was left out of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    DepartingTime(String),
    ReachingTime(String),
    MissingNumber(&'static str),
    NonFinite(&'static str),
    NegativePrice(f64),
    RatingOutOfRange(f64),
    NegativeSeats(i64),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::DepartingTime(raw) => write!(f, "unparseable Departing_Time '{raw}'"),
            DropReason::ReachingTime(raw) => write!(f, "unparseable Reaching_Time '{raw}'"),
            DropReason::MissingNumber(col) => write!(f, "missing or unreadable {col}"),
            DropReason::NonFinite(col) => write!(f, "non-finite {col}"),
            DropReason::NegativePrice(p) => write!(f, "negative Price {p}"),
            DropReason::RatingOutOfRange(r) => write!(f, "Star_Rating {r} outside 0-5"),
            DropReason::NegativeSeats(n) => write!(f, "negative Seat_Available {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    /// Position in the store's result order.
    pub position: usize,
    pub bus_name: String,
    pub reason: DropReason,
}

/// What happened during a load, for surfacing dropped rows to the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub fetched: usize,
    pub dropped: Vec<DroppedRow>,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.fetched - self.dropped.len()
    }
}

pub fn normalize(raw: RawListing, reference_date: NaiveDate) -> Result<Listing, DropReason> {
    let departing_time = parse_timestamp(&raw.departing_time, reference_date)
        .ok_or_else(|| DropReason::DepartingTime(raw.departing_time.clone()))?;
    let reaching_time = parse_timestamp(&raw.reaching_time, reference_date)
        .ok_or_else(|| DropReason::ReachingTime(raw.reaching_time.clone()))?;

    let star_rating = raw
        .star_rating
        .ok_or(DropReason::MissingNumber("Star_Rating"))?;
    if !star_rating.is_finite() {
        return Err(DropReason::NonFinite("Star_Rating"));
    }
    let star_rating = round_to(star_rating, 1);
    if !(0.0..=5.0).contains(&star_rating) {
        return Err(DropReason::RatingOutOfRange(star_rating));
    }

    let price = raw.price.ok_or(DropReason::MissingNumber("Price"))?;
    if !price.is_finite() {
        return Err(DropReason::NonFinite("Price"));
    }
    let price = round_to(price, 2);
    if price < 0.0 {
        return Err(DropReason::NegativePrice(price));
    }

    let seats = raw
        .seat_available
        .ok_or(DropReason::MissingNumber("Seat_Available"))?;
    let seat_available = u32::try_from(seats).map_err(|_| DropReason::NegativeSeats(seats))?;

    Ok(Listing {
        bus_name: raw.bus_name,
        route_link: raw.route_link,
        route: raw.route,
        bus_type: raw.bus_type,
        departing_time,
        duration: raw.duration,
        reaching_time,
        star_rating,
        price,
        seat_available,
        departure: raw.departure,
        arrival: raw.arrival,
    })
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// One-shot reader: fetch everything, normalize, drop invalid rows.
/// Row order is whatever the store returned.
pub struct Loader<S> {
    source: S,
    reference_date: NaiveDate,
}

impl<S: ListingSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Loader {
            source,
            reference_date: Local::now().date_naive(),
        }
    }

    /// Date used to anchor time-only values.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    pub fn load(&self) -> Result<Dataset, LoadError> {
        self.load_with_report().map(|(dataset, _)| dataset)
    }

    pub fn load_with_report(&self) -> Result<(Dataset, LoadReport), LoadError> {
        let raw_rows = self.source.fetch().map_err(|e| {
            log::error!("Failed to read {}: {e:#}", self.source.describe());
            LoadError::SourceUnavailable(format!("{}: {e:#}", self.source.describe()))
        })?;

        let mut report = LoadReport {
            fetched: raw_rows.len(),
            dropped: Vec::new(),
        };
        let mut listings = Vec::with_capacity(raw_rows.len());

        for (position, raw) in raw_rows.into_iter().enumerate() {
            let bus_name = raw.bus_name.clone();
            match normalize(raw, self.reference_date) {
                Ok(listing) => listings.push(listing),
                Err(reason) => {
                    log::debug!("Dropping row {position} ({bus_name}): {reason}");
                    report.dropped.push(DroppedRow {
                        position,
                        bus_name,
                        reason,
                    });
                }
            }
        }

        log::info!(
            "Loaded {} listings from {} ({} fetched, {} dropped)",
            listings.len(),
            self.source.describe(),
            report.fetched,
            report.dropped.len()
        );
        if !report.dropped.is_empty() {
            log::warn!(
                "{} rows dropped during normalization",
                report.dropped.len()
            );
        }

        if listings.is_empty() {
            return Err(LoadError::EmptyDataset {
                fetched: report.fetched,
                dropped: report.dropped.len(),
            });
        }
        Ok((Dataset::new(listings), report))
    }
}

/// Build a loader for a file-backed store, picking the backend by extension.
pub fn loader_for_path(
    path: &Path,
    table: &str,
) -> Result<Loader<Box<dyn ListingSource>>, LoadError> {
    Ok(Loader::new(source_for_path(path, table)?))
}
