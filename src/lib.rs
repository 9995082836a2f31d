//! Core of the bus route listings dashboard.
//!
//! A [`data::loader::Loader`] reads the listings once per session from a
//! [`data::source::ListingSource`], the filter engine in [`data::filter`]
//! narrows them down to what the user selected, and
//! [`data::aggregate::Aggregator`] derives the values the charts display.
//! Everything after the load is pure and in-memory.

pub mod config;
pub mod data;
pub mod error;

pub use config::DashboardConfig;
pub use data::aggregate::{Aggregator, Bucket, NumericField};
pub use data::filter::{FilterBounds, FilterSpec, Stage, apply};
pub use data::loader::{LoadReport, Loader};
pub use data::model::{Dataset, Interval, Listing};
pub use error::{AggregateError, ConfigError, LoadError};
