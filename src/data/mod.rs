/// Data layer: listings, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  SQLite / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  fixed 12-column projection → RawListing
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse timestamps, drop invalid rows → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  route, rating, price, time-of-day → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  mean price, top-N, histograms
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod source;
