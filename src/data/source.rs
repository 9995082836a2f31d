use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value as JsonValue;

use crate::error::LoadError;

/// The fixed 12-column projection, in query order.
pub const COLUMNS: [&str; 12] = [
    "Bus_name",
    "Route_Link",
    "Route",
    "Bus_Type",
    "Departing_Time",
    "Duration",
    "Reaching_Time",
    "Star_Rating",
    "Price",
    "Seat_Available",
    "Departure",
    "Arrival",
];

// ---------------------------------------------------------------------------
// RawListing – a row exactly as the store returned it
// ---------------------------------------------------------------------------

/// Un-normalized row. Timestamps are still text; numeric cells that were
/// missing or unreadable are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub bus_name: String,
    pub route_link: String,
    pub route: String,
    pub bus_type: String,
    pub departing_time: String,
    pub duration: String,
    pub reaching_time: String,
    pub star_rating: Option<f64>,
    pub price: Option<f64>,
    pub seat_available: Option<i64>,
    pub departure: String,
    pub arrival: String,
}

/// Read-only access to a listings store. One call, one full read.
pub trait ListingSource {
    /// Human readable name used in logs and error messages.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<RawListing>>;
}

impl<S: ListingSource + ?Sized> ListingSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        (**self).fetch()
    }
}

/// In-memory store.
impl ListingSource for Vec<RawListing> {
    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.len())
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        Ok(self.clone())
    }
}

/// Pick a backend by file extension.
///
/// Supported formats:
/// * `.db` / `.sqlite` / `.sqlite3` – SQLite database holding `table`
/// * `.csv`     – header row with the 12 column names
/// * `.json`    – `[{ "Bus_name": ..., "Route": ..., ... }, ...]`
/// * `.parquet` – flat columns with the 12 column names
pub fn source_for_path(path: &Path, table: &str) -> Result<Box<dyn ListingSource>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let source: Box<dyn ListingSource> = match ext.as_str() {
        "db" | "sqlite" | "sqlite3" => Box::new(SqliteSource::new(path, table)),
        "csv" => Box::new(CsvSource::new(path)),
        "json" => Box::new(JsonSource::new(path)),
        "parquet" | "pq" => Box::new(ParquetSource::new(path)),
        other => {
            return Err(LoadError::SourceUnavailable(format!(
                "Unsupported file extension: .{other}"
            )));
        }
    };
    Ok(source)
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub struct SqliteSource {
    path: PathBuf,
    table: String,
}

impl SqliteSource {
    pub fn new(path: &Path, table: &str) -> Self {
        SqliteSource {
            path: path.to_path_buf(),
            table: table.to_string(),
        }
    }
}

impl ListingSource for SqliteSource {
    fn describe(&self) -> String {
        format!("sqlite {} ({})", self.path.display(), self.table)
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("opening {}", self.path.display()))?;
        // `conn` is dropped on return; nothing keeps the store open.
        fetch_from_connection(&conn, &self.table)
    }
}

/// The one query the dashboard ever runs.
pub fn projection_query(table: &str) -> String {
    format!(
        "SELECT Bus_name, Route_Link, Route, Bus_Type, Departing_Time, Duration, \
         Reaching_Time, ROUND(Star_Rating, 1) AS Star_Rating, \
         ROUND(Price, 2) AS Price, Seat_Available, Departure, Arrival \
         FROM {table}"
    )
}

pub fn fetch_from_connection(conn: &Connection, table: &str) -> Result<Vec<RawListing>> {
    let mut stmt = conn
        .prepare(&projection_query(table))
        .with_context(|| format!("preparing listings query on '{table}'"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RawListing {
                bus_name: sql_text(row.get_ref(0)?),
                route_link: sql_text(row.get_ref(1)?),
                route: sql_text(row.get_ref(2)?),
                bus_type: sql_text(row.get_ref(3)?),
                departing_time: sql_text(row.get_ref(4)?),
                duration: sql_text(row.get_ref(5)?),
                reaching_time: sql_text(row.get_ref(6)?),
                star_rating: sql_f64(row.get_ref(7)?),
                price: sql_f64(row.get_ref(8)?),
                seat_available: sql_i64(row.get_ref(9)?),
                departure: sql_text(row.get_ref(10)?),
                arrival: sql_text(row.get_ref(11)?),
            })
        })
        .context("running listings query")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("reading listings rows")
}

// SQLite columns are dynamically typed; accept whatever storage class we get.

fn sql_text(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
    }
}

fn sql_f64(v: ValueRef<'_>) -> Option<f64> {
    match v {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(t) => parse_f64(&String::from_utf8_lossy(t)),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn sql_i64(v: ValueRef<'_>) -> Option<i64> {
    match v {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => whole_number(f),
        ValueRef::Text(t) => parse_i64(&String::from_utf8_lossy(t)),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: &Path) -> Self {
        CsvSource {
            path: path.to_path_buf(),
        }
    }
}

impl ListingSource for CsvSource {
    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        let reader = csv::Reader::from_path(&self.path).context("opening CSV")?;
        read_csv(reader)
    }
}

/// CSV layout: header row naming (at least) the 12 columns, in any order.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawListing>> {
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let mut idx = [0usize; 12];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("CSV missing '{name}' column"))?;
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| record.get(idx[i]).unwrap_or("").to_string();

        rows.push(RawListing {
            bus_name: cell(0),
            route_link: cell(1),
            route: cell(2),
            bus_type: cell(3),
            departing_time: cell(4),
            duration: cell(5),
            reaching_time: cell(6),
            star_rating: parse_f64(&cell(7)),
            price: parse_f64(&cell(8)),
            seat_available: parse_i64(&cell(9)),
            departure: cell(10),
            arrival: cell(11),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: &Path) -> Self {
        JsonSource {
            path: path.to_path_buf(),
        }
    }
}

impl ListingSource for JsonSource {
    fn describe(&self) -> String {
        format!("json {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        let text = std::fs::read_to_string(&self.path).context("reading JSON file")?;
        parse_json(&text)
    }
}

/// Records-oriented JSON (`df.to_json(orient='records')`).
pub fn parse_json(text: &str) -> Result<Vec<RawListing>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let text = |key: &str| obj.get(key).map(json_text).unwrap_or_default();
            let number = |key: &str| obj.get(key).and_then(json_f64);

            Ok(RawListing {
                bus_name: text("Bus_name"),
                route_link: text("Route_Link"),
                route: text("Route"),
                bus_type: text("Bus_Type"),
                departing_time: text("Departing_Time"),
                duration: text("Duration"),
                reaching_time: text("Reaching_Time"),
                star_rating: number("Star_Rating"),
                price: number("Price"),
                seat_available: obj.get("Seat_Available").and_then(json_i64),
                departure: text("Departure"),
                arrival: text("Arrival"),
            })
        })
        .collect()
}

fn json_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_f64(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_f64(s),
        _ => None,
    }
}

fn json_i64(val: &JsonValue) -> Option<i64> {
    match val {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        JsonValue::String(s) => parse_i64(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: &Path) -> Self {
        ParquetSource {
            path: path.to_path_buf(),
        }
    }
}

impl ListingSource for ParquetSource {
    /// Expected schema: one flat column per name in [`COLUMNS`]. Text columns
    /// may be Utf8 or any type Arrow can cast to Utf8 (timestamps included);
    /// numeric columns anything castable to Float64.
    fn describe(&self) -> String {
        format!("parquet {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<RawListing>> {
        let file = std::fs::File::open(&self.path).context("opening parquet file")?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
        let reader = builder.build().context("building parquet reader")?;

        let mut rows = Vec::new();
        for batch_result in reader {
            let batch = batch_result.context("reading parquet record batch")?;
            let column = |name: &str| column_by_name(&batch, name);

            let mut text_cols = Vec::with_capacity(9);
            for name in [
                "Bus_name",
                "Route_Link",
                "Route",
                "Bus_Type",
                "Departing_Time",
                "Duration",
                "Reaching_Time",
                "Departure",
                "Arrival",
            ] {
                text_cols.push(as_strings(column(name)?, name)?);
            }
            let star = as_floats(column("Star_Rating")?, "Star_Rating")?;
            let price = as_floats(column("Price")?, "Price")?;
            let seats = as_floats(column("Seat_Available")?, "Seat_Available")?;

            let text = |c: usize, row: usize| -> String {
                let arr = &text_cols[c];
                if arr.is_null(row) {
                    String::new()
                } else {
                    arr.value(row).to_string()
                }
            };
            let float = |arr: &Float64Array, row: usize| -> Option<f64> {
                (!arr.is_null(row))
                    .then(|| arr.value(row))
                    .filter(|v| v.is_finite())
            };

            for row in 0..batch.num_rows() {
                rows.push(RawListing {
                    bus_name: text(0, row),
                    route_link: text(1, row),
                    route: text(2, row),
                    bus_type: text(3, row),
                    departing_time: text(4, row),
                    duration: text(5, row),
                    reaching_time: text(6, row),
                    star_rating: float(&star, row),
                    price: float(&price, row),
                    seat_available: float(&seats, row).and_then(whole_number),
                    departure: text(7, row),
                    arrival: text(8, row),
                });
            }
        }
        Ok(rows)
    }
}

// -- Arrow helpers --

fn column_by_name<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b ArrayRef> {
    let i = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(i))
}

fn as_strings(col: &ArrayRef, name: &str) -> Result<StringArray> {
    let casted = cast(col, &DataType::Utf8)
        .with_context(|| format!("column '{name}' ({:?}) is not text-like", col.data_type()))?;
    casted
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .with_context(|| format!("column '{name}': expected Utf8 after cast"))
}

fn as_floats(col: &ArrayRef, name: &str) -> Result<Float64Array> {
    if !col.data_type().is_numeric() && !matches!(col.data_type(), DataType::Utf8 | DataType::LargeUtf8 | DataType::Null) {
        bail!("column '{name}' has non-numeric type {:?}", col.data_type());
    }
    // Unparseable strings become nulls under the default (safe) cast options.
    let casted = cast(col, &DataType::Float64)
        .with_context(|| format!("casting column '{name}' to Float64"))?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .with_context(|| format!("column '{name}': expected Float64 after cast"))
}

// ---------------------------------------------------------------------------
// Lenient scalar parsing shared by the text-based backends
// ---------------------------------------------------------------------------

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
}

fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Bus_name,Route_Link,Route,Bus_Type,Departing_Time,Duration,Reaching_Time,Star_Rating,Price,Seat_Available,Departure,Arrival";

    #[test]
    fn csv_reads_columns_by_name() {
        let data = format!(
            "{HEADER}\nKPN,https://r/1,Chennai to Bangalore,A/C Sleeper,21:30,06h 30m,04:00,4.2,899.5,12,Chennai,Bangalore\n"
        );
        let rows = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.bus_name, "KPN");
        assert_eq!(r.route, "Chennai to Bangalore");
        assert_eq!(r.departing_time, "21:30");
        assert_eq!(r.star_rating, Some(4.2));
        assert_eq!(r.price, Some(899.5));
        assert_eq!(r.seat_available, Some(12));
        assert_eq!(r.arrival, "Bangalore");
    }

    #[test]
    fn csv_unreadable_numbers_become_none() {
        let data = format!("{HEADER}\nX,l,R,T,21:30,1h,22:30,n/a,,7.0,A,B\n");
        let rows = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(rows[0].star_rating, None);
        assert_eq!(rows[0].price, None);
        assert_eq!(rows[0].seat_available, Some(7));
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let data = "Bus_name,Route\nX,R\n";
        let err = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(format!("{err:#}").contains("Route_Link"));
    }

    #[test]
    fn json_accepts_numbers_as_strings() {
        let text = r#"[{"Bus_name":"SRS","Route":"R1","Departing_Time":"2024-07-01 06:00:00",
                        "Reaching_Time":"2024-07-01 12:00:00","Star_Rating":"3.9",
                        "Price":450,"Seat_Available":30.0}]"#;
        let rows = parse_json(text).unwrap();
        assert_eq!(rows[0].bus_name, "SRS");
        assert_eq!(rows[0].star_rating, Some(3.9));
        assert_eq!(rows[0].price, Some(450.0));
        assert_eq!(rows[0].seat_available, Some(30));
        assert_eq!(rows[0].arrival, "");
    }

    #[test]
    fn json_rejects_non_array_root() {
        assert!(parse_json(r#"{"Bus_name":"x"}"#).is_err());
    }

    #[test]
    fn sqlite_projection_rounds_in_query() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Red_Bus_Cleansed_Data (
                Bus_name TEXT, Route_Link TEXT, Route TEXT, Bus_Type TEXT,
                Departing_Time TEXT, Duration TEXT, Reaching_Time TEXT,
                Star_Rating REAL, Price REAL, Seat_Available INTEGER,
                Departure TEXT, Arrival TEXT);
             INSERT INTO Red_Bus_Cleansed_Data VALUES
                ('KPN', 'l', 'R1', 'Sleeper', '21:30:00', '6h', '03:30:00', 4.26, 899.499, 12, 'A', 'B'),
                ('SRS', 'l', 'R1', 'Seater', NULL, '6h', '03:30:00', NULL, 500, '9', 'A', 'B');",
        )
        .unwrap();

        let rows = fetch_from_connection(&conn, "Red_Bus_Cleansed_Data").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].star_rating, Some(4.3));
        assert_eq!(rows[0].price, Some(899.5));
        assert_eq!(rows[1].departing_time, "");
        assert_eq!(rows[1].star_rating, None);
        assert_eq!(rows[1].seat_available, Some(9));
    }

    #[test]
    fn sqlite_missing_table_fails() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(fetch_from_connection(&conn, "Red_Bus_Cleansed_Data").is_err());
    }

    #[test]
    fn unknown_extension_is_source_unavailable() {
        let err = source_for_path(Path::new("listings.xlsx"), "t").err().unwrap();
        assert!(matches!(err, LoadError::SourceUnavailable(_)));
    }
}
