use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveTime};
use parquet::arrow::ArrowWriter;
use redbus_dashboard::data::loader::{DropReason, Loader, loader_for_path};
use redbus_dashboard::data::source::RawListing;
use redbus_dashboard::{Aggregator, LoadError, NumericField};
use rusqlite::Connection;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("redbus-{}-{name}", std::process::id()))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn raw(i: usize, departing: &str) -> RawListing {
    RawListing {
        bus_name: format!("bus-{i}"),
        route_link: "https://www.redbus.in/bus-tickets/chennai-to-bangalore".to_string(),
        route: "Chennai to Bangalore".to_string(),
        bus_type: "A/C Sleeper (2+1)".to_string(),
        departing_time: departing.to_string(),
        duration: "06h 30m".to_string(),
        reaching_time: "2024-07-02 04:00:00".to_string(),
        star_rating: Some(4.1),
        price: Some(899.0),
        seat_available: Some(i as i64),
        departure: "Chennai".to_string(),
        arrival: "Bangalore".to_string(),
    }
}

#[test]
fn two_bad_departing_times_out_of_ten() {
    let rows: Vec<RawListing> = (0..10)
        .map(|i| match i {
            3 => raw(i, "25:99"),
            7 => raw(i, "departs soon"),
            _ => raw(i, "2024-07-01 21:30:00"),
        })
        .collect();

    let (ds, report) = Loader::new(rows).with_reference_date(day()).load_with_report().unwrap();
    assert_eq!(ds.len(), 8);
    assert_eq!(report.dropped.len(), 2);
    assert!(matches!(report.dropped[0].reason, DropReason::DepartingTime(_)));
    assert_eq!(report.dropped[1].bus_name, "bus-7");
}

#[test]
fn csv_file_through_extension_dispatch() {
    let path = temp_path("listings.csv");
    std::fs::write(
        &path,
        "Bus_name,Route_Link,Route,Bus_Type,Departing_Time,Duration,Reaching_Time,Star_Rating,Price,Seat_Available,Departure,Arrival\n\
         KPN,l,R1,Sleeper,21:30,6h,04:00,4.25,899.999,12,A,B\n\
         SRS,l,R1,Seater,??,6h,04:00,3.0,500,3,A,B\n\
         VRL,l,R2,Sleeper,2024-07-01 06:00,6h,2024-07-01 12:15,3.3,650,0,C,D\n",
    )
    .unwrap();

    let loader = loader_for_path(&path, "unused").unwrap().with_reference_date(day());
    let (ds, report) = loader.load_with_report().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(report.fetched, 3);
    assert_eq!(ds.len(), 2);
    let first = ds.get(0).unwrap();
    assert_eq!(first.bus_name, "KPN");
    assert_eq!(first.star_rating, 4.3);
    assert_eq!(first.price, 900.0);
    assert_eq!(first.departing_time, day().and_hms_opt(21, 30, 0).unwrap());
    assert_eq!(ds.routes(), ["R1", "R2"]);
}

#[test]
fn sqlite_file_rounds_and_drops() {
    let path = temp_path("listings.db");
    std::fs::remove_file(&path).ok();
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Red_Bus_Cleansed_Data (
                Bus_name TEXT, Route_Link TEXT, Route TEXT, Bus_Type TEXT,
                Departing_Time TEXT, Duration TEXT, Reaching_Time TEXT,
                Star_Rating REAL, Price REAL, Seat_Available INTEGER,
                Departure TEXT, Arrival TEXT);
             INSERT INTO Red_Bus_Cleansed_Data VALUES
                ('KPN', 'l', 'R1', 'Sleeper', '2024-07-01 21:30:00', '6h', '2024-07-02 03:30:00', 4.26, 899.5, 12, 'A', 'B'),
                ('SRS', 'l', 'R1', 'Seater', 'never', '6h', '2024-07-02 03:30:00', 3.0, 500, 9, 'A', 'B'),
                ('VRL', 'l', 'R1', 'Seater', '2024-07-01 22:00:00', '6h', '2024-07-02 04:00:00', 3.5, 520, 4, 'A', 'B');",
        )
        .unwrap();
    }

    let ds = loader_for_path(&path, "Red_Bus_Cleansed_Data").unwrap().load().unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.get(0).unwrap().star_rating, 4.3);

    std::fs::remove_file(&path).ok();
}

#[test]
fn sqlite_wrong_table_is_source_unavailable() {
    let path = temp_path("empty.db");
    std::fs::remove_file(&path).ok();
    Connection::open(&path).unwrap().execute_batch("CREATE TABLE other (x INTEGER);").unwrap();

    let err = loader_for_path(&path, "Red_Bus_Cleansed_Data").unwrap().load().unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, LoadError::SourceUnavailable(_)), "{err}");
}

#[test]
fn json_file_with_every_row_invalid_is_empty_dataset() {
    let path = temp_path("listings.json");
    std::fs::write(
        &path,
        r#"[{"Bus_name":"A","Route":"R","Departing_Time":null,"Reaching_Time":"10:00","Star_Rating":4,"Price":100,"Seat_Available":1}]"#,
    )
    .unwrap();

    let err = loader_for_path(&path, "unused").unwrap().load().unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, LoadError::EmptyDataset { fetched: 1, dropped: 1 }));
}

#[test]
fn parquet_timestamps_are_cast_to_text() {
    let path = temp_path("listings.parquet");
    let text = |v: &[&str]| -> ArrayRef { Arc::new(StringArray::from(v.to_vec())) };
    let departing = day().and_hms_opt(21, 30, 0).unwrap().and_utc().timestamp();
    let reaching = day().and_hms_opt(23, 45, 0).unwrap().and_utc().timestamp();

    let schema = Arc::new(Schema::new(vec![
        Field::new("Bus_name", DataType::Utf8, false),
        Field::new("Route_Link", DataType::Utf8, false),
        Field::new("Route", DataType::Utf8, false),
        Field::new("Bus_Type", DataType::Utf8, false),
        Field::new("Departing_Time", DataType::Timestamp(TimeUnit::Second, None), false),
        Field::new("Duration", DataType::Utf8, false),
        Field::new("Reaching_Time", DataType::Timestamp(TimeUnit::Second, None), false),
        Field::new("Star_Rating", DataType::Float64, false),
        Field::new("Price", DataType::Float64, false),
        Field::new("Seat_Available", DataType::Int64, false),
        Field::new("Departure", DataType::Utf8, false),
        Field::new("Arrival", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(&["KPN"]),
            text(&["l"]),
            text(&["R1"]),
            text(&["Sleeper"]),
            Arc::new(TimestampSecondArray::from(vec![departing])),
            text(&["2h 15m"]),
            Arc::new(TimestampSecondArray::from(vec![reaching])),
            Arc::new(Float64Array::from(vec![4.44])),
            Arc::new(Float64Array::from(vec![1234.567])),
            Arc::new(Int64Array::from(vec![17])),
            text(&["A"]),
            text(&["B"]),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = loader_for_path(&path, "unused").unwrap().load().unwrap();
    std::fs::remove_file(&path).ok();

    let l = ds.get(0).unwrap();
    assert_eq!(l.departing_time_of_day(), NaiveTime::from_hms_opt(21, 30, 0).unwrap());
    assert_eq!(l.reaching_time_of_day(), NaiveTime::from_hms_opt(23, 45, 0).unwrap());
    assert_eq!(l.star_rating, 4.4);
    assert_eq!(l.price, 1234.57);
    assert_eq!(l.seat_available, 17);
}

fn listings_schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        [
            "Bus_name", "Route_Link", "Route", "Bus_Type", "Departing_Time", "Duration",
            "Reaching_Time", "Star_Rating", "Price", "Seat_Available", "Departure", "Arrival",
        ]
        .into_iter()
        .map(|name| {
            let dt = match name {
                "Star_Rating" | "Price" => DataType::Float64,
                "Seat_Available" => DataType::Int64,
                _ => DataType::Utf8,
            };
            Field::new(name, dt, true)
        })
        .collect::<Vec<_>>(),
    ))
}

#[test]
fn parquet_non_finite_and_negative_prices_are_dropped() {
    let path = temp_path("nan.parquet");
    let text = |v: &str| -> ArrayRef { Arc::new(StringArray::from(vec![v; 4])) };
    let schema = listings_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["a", "b", "c", "d"])),
            text("l"),
            text("R1"),
            text("Sleeper"),
            text("2024-07-01 21:30:00"),
            text("6h"),
            text("2024-07-02 03:30:00"),
            Arc::new(Float64Array::from(vec![4.0, 3.5, 4.2, 4.8])),
            Arc::new(Float64Array::from(vec![100.0, 200.0, f64::NAN, -50.0])),
            Arc::new(Int64Array::from(vec![5, 6, 7, 8])),
            text("A"),
            text("B"),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let (ds, report) = loader_for_path(&path, "unused").unwrap().load_with_report().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(ds.len(), 2);
    assert_eq!(report.dropped.len(), 2);
    assert_eq!(report.dropped[0].bus_name, "c");
    assert_eq!(report.dropped[1].reason, DropReason::NegativePrice(-50.0));

    let agg = Aggregator::new(&ds);
    assert_eq!(agg.mean_price(), Ok(150.0));
    let buckets = agg.histogram(NumericField::Price, 50).unwrap();
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 2);
}

#[test]
fn missing_file_is_fatal() {
    let err = loader_for_path(&temp_path("missing.csv"), "unused").unwrap().load().unwrap_err();
    assert!(!err.is_recoverable());
}
