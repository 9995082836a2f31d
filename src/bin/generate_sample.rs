//! Writes a synthetic listings store for trying the dashboard without the
//! production database. `generate_sample [out.db|out.parquet]`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use redbus_dashboard::config::DEFAULT_TABLE;
use redbus_dashboard::data::source::COLUMNS;
use rusqlite::{Connection, params};

struct Row {
    bus_name: String,
    route_link: String,
    route: String,
    bus_type: String,
    departing_time: String,
    duration: String,
    reaching_time: String,
    star_rating: f64,
    price: f64,
    seat_available: i64,
    departure: String,
    arrival: String,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let routes = [
        ("Chennai", "Bangalore", 350.0),
        ("Hyderabad", "Vijayawada", 275.0),
        ("Kochi", "Kozhikode", 190.0),
        ("Jaipur", "Delhi", 280.0),
        ("Kolkata", "Digha", 185.0),
    ];
    let operators = ["KPN Travels", "SRS Travels", "Orange Tours", "VRL Travels", "IntrCity SmartBus", "APSRTC", "KSRTC"];
    let bus_types = ["A/C Sleeper (2+1)", "Non A/C Seater (2+2)", "Volvo Multi-Axle A/C Semi Sleeper", "A/C Seater / Sleeper (2+1)"];
    let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or_default();

    let mut rows = Vec::new();
    for (from, to, km) in routes {
        let route = format!("{from} to {to}");
        let slug = route.to_lowercase().replace(' ', "-");
        for _ in 0..40 {
            let minutes = rng.below(24 * 60) as i64;
            let departing: NaiveDateTime = day.and_hms_opt(0, 0, 0).unwrap_or_default() + Duration::minutes(minutes);
            let travel = (km / 45.0 * 60.0) as i64 + rng.below(90) as i64;
            let reaching = departing + Duration::minutes(travel);
            let bus_type = rng.pick(&bus_types);
            let base = if bus_type.starts_with("Non") { 1.2 } else { 2.1 };

            let mut departing_text = departing.format("%Y-%m-%d %H:%M:%S").to_string();
            // a few corrupted timestamps, as scraped data tends to have
            if rng.below(25) == 0 {
                departing_text = "--".to_string();
            }

            rows.push(Row {
                bus_name: rng.pick(&operators).to_string(),
                route_link: format!("https://www.redbus.in/bus-tickets/{slug}"),
                route: route.clone(),
                bus_type: bus_type.to_string(),
                departing_time: departing_text,
                duration: format!("{:02}h {:02}m", travel / 60, travel % 60),
                reaching_time: reaching.format("%Y-%m-%d %H:%M:%S").to_string(),
                star_rating: 1.0 + rng.next_f64() * 4.0,
                price: km * base * (0.8 + rng.next_f64() * 0.6),
                seat_available: rng.below(45) as i64,
                departure: from.to_string(),
                arrival: to.to_string(),
            });
        }
    }
    rows
}

fn write_sqlite(path: &Path, rows: &[Row]) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).context("replacing existing database")?;
    }
    let mut conn = Connection::open(path).context("creating database")?;
    conn.execute_batch(&format!(
        "CREATE TABLE {DEFAULT_TABLE} (
            Bus_name TEXT, Route_Link TEXT, Route TEXT, Bus_Type TEXT,
            Departing_Time TEXT, Duration TEXT, Reaching_Time TEXT,
            Star_Rating REAL, Price REAL, Seat_Available INTEGER,
            Departure TEXT, Arrival TEXT
        );"
    ))?;

    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {DEFAULT_TABLE} VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))?;
        for r in rows {
            insert.execute(params![
                r.bus_name,
                r.route_link,
                r.route,
                r.bus_type,
                r.departing_time,
                r.duration,
                r.reaching_time,
                r.star_rating,
                r.price,
                r.seat_available,
                r.departure,
                r.arrival,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let fields: Vec<Field> = COLUMNS
        .iter()
        .map(|&name| {
            let dt = match name {
                "Star_Rating" | "Price" => DataType::Float64,
                "Seat_Available" => DataType::Int64,
                _ => DataType::Utf8,
            };
            Field::new(name, dt, false)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.bus_name.as_str()),
            text(|r| r.route_link.as_str()),
            text(|r| r.route.as_str()),
            text(|r| r.bus_type.as_str()),
            text(|r| r.departing_time.as_str()),
            text(|r| r.duration.as_str()),
            text(|r| r.reaching_time.as_str()),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.star_rating).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.price).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.seat_available).collect::<Vec<_>>())),
            text(|r| r.departure.as_str()),
            text(|r| r.arrival.as_str()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("redbus.db"));

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "db" | "sqlite" | "sqlite3" => write_sqlite(&output, &rows)?,
        "parquet" | "pq" => write_parquet(&output, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} listings to {}", rows.len(), output.display());
    Ok(())
}
