use chrono::NaiveDateTime;

use super::model::{Dataset, Listing, round_to};
use crate::error::AggregateError;

/// Numeric columns that can be bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    StarRating,
    SeatAvailable,
}

impl NumericField {
    pub fn value(self, listing: &Listing) -> f64 {
        match self {
            NumericField::Price => listing.price,
            NumericField::StarRating => listing.star_rating,
            NumericField::SeatAvailable => listing.seat_available as f64,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericField::Price => "Price",
            NumericField::StarRating => "Star Rating",
            NumericField::SeatAvailable => "Seats Available",
        }
    }
}

/// One histogram bucket. Right-closed `(lo, hi]`, except the first which is
/// closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Display values derived from a (usually filtered) dataset.
pub struct Aggregator<'a> {
    dataset: &'a Dataset,
}

impl<'a> Aggregator<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Aggregator { dataset }
    }

    /// Arithmetic mean of Price, rounded to two decimals.
    pub fn mean_price(&self) -> Result<f64, AggregateError> {
        if self.dataset.is_empty() {
            return Err(AggregateError::EmptyInput);
        }
        let total: f64 = self.dataset.iter().map(|l| l.price).sum();
        if !total.is_finite() {
            return Err(AggregateError::NonFinite(NumericField::Price.label()));
        }
        Ok(round_to(total / self.dataset.len() as f64, 2))
    }

    /// The `n` listings with the most free seats, most first. Ties keep
    /// their original order.
    pub fn top_n_by_availability(&self, n: usize) -> Dataset {
        let mut ranked: Vec<&Listing> = self.dataset.iter().collect();
        // stable: equal seat counts stay in dataset order
        ranked.sort_by(|a, b| b.seat_available.cmp(&a.seat_available));
        Dataset::new(ranked.into_iter().take(n).cloned().collect())
    }

    /// Equal-width buckets over the observed min/max of `field`.
    ///
    /// When every value is the same, all buckets collapse onto that value and
    /// only the first one is non-empty.
    pub fn histogram(
        &self,
        field: NumericField,
        bucket_count: usize,
    ) -> Result<Vec<Bucket>, AggregateError> {
        if bucket_count == 0 {
            return Err(AggregateError::ZeroBuckets);
        }
        if self.dataset.is_empty() {
            return Err(AggregateError::EmptyInput);
        }

        let values: Vec<f64> = self.dataset.iter().map(|l| field.value(l)).collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AggregateError::NonFinite(field.label()));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bucket_count as f64;

        if width <= 0.0 {
            let mut buckets = vec![
                Bucket {
                    lo: min,
                    hi: min,
                    count: 0
                };
                bucket_count
            ];
            buckets[0].count = values.len();
            return Ok(buckets);
        }

        let mut buckets: Vec<Bucket> = (0..bucket_count)
            .map(|i| Bucket {
                lo: min + i as f64 * width,
                hi: if i + 1 == bucket_count {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count: 0,
            })
            .collect();

        for v in values {
            let idx = if v <= min {
                0
            } else {
                // (v - min) / width lands in (k, k+1] for bucket k
                (((v - min) / width).ceil() as usize).saturating_sub(1)
            };
            buckets[idx.min(bucket_count - 1)].count += 1;
        }
        Ok(buckets)
    }

    /// Route_Link of the first listing.
    pub fn route_link(&self) -> Option<&'a str> {
        self.dataset.get(0).map(|l| l.route_link.as_str())
    }

    /// Listings per Bus_Type, largest share first; ties in order of first
    /// appearance.
    pub fn bus_type_distribution(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for l in self.dataset {
            match counts.iter_mut().find(|(t, _)| *t == l.bus_type) {
                Some((_, n)) => *n += 1,
                None => counts.push((l.bus_type.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// (bus name, star rating, price) per listing.
    pub fn price_vs_rating(&self) -> Vec<(&'a str, f64, f64)> {
        self.dataset
            .iter()
            .map(|l| (l.bus_name.as_str(), l.star_rating, l.price))
            .collect()
    }

    /// (bus name, departing, reaching) per listing.
    pub fn departure_vs_arrival(&self) -> Vec<(&'a str, NaiveDateTime, NaiveDateTime)> {
        self.dataset
            .iter()
            .map(|l| (l.bus_name.as_str(), l.departing_time, l.reaching_time))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(name: &str, bus_type: &str, price: f64, seats: u32) -> Listing {
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        Listing {
            bus_name: name.to_string(),
            route_link: format!("https://example.org/{name}"),
            route: "R1".to_string(),
            bus_type: bus_type.to_string(),
            departing_time: day.and_hms_opt(21, 0, 0).unwrap(),
            duration: "8h".to_string(),
            reaching_time: day.and_hms_opt(5, 0, 0).unwrap(),
            star_rating: 4.0,
            price,
            seat_available: seats,
            departure: "A".to_string(),
            arrival: "B".to_string(),
        }
    }

    fn priced(prices: &[f64]) -> Dataset {
        Dataset::new(
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| listing(&format!("bus{i}"), "Sleeper", *p, 1))
                .collect(),
        )
    }

    #[test]
    fn mean_price_of_three() {
        let ds = priced(&[10.0, 20.0, 30.0]);
        assert_eq!(Aggregator::new(&ds).mean_price(), Ok(20.0));
    }

    #[test]
    fn mean_price_rounds_to_cents() {
        let ds = priced(&[10.0, 10.0, 10.01]);
        assert_eq!(Aggregator::new(&ds).mean_price(), Ok(10.0));
    }

    #[test]
    fn mean_price_of_nothing_fails() {
        let ds = Dataset::empty();
        assert_eq!(
            Aggregator::new(&ds).mean_price(),
            Err(AggregateError::EmptyInput)
        );
    }

    #[test]
    fn top_n_keeps_tie_order() {
        let ds = Dataset::new(vec![
            listing("five", "S", 1.0, 5),
            listing("twelve-a", "S", 1.0, 12),
            listing("three", "S", 1.0, 3),
            listing("twelve-b", "S", 1.0, 12),
        ]);
        let top = Aggregator::new(&ds).top_n_by_availability(2);
        let names: Vec<_> = top.iter().map(|l| l.bus_name.as_str()).collect();
        assert_eq!(names, ["twelve-a", "twelve-b"]);
    }

    #[test]
    fn top_n_larger_than_dataset_returns_all() {
        let ds = Dataset::new(vec![listing("a", "S", 1.0, 1), listing("b", "S", 1.0, 9)]);
        let top = Aggregator::new(&ds).top_n_by_availability(10);
        let names: Vec<_> = top.iter().map(|l| l.bus_name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn histogram_single_value_collapses() {
        let ds = priced(&[1.0, 1.0, 1.0, 1.0]);
        let buckets = Aggregator::new(&ds).histogram(NumericField::Price, 5).unwrap();
        assert_eq!(buckets.len(), 5);
        let non_empty: Vec<_> = buckets.iter().filter(|b| b.count > 0).collect();
        assert_eq!(non_empty.len(), 1);
        assert_eq!(non_empty[0].count, 4);
    }

    #[test]
    fn histogram_edges_are_right_closed() {
        let ds = priced(&[0.0, 2.5, 5.0, 7.5, 10.0]);
        let buckets = Aggregator::new(&ds).histogram(NumericField::Price, 4).unwrap();
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        // [0, 2.5] (2.5, 5] (5, 7.5] (7.5, 10]
        assert_eq!(counts, [2, 1, 1, 1]);
        assert_eq!(buckets[0].lo, 0.0);
        assert_eq!(buckets[3].hi, 10.0);
    }

    #[test]
    fn histogram_counts_every_row() {
        let ds = priced(&[499.0, 512.5, 650.0, 650.0, 1020.75, 780.0, 333.3]);
        let buckets = Aggregator::new(&ds).histogram(NumericField::Price, 50).unwrap();
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 7);
        assert_eq!(buckets.last().unwrap().count, 1);
    }

    #[test]
    fn histogram_errors() {
        let empty = Dataset::empty();
        assert_eq!(
            Aggregator::new(&empty).histogram(NumericField::StarRating, 10),
            Err(AggregateError::EmptyInput)
        );
        let ds = priced(&[1.0]);
        assert_eq!(
            Aggregator::new(&ds).histogram(NumericField::Price, 0),
            Err(AggregateError::ZeroBuckets)
        );
    }

    #[test]
    fn non_finite_values_are_rejected_not_bucketed() {
        let ds = priced(&[100.0, 200.0, f64::NAN]);
        let agg = Aggregator::new(&ds);
        assert_eq!(agg.mean_price(), Err(AggregateError::NonFinite("Price")));
        assert_eq!(
            agg.histogram(NumericField::Price, 50),
            Err(AggregateError::NonFinite("Price"))
        );

        let ds = priced(&[1.0, 2.0, f64::INFINITY]);
        assert_eq!(
            Aggregator::new(&ds).histogram(NumericField::Price, 10),
            Err(AggregateError::NonFinite("Price"))
        );
    }

    #[test]
    fn histogram_survives_extreme_spread() {
        let ds = priced(&[-f64::MAX, 0.0, f64::MAX]);
        let buckets = Aggregator::new(&ds).histogram(NumericField::Price, 4).unwrap();
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn histogram_over_seat_counts() {
        let ds = Dataset::new(
            [0, 10, 20, 20, 40]
                .iter()
                .enumerate()
                .map(|(i, seats)| listing(&format!("bus{i}"), "S", 1.0, *seats))
                .collect(),
        );
        let buckets = Aggregator::new(&ds).histogram(NumericField::SeatAvailable, 4).unwrap();
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        // [0, 10] (10, 20] (20, 30] (30, 40]
        assert_eq!(counts, [2, 2, 0, 1]);
        assert_eq!(NumericField::SeatAvailable.label(), "Seats Available");
    }

    #[test]
    fn bus_types_sorted_by_share() {
        let ds = Dataset::new(vec![
            listing("a", "Seater", 1.0, 1),
            listing("b", "Sleeper", 1.0, 1),
            listing("c", "Sleeper", 1.0, 1),
            listing("d", "A/C", 1.0, 1),
        ]);
        assert_eq!(
            Aggregator::new(&ds).bus_type_distribution(),
            vec![
                ("Sleeper".to_string(), 2),
                ("Seater".to_string(), 1),
                ("A/C".to_string(), 1)
            ]
        );
    }

    #[test]
    fn route_link_is_first_row() {
        let ds = Dataset::new(vec![listing("x", "S", 1.0, 1), listing("y", "S", 1.0, 1)]);
        assert_eq!(Aggregator::new(&ds).route_link(), Some("https://example.org/x"));
        assert_eq!(Aggregator::new(&Dataset::empty()).route_link(), None);
    }
}
