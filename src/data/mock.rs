//! Synthetic series for gaps in real data.
//!
//! The generator walks every day of the requested range and, for each numeric
//! field of a model record, draws a uniform value from the configured range.
//! Non-numeric fields are copied verbatim. Anything produced here must be
//! labelled with `MOCK_SUFFIX` by the caller.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::domain::{DateRange, DatedRecord, FieldValue};

/// Marker appended to the display name of synthesized series.
pub const MOCK_SUFFIX: &str = " (Mock)";

pub fn mock_label(name: &str) -> String {
    format!("{name}{MOCK_SUFFIX}")
}

/// Whether a series needs gap-filling: empty, or every value is zero.
pub fn is_degenerate(records: &[DatedRecord], value_field: &str) -> bool {
    records.iter().all(|r| r.value_or_zero(value_field) == 0.0)
}

/// Value bounds for synthetic numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRanges {
    /// Same `[min, max]` for every numeric field.
    Single(f64, f64),
    /// Per-field bounds, with a fallback for unlisted fields.
    PerField {
        ranges: HashMap<String, (f64, f64)>,
        fallback: (f64, f64),
    },
}

impl ValueRanges {
    pub fn range_for(&self, field: &str) -> (f64, f64) {
        let (a, b) = match self {
            ValueRanges::Single(a, b) => (*a, *b),
            ValueRanges::PerField { ranges, fallback } => {
                ranges.get(field).copied().unwrap_or(*fallback)
            }
        };
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl Default for ValueRanges {
    fn default() -> Self {
        ValueRanges::Single(50.0, 150.0)
    }
}

pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    /// Deterministic generator (tests, reproducible demo runs).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded generator whose stream depends on `base` and the request identity.
    pub fn for_request(base: u64, request: impl Hash) -> Self {
        let mut hasher = DefaultHasher::new();
        base.hash(&mut hasher);
        request.hash(&mut hasher);
        Self::seeded(hasher.finish())
    }

    /// One record per calendar day of `range` (inclusive), shaped like `model`.
    pub fn generate(&mut self, model: &DatedRecord, ranges: &ValueRanges, range: &DateRange) -> Vec<DatedRecord> {
        let mut out = Vec::with_capacity(range.day_count());
        for date in range.days() {
            let mut record = DatedRecord::new(date);
            for (field, value) in &model.fields {
                let v = if value.is_number() {
                    FieldValue::Number(self.draw(ranges.range_for(field)))
                } else {
                    value.clone()
                };
                record.fields.insert(field.clone(), v);
            }
            out.push(record);
        }
        out
    }

    fn draw(&mut self, (lo, hi): (f64, f64)) -> f64 {
        if !(lo.is_finite() && hi.is_finite()) || lo == hi {
            return if lo.is_finite() { lo } else { 0.0 };
        }
        self.rng.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn one_record_per_day_inclusive() {
        let range = DateRange::new(d(1, 30), d(2, 2)).unwrap();
        let model = DatedRecord::new(d(5, 5)).with("value", 0.0);
        let out = MockGenerator::seeded(1).generate(&model, &ValueRanges::default(), &range);

        assert_eq!(out.len(), 4);
        assert_eq!(
            out.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![d(1, 30), d(1, 31), d(2, 1), d(2, 2)]
        );
        for r in &out {
            let v = r.value("value").unwrap();
            assert!((50.0..=150.0).contains(&v), "value {v} out of range");
        }
    }

    #[test]
    fn copies_text_fields_and_honours_per_field_ranges() {
        let range = DateRange::new(d(3, 1), d(3, 10)).unwrap();
        let model = DatedRecord::new(d(1, 1))
            .with("births", 3.0)
            .with("deaths", 1.0)
            .with("name", "Lote 4");
        let ranges = ValueRanges::PerField {
            ranges: HashMap::from([("births".to_string(), (0.0, 2.0))]),
            fallback: (10.0, 20.0),
        };
        let out = MockGenerator::seeded(9).generate(&model, &ranges, &range);

        assert_eq!(out.len(), 10);
        for r in &out {
            assert!((0.0..=2.0).contains(&r.value("births").unwrap()));
            assert!((10.0..=20.0).contains(&r.value("deaths").unwrap()));
            assert_eq!(r.name(), Some("Lote 4"));
        }
    }

    #[test]
    fn same_request_same_stream() {
        let range = DateRange::new(d(1, 1), d(1, 5)).unwrap();
        let model = DatedRecord::new(d(1, 1)).with("value", 1.0);
        let a = MockGenerator::for_request(42, ("farm", 3)).generate(&model, &ValueRanges::default(), &range);
        let b = MockGenerator::for_request(42, ("farm", 3)).generate(&model, &ValueRanges::default(), &range);
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_detection() {
        let zero = vec![DatedRecord::new(d(1, 1)).with("value", 0.0), DatedRecord::new(d(1, 2))];
        let real = vec![DatedRecord::new(d(1, 1)).with("value", 0.0), DatedRecord::new(d(1, 2)).with("value", 3.0)];
        assert!(is_degenerate(&[], "value"));
        assert!(is_degenerate(&zero, "value"));
        assert!(!is_degenerate(&real, "value"));
        assert_eq!(mock_label("Estanque"), "Estanque (Mock)");
    }
}
