//! Merge independently fetched series onto the union of their dates.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DatedRecord, VALUE_FIELD};

/// One series to merge, and the field name it lands under.
#[derive(Debug, Clone, Copy)]
pub struct AlignInput<'a> {
    pub records: &'a [DatedRecord],
    /// Field read from each source record.
    pub source_field: &'a str,
    /// Field written on the merged record.
    pub target_field: &'a str,
}

impl<'a> AlignInput<'a> {
    /// Read the conventional `value` field and store it as `target_field`.
    pub fn new(records: &'a [DatedRecord], target_field: &'a str) -> Self {
        Self {
            records,
            source_field: VALUE_FIELD,
            target_field,
        }
    }

    pub fn reading(mut self, source_field: &'a str) -> Self {
        self.source_field = source_field;
        self
    }
}

/// Merge series into one record per date, ascending.
///
/// Every merged record carries every target field; dates a series does not
/// report default to 0. Duplicate dates within one series: last write wins.
pub fn align(inputs: &[AlignInput<'_>]) -> Vec<DatedRecord> {
    let mut merged: BTreeMap<NaiveDate, DatedRecord> = BTreeMap::new();

    for input in inputs {
        for record in input.records {
            let entry = merged.entry(record.date).or_insert_with(|| {
                let mut zeroed = DatedRecord::new(record.date);
                for other in inputs {
                    zeroed.set(other.target_field, 0.0);
                }
                zeroed
            });
            entry.set(input.target_field, record.value_or_zero(input.source_field));
        }
    }

    merged.into_values().collect()
}

/// Extract one field of an aligned stream back into a single-field series.
pub fn project(records: &[DatedRecord], field: &str) -> Vec<DatedRecord> {
    records
        .iter()
        .map(|r| DatedRecord::new(r.date).with(VALUE_FIELD, r.value_or_zero(field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> Vec<DatedRecord> {
        points
            .iter()
            .map(|&(day, v)| DatedRecord::new(d(day)).with("value", v))
            .collect()
    }

    #[test]
    fn union_of_dates_with_zero_defaults() {
        let births = series(&[(3, 2.0), (1, 1.0)]);
        let deaths = series(&[(2, 5.0)]);
        let merged = align(&[AlignInput::new(&births, "births"), AlignInput::new(&deaths, "deaths")]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.iter().map(|r| r.date).collect::<Vec<_>>(), vec![d(1), d(2), d(3)]);
        assert_eq!(merged[0].value("births"), Some(1.0));
        assert_eq!(merged[0].value("deaths"), Some(0.0));
        assert_eq!(merged[1].value("births"), Some(0.0));
        assert_eq!(merged[1].value("deaths"), Some(5.0));
    }

    #[test]
    fn aligning_a_series_with_itself_keeps_distinct_dates() {
        let s = series(&[(1, 1.0), (2, 2.0), (4, 4.0)]);
        let merged = align(&[AlignInput::new(&s, "a"), AlignInput::new(&s, "b")]);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|r| r.value("a") == r.value("b")));
    }

    #[test]
    fn duplicate_dates_last_write_wins() {
        let s = series(&[(1, 1.0), (1, 9.0)]);
        let merged = align(&[AlignInput::new(&s, "x")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value("x"), Some(9.0));
    }

    #[test]
    fn custom_source_field_and_projection() {
        let groups = vec![DatedRecord::new(d(1)).with("milkLiters", 12.5)];
        let merged = align(&[AlignInput::new(&groups, "milk").reading("milkLiters")]);
        assert_eq!(merged[0].value("milk"), Some(12.5));

        let back = project(&merged, "milk");
        assert_eq!(back[0].value("value"), Some(12.5));
    }
}
