//! Per-category aggregation of animal-group series.
//!
//! Groups are bucketed by `production_type`. For each bucket we keep a
//! date -> sum map (for charts) and, per group, a period total (for the
//! participation shares).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::mock::{MockGenerator, ValueRanges, is_degenerate};
use crate::domain::{DateRange, DatedRecord, Group, VALUE_FIELD};

/// Period total of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub id: u64,
    pub name: String,
    pub sum: f64,
    pub category: String,
}

/// Percentage of a category (or of all categories) contributed by one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupShare {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub share: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GroupAggregate {
    pub per_category: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    /// One entry per input group, in input order.
    pub per_group: Vec<GroupTotal>,
}

/// Sum `value_field` per category and date, and per group over the period.
///
/// `series_per_group[i]` belongs to `groups[i]`.
pub fn aggregate(
    groups: &[Group],
    series_per_group: &[Vec<DatedRecord>],
    value_field: &str,
) -> Result<GroupAggregate, String> {
    if groups.len() != series_per_group.len() {
        return Err(format!(
            "{} groups but {} series supplied",
            groups.len(),
            series_per_group.len()
        ));
    }

    let mut out = GroupAggregate::default();
    for (group, records) in groups.iter().zip(series_per_group) {
        let by_date = out
            .per_category
            .entry(group.production_type.clone())
            .or_default();

        let mut sum = 0.0;
        for r in records {
            let v = r.value_or_zero(value_field);
            *by_date.entry(r.date).or_insert(0.0) += v;
            sum += v;
        }

        out.per_group.push(GroupTotal {
            id: group.id,
            name: group.name.clone(),
            sum,
            category: group.production_type.clone(),
        });
    }

    Ok(out)
}

impl GroupAggregate {
    pub fn group_total(&self, id: u64) -> Option<&GroupTotal> {
        self.per_group.iter().find(|g| g.id == id)
    }

    /// The summed series of one category, ascending by date (empty if unknown).
    pub fn category_series(&self, category: &str) -> Vec<DatedRecord> {
        self.per_category
            .get(category)
            .map(|by_date| to_records(by_date.iter().map(|(d, v)| (*d, *v))))
            .unwrap_or_default()
    }

    /// Date-wise sum across the given categories.
    pub fn combined_series(&self, categories: &[&str]) -> Vec<DatedRecord> {
        let mut combined: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for category in categories {
            if let Some(by_date) = self.per_category.get(*category) {
                for (date, v) in by_date {
                    *combined.entry(*date).or_insert(0.0) += v;
                }
            }
        }
        to_records(combined.into_iter())
    }

    /// Top `top_n` group shares within `category`, or across all groups when `None`.
    ///
    /// Shares are `100 * group / category total`, 0 when the total is 0.
    /// Ties keep input order.
    pub fn shares(&self, category: Option<&str>, top_n: usize) -> Vec<GroupShare> {
        let members: Vec<&GroupTotal> = self
            .per_group
            .iter()
            .filter(|g| category.is_none_or(|c| g.category == c))
            .collect();
        let total: f64 = members.iter().map(|g| g.sum).sum();

        let mut shares: Vec<GroupShare> = members
            .into_iter()
            .map(|g| GroupShare {
                id: g.id,
                name: g.name.clone(),
                category: g.category.clone(),
                share: if total > 0.0 { 100.0 * g.sum / total } else { 0.0 },
            })
            .collect();

        shares.sort_by(|a, b| b.share.partial_cmp(&a.share).unwrap_or(std::cmp::Ordering::Equal));
        shares.truncate(top_n);
        shares
    }
}

fn to_records(points: impl Iterator<Item = (NaiveDate, f64)>) -> Vec<DatedRecord> {
    points
        .map(|(date, v)| DatedRecord::new(date).with(VALUE_FIELD, v))
        .collect()
}

/// Replace every degenerate group series with synthetic data over `range`.
///
/// The model record is the first record of the first group that has real data;
/// without any, a bare `{value_field: 0}` model is used. Returns the indexes of
/// the groups that were synthesized.
pub fn fill_missing_groups(
    series_per_group: &mut [Vec<DatedRecord>],
    value_field: &str,
    ranges: &ValueRanges,
    range: &DateRange,
    generator: &mut MockGenerator,
) -> Vec<usize> {
    let model = series_per_group
        .iter()
        .find(|s| !is_degenerate(s, value_field))
        .and_then(|s| s.first().cloned())
        .unwrap_or_else(|| DatedRecord::new(range.start).with(value_field, 0.0));

    let mut filled = Vec::new();
    for (idx, series) in series_per_group.iter_mut().enumerate() {
        if is_degenerate(series, value_field) {
            *series = generator.generate(&model, ranges, range);
            filled.push(idx);
        }
    }
    filled
}
