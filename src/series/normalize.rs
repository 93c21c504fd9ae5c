//! Raw dated records -> display-ready `ChartSeries`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::domain::{ChartSeries, DatedRecord, LastRecord};

const MONTH_ABBREV: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Labels used by the four-bucket fallback view.
pub const WEEK_LABELS: [&str; 4] = ["Sem1", "Sem2", "Sem3", "Sem4"];

/// Format a date as the chart axis shows it: `DD-Mon-YYYY`.
pub fn format_label(date: NaiveDate) -> String {
    format!(
        "{:02}-{}-{}",
        date.day(),
        MONTH_ABBREV[date.month0() as usize],
        date.year()
    )
}

/// Sort a copy of `records` by date and extract `value_field` (missing -> 0).
///
/// An empty input yields an empty series with no last date and no name.
pub fn normalize(records: &[DatedRecord], value_field: &str) -> ChartSeries {
    if records.is_empty() {
        return ChartSeries::default();
    }

    let mut sorted: Vec<&DatedRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let labels = sorted.iter().map(|r| format_label(r.date)).collect();
    let values = sorted.iter().map(|r| r.value_or_zero(value_field)).collect();

    ChartSeries {
        labels,
        values,
        last_record_date: sorted.last().map(|r| r.date),
        name: sorted[0].name().map(str::to_string),
    }
}

/// Derive the last-value summary of a series.
///
/// Falls back to `now` and 0 when the series is empty.
pub fn last_record(series: &ChartSeries, description: &str, now: DateTime<Utc>) -> LastRecord {
    let date = series
        .last_record_date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    LastRecord {
        date,
        value: series.last_value().unwrap_or(0.0),
        description: description.to_string(),
    }
}

/// Split a series into four equal-sized consecutive buckets and sum each.
///
/// Used when a secondary series is unavailable; buckets are labelled Sem1..Sem4.
pub fn weekly_buckets(records: &[DatedRecord], value_field: &str) -> ChartSeries {
    let mut sorted: Vec<&DatedRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let n = sorted.len();
    let part = n.div_ceil(WEEK_LABELS.len());
    let values = (0..WEEK_LABELS.len())
        .map(|i| {
            let start = (i * part).min(n);
            let end = ((i + 1) * part).min(n);
            sorted[start..end]
                .iter()
                .map(|r| r.value_or_zero(value_field))
                .sum()
        })
        .collect();

    ChartSeries {
        labels: WEEK_LABELS.iter().map(|s| s.to_string()).collect(),
        values,
        last_record_date: sorted.last().map(|r| r.date),
        name: None,
    }
}
