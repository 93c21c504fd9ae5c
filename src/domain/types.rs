//! Shared domain types.
//!
//! Records enter the pipeline as `DatedRecord`s (one per day, any number of
//! named fields) and leave it as `ThemeResult`s. The output types serialize to
//! the camelCase JSON shape the chart renderer reads verbatim.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Name of the field most endpoints use for their single metric.
pub const VALUE_FIELD: &str = "value";

/// A single field of a dated record.
///
/// Numeric fields are the ones the pipeline computes on; anything else is
/// carried along untouched (names, units, flags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FieldValue::Number(_))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One observation day: a calendar date plus named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedRecord {
    #[serde(deserialize_with = "deserialize_api_date")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl DatedRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for tests and synthetic data.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Numeric value of `field`, if present and numeric.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldValue::as_number)
    }

    pub fn value_or_zero(&self, field: &str) -> f64 {
        self.value(field).unwrap_or(0.0)
    }

    /// Upstream display name carried on the record, if any.
    pub fn name(&self) -> Option<&str> {
        match self.fields.get("name") {
            Some(FieldValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Parse a date as the API sends it: `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

fn deserialize_api_date<'de, D>(d: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_api_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid record date '{raw}'")))
}

/// Inclusive calendar range used for every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::new(
                2,
                format!("Invalid date range: start {start} is after end {end}."),
            ));
        }
        Ok(Self { start, end })
    }

    /// One year back from `today`, the dashboard's default window.
    pub fn last_year(today: NaiveDate) -> Self {
        let start = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        Self { start, end: today }
    }

    /// Number of calendar days in the range (inclusive), 0 when inverted.
    pub fn day_count(&self) -> usize {
        let span = (self.end - self.start).num_days();
        if span < 0 { 0 } else { span as usize + 1 }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.day_count()).map(move |i| self.start + Duration::days(i as i64))
    }

    pub fn from_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn to_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Kind of entity a request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Company,
    Farm,
    Group,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Farm => "farm",
            EntityKind::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u64,
}

impl EntityRef {
    pub fn farm(id: u64) -> Self {
        Self { kind: EntityKind::Farm, id }
    }

    pub fn group(id: u64) -> Self {
        Self { kind: EntityKind::Group, id }
    }

    pub fn company(id: u64) -> Self {
        Self { kind: EntityKind::Company, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// An animal group within a farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    /// Category label used to bucket aggregation (e.g. `estanque`, `descarte`).
    #[serde(rename = "productionType", alias = "production_type", default)]
    pub production_type: String,
}

/// Display-ready series: index-aligned labels and values, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub last_record_date: Option<NaiveDate>,
    pub name: Option<String>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// How a KPI (or a dataset feeding one) should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiType {
    Efficiency,
    Participation,
}

/// A named series inside a multi-series tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<KpiType>,
}

impl Dataset {
    pub fn from_series(name: impl Into<String>, series: &ChartSeries, kind: Option<KpiType>) -> Self {
        Self {
            name: name.into(),
            labels: series.labels.clone(),
            values: series.values.clone(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartData {
    Series(ChartSeries),
    Datasets(Vec<Dataset>),
}

/// Last-value summary shown next to a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRecord {
    pub date: DateTime<Utc>,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub name: String,
    pub value: f64,
    /// Static target the value is compared against.
    pub expected: f64,
    pub unit: String,
    pub desc: String,
    pub icon: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<KpiType>,
}

/// One chart view within a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub title: String,
    pub chart_data: ChartData,
    pub last_record: LastRecord,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kpis_data: Option<Vec<Kpi>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y_title: Option<String>,
}

/// Dashboard topics, in the order they are declared per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKind {
    MilkProduction,
    GroupProduction,
    PopulationDynamics,
    CorporateFinances,
    FarmManagement,
    MarketAnalysis,
}

impl ThemeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeKind::MilkProduction => "milk_production",
            ThemeKind::GroupProduction => "group_production",
            ThemeKind::PopulationDynamics => "population_dynamics",
            ThemeKind::CorporateFinances => "corporate_finances",
            ThemeKind::FarmManagement => "farm_management",
            ThemeKind::MarketAnalysis => "market_analysis",
        }
    }

    /// Human-readable name shown as the theme header.
    pub fn display_name(self) -> &'static str {
        match self {
            ThemeKind::MilkProduction => "Producción de Leche",
            ThemeKind::GroupProduction => "Producción por Grupos",
            ThemeKind::PopulationDynamics => "Dinámica Poblacional",
            ThemeKind::CorporateFinances => "Finanzas Corporativas",
            ThemeKind::FarmManagement => "Gestión de Granjas",
            ThemeKind::MarketAnalysis => "Análisis de Mercado",
        }
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one theme: the unit the orchestrator caches and the renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeResult {
    pub key: ThemeKind,
    pub theme: String,
    pub tabs: Vec<Tab>,
    pub kpis_data: Vec<Kpi>,
    /// Set when processing failed and `tabs` was emptied.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub error: bool,
}

impl ThemeResult {
    pub fn new(key: ThemeKind, tabs: Vec<Tab>, kpis_data: Vec<Kpi>) -> Self {
        Self {
            key,
            theme: key.display_name().to_string(),
            tabs,
            kpis_data,
            error: false,
        }
    }

    pub fn failed(key: ThemeKind) -> Self {
        Self {
            key,
            theme: key.display_name().to_string(),
            tabs: Vec::new(),
            kpis_data: Vec::new(),
            error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_record_parses_flat_api_shape() {
        let json = r#"{"date":"2024-03-05T00:00:00.000Z","value":12,"milkLiters":3.5,"name":"Norte"}"#;
        let rec: DatedRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(rec.value("value"), Some(12.0));
        assert_eq!(rec.value("milkLiters"), Some(3.5));
        assert_eq!(rec.value("name"), None);
        assert_eq!(rec.name(), Some("Norte"));
    }

    #[test]
    fn dated_record_rejects_bad_date() {
        let json = r#"{"date":"05/03/2024","value":1}"#;
        assert!(serde_json::from_str::<DatedRecord>(json).is_err());
    }

    #[test]
    fn date_range_counts_inclusive_days() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        let range = DateRange::new(d(27), d(29)).unwrap();
        assert_eq!(range.day_count(), 3);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d(27), d(28), d(29)]);
        assert!(DateRange::new(d(29), d(27)).is_err());
    }

    #[test]
    fn theme_result_serializes_renderer_field_names() {
        let result = ThemeResult::failed(ThemeKind::MilkProduction);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["theme"], "Producción de Leche");
        assert_eq!(json["key"], "milk_production");
        assert_eq!(json["error"], true);
        assert!(json["kpisData"].as_array().unwrap().is_empty());

        let ok = ThemeResult::new(ThemeKind::MarketAnalysis, Vec::new(), Vec::new());
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
    }
}
