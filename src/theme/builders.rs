//! Per-theme processing: fetched series in, `ThemeResult` out.
//!
//! Primary series that fail to load (or come back empty / all zero) are
//! replaced by generated data and labelled as such. Auxiliary series are never
//! synthesized; a failed auxiliary fetch counts as "no data".

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::data::{FetchError, Metric, MockGenerator, SeriesFetcher, ValueRanges, is_degenerate, mock_label};
use crate::domain::{
    ChartData, ChartSeries, DateRange, DatedRecord, Dataset, EntityKind, EntityRef, Group, Kpi, KpiType, Tab,
    ThemeKind, ThemeResult, VALUE_FIELD,
};
use crate::error::ThemeError;
use crate::kpi::{
    FIELD_BIRTHS, FIELD_DEATHS, FIELD_ENTRIES, FIELD_EXITS, FIELD_TOTAL_POPULATION, KpiTargets, calculate_kpis,
    participation_kpis,
};
use crate::series::{AlignInput, aggregate, align, fill_missing_groups, last_record, normalize, project, weekly_buckets};
use crate::theme::registry::{ThemeInputs, ThemeSpec};

const FIELD_MILK: &str = "milk";
const COMBINED_TITLE: &str = "Combinado";

/// Knobs shared by every builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSettings {
    pub mock_ranges: ValueRanges,
    /// Group production types that get their own tab, in display order.
    pub group_categories: Vec<String>,
    /// How many groups the participation KPIs list.
    pub top_shares: usize,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            mock_ranges: ValueRanges::default(),
            group_categories: vec!["estanque".to_string(), "descarte".to_string()],
            top_shares: 5,
        }
    }
}

/// Everything one theme build needs. Owned by a single request.
pub struct ThemeContext<'a> {
    pub fetcher: &'a dyn SeriesFetcher,
    pub entity: EntityRef,
    pub range: DateRange,
    pub cancel: &'a CancellationToken,
    pub targets: &'a KpiTargets,
    pub settings: &'a ThemeSettings,
    pub generator: MockGenerator,
    pub now: DateTime<Utc>,
}

/// A primary series plus whether it was synthesized.
struct Primary {
    records: Vec<DatedRecord>,
    mocked: bool,
}

impl Primary {
    fn label(&self, name: &str) -> String {
        if self.mocked { mock_label(name) } else { name.to_string() }
    }
}

impl ThemeContext<'_> {
    fn check_cancelled(&self) -> Result<(), ThemeError> {
        if self.cancel.is_cancelled() { Err(ThemeError::Cancelled) } else { Ok(()) }
    }

    fn synthesize(&mut self, model: Option<&DatedRecord>) -> Vec<DatedRecord> {
        let model = model
            .cloned()
            .unwrap_or_else(|| DatedRecord::new(self.range.start).with(VALUE_FIELD, 0.0));
        self.generator.generate(&model, &self.settings.mock_ranges, &self.range)
    }

    async fn fetch_primary(&mut self, metric: Metric) -> Result<Primary, ThemeError> {
        let field = metric.value_field(self.entity.kind);
        let fetched = self
            .fetcher
            .fetch_series(self.entity, metric, &self.range, self.cancel)
            .await;

        let records = match fetched {
            Err(FetchError::Cancelled) => return Err(ThemeError::Cancelled),
            Err(e) => {
                tracing::warn!(entity = %self.entity, %metric, error = %e, "primary series unavailable, generating");
                Vec::new()
            }
            Ok(records) => records,
        };

        if is_degenerate(&records, field) {
            tracing::debug!(entity = %self.entity, %metric, "gap-filling primary series");
            let records = self.synthesize(records.first());
            return Ok(Primary { records, mocked: true });
        }
        Ok(Primary { records, mocked: false })
    }

    async fn fetch_auxiliary(&self, metric: Metric) -> Result<Vec<DatedRecord>, ThemeError> {
        match self
            .fetcher
            .fetch_series(self.entity, metric, &self.range, self.cancel)
            .await
        {
            Ok(records) => Ok(records),
            Err(FetchError::Cancelled) => Err(ThemeError::Cancelled),
            Err(e) => {
                tracing::warn!(entity = %self.entity, %metric, error = %e, "auxiliary series unavailable");
                Ok(Vec::new())
            }
        }
    }

    fn tab(&self, title: &str, chart_data: ChartData, last: &ChartSeries, description: &str) -> Tab {
        Tab {
            title: title.to_string(),
            chart_data,
            last_record: last_record(last, description, self.now),
            kpis_data: None,
            y_title: None,
        }
    }
}

/// Build one theme according to its registered input contract.
pub async fn build_theme(spec: &ThemeSpec, ctx: &mut ThemeContext<'_>) -> Result<ThemeResult, ThemeError> {
    ctx.check_cancelled()?;
    let result = match spec.inputs {
        ThemeInputs::Milk { milk, births } => build_milk(spec.kind, milk, births, ctx).await?,
        ThemeInputs::Population {
            total,
            births,
            deaths,
            entries,
            exits,
        } => build_population(spec.kind, [total, births, deaths, entries, exits], ctx).await?,
        ThemeInputs::Groups { metric } => build_groups(spec.kind, metric, ctx).await?,
        ThemeInputs::Synthetic => build_synthetic(spec.kind, ctx),
    };
    ctx.check_cancelled()?;
    Ok(result)
}

async fn build_milk(
    kind: ThemeKind,
    milk_metric: Metric,
    births_metric: Metric,
    ctx: &mut ThemeContext<'_>,
) -> Result<ThemeResult, ThemeError> {
    let milk = ctx.fetch_primary(milk_metric).await?;
    let births = ctx.fetch_auxiliary(births_metric).await?;
    let field = milk_metric.value_field(ctx.entity.kind);

    let milk_name = milk.label("Producción de Leche");
    let mut production = normalize(&milk.records, field);
    production.name = Some(milk_name.clone());
    let mut tabs = vec![Tab {
        y_title: Some("Litros".to_string()),
        ..ctx.tab(
            "Producción",
            ChartData::Series(production.clone()),
            &production,
            "Último registro de producción",
        )
    }];

    if births.is_empty() {
        let mut weekly = weekly_buckets(&milk.records, field);
        weekly.name = Some(milk.label("Producción Semanal"));
        tabs.push(ctx.tab(
            "Semanal",
            ChartData::Series(weekly.clone()),
            &weekly,
            "Última semana",
        ));
    } else {
        let aligned = align(&[
            AlignInput::new(&milk.records, FIELD_MILK).reading(field),
            AlignInput::new(&births, FIELD_BIRTHS),
        ]);
        let milk_line = normalize(&project(&aligned, FIELD_MILK), VALUE_FIELD);
        let births_line = normalize(&project(&aligned, FIELD_BIRTHS), VALUE_FIELD);
        let datasets = vec![
            Dataset::from_series(milk_name, &milk_line, None),
            Dataset::from_series("Nacimientos", &births_line, None),
        ];
        tabs.push(ctx.tab(
            "Nacimientos",
            ChartData::Datasets(datasets),
            &births_line,
            "Último registro de nacimientos",
        ));
    }

    let kpis = calculate_kpis(kind, &[milk.records.as_slice(), births.as_slice()], ctx.targets);
    Ok(ThemeResult::new(kind, tabs, label_kpis(kpis, milk.mocked)))
}

async fn build_population(
    kind: ThemeKind,
    metrics: [Metric; 5],
    ctx: &mut ThemeContext<'_>,
) -> Result<ThemeResult, ThemeError> {
    let [total_metric, births_metric, deaths_metric, entries_metric, exits_metric] = metrics;
    let total = ctx.fetch_primary(total_metric).await?;
    let births = ctx.fetch_auxiliary(births_metric).await?;
    let deaths = ctx.fetch_auxiliary(deaths_metric).await?;
    let entries = ctx.fetch_auxiliary(entries_metric).await?;
    let exits = ctx.fetch_auxiliary(exits_metric).await?;

    let aligned = align(&[
        AlignInput::new(&total.records, FIELD_TOTAL_POPULATION).reading(total_metric.value_field(ctx.entity.kind)),
        AlignInput::new(&births, FIELD_BIRTHS),
        AlignInput::new(&deaths, FIELD_DEATHS),
        AlignInput::new(&entries, FIELD_ENTRIES),
        AlignInput::new(&exits, FIELD_EXITS),
    ]);

    let mut population = normalize(&project(&aligned, FIELD_TOTAL_POPULATION), VALUE_FIELD);
    population.name = Some(total.label("Población Total"));

    let movements: Vec<Dataset> = [
        (FIELD_BIRTHS, "Nacimientos"),
        (FIELD_DEATHS, "Muertes"),
        (FIELD_ENTRIES, "Entradas"),
        (FIELD_EXITS, "Salidas"),
    ]
    .iter()
    .map(|(field, name)| Dataset::from_series(*name, &normalize(&project(&aligned, field), VALUE_FIELD), None))
    .collect();
    let last_births = normalize(&project(&aligned, FIELD_BIRTHS), VALUE_FIELD);

    let tabs = vec![
        Tab {
            y_title: Some("Animales".to_string()),
            ..ctx.tab(
                "Población",
                ChartData::Series(population.clone()),
                &population,
                "Último conteo de animales",
            )
        },
        ctx.tab(
            "Movimientos",
            ChartData::Datasets(movements),
            &last_births,
            "Último registro de nacimientos",
        ),
    ];

    let kpis = calculate_kpis(kind, &[aligned.as_slice()], ctx.targets);
    Ok(ThemeResult::new(kind, tabs, label_kpis(kpis, total.mocked)))
}

async fn build_groups(
    kind: ThemeKind,
    metric: Metric,
    ctx: &mut ThemeContext<'_>,
) -> Result<ThemeResult, ThemeError> {
    if ctx.entity.kind != EntityKind::Farm {
        return Err(ThemeError::Processing(format!("group production needs a farm, got {}", ctx.entity)));
    }

    let listed = match ctx.fetcher.list_groups(ctx.entity.id, ctx.cancel).await {
        Ok(groups) => groups,
        Err(FetchError::Cancelled) => return Err(ThemeError::Cancelled),
        Err(e) => {
            tracing::warn!(entity = %ctx.entity, error = %e, "group listing unavailable, generating");
            Vec::new()
        }
    };
    check_group_ids(&listed)?;
    let groups: Vec<Group> = listed
        .into_iter()
        .filter(|g| ctx.settings.group_categories.contains(&g.production_type))
        .collect();

    let (fetcher, range, cancel) = (ctx.fetcher, ctx.range, ctx.cancel);
    let fetches = groups
        .iter()
        .map(|g| fetcher.fetch_series(EntityRef::group(g.id), metric, &range, cancel));
    let mut series = Vec::with_capacity(groups.len());
    for (group, fetched) in groups.iter().zip(join_all(fetches).await) {
        match fetched {
            Ok(records) => series.push(records),
            Err(FetchError::Cancelled) => return Err(ThemeError::Cancelled),
            Err(e) => {
                tracing::warn!(group = group.id, error = %e, "group series unavailable");
                series.push(Vec::new());
            }
        }
    }

    let field = metric.value_field(EntityKind::Group);
    let filled = fill_missing_groups(&mut series, field, &ctx.settings.mock_ranges, &ctx.range, &mut ctx.generator);
    let agg = aggregate(&groups, &series, field)?;
    let settings = ctx.settings;
    let expected = ctx.targets.participation_share;
    let top = settings.top_shares;

    let mut tabs = Vec::with_capacity(settings.group_categories.len() + 1);
    for category in &settings.group_categories {
        let mut data = agg.category_series(category);
        let mocked = data.is_empty()
            || groups
                .iter()
                .enumerate()
                .any(|(idx, g)| &g.production_type == category && filled.contains(&idx));
        if data.is_empty() {
            data = ctx.synthesize(None);
        }
        let mut tab = group_tab(ctx, &capitalize(category), &data, mocked);
        let shares = participation_kpis(&agg.shares(Some(category), top), expected);
        tab.kpis_data = Some(label_kpis(shares, mocked));
        tabs.push(tab);
    }

    let categories: Vec<&str> = settings.group_categories.iter().map(String::as_str).collect();
    let mut combined = agg.combined_series(&categories);
    let mocked = combined.is_empty() || !filled.is_empty();
    if combined.is_empty() {
        combined = ctx.synthesize(None);
    }
    let kpis = label_kpis(participation_kpis(&agg.shares(None, top), expected), mocked);
    let mut tab = group_tab(ctx, COMBINED_TITLE, &combined, mocked);
    tab.kpis_data = Some(kpis.clone());
    tabs.push(tab);

    Ok(ThemeResult::new(kind, tabs, kpis))
}

/// A listing that repeats a group id cannot be attributed per group.
fn check_group_ids(groups: &[Group]) -> Result<(), ThemeError> {
    let mut seen = HashSet::new();
    match groups.iter().find(|g| !seen.insert(g.id)) {
        Some(dup) => Err(ThemeError::Processing(format!("group {} listed twice", dup.id))),
        None => Ok(()),
    }
}

fn group_tab(ctx: &ThemeContext<'_>, title: &str, data: &[DatedRecord], mocked: bool) -> Tab {
    let title = if mocked { mock_label(title) } else { title.to_string() };
    let line = normalize(data, VALUE_FIELD);
    let datasets = vec![Dataset::from_series(title.clone(), &line, Some(KpiType::Participation))];
    Tab {
        y_title: Some("Litros".to_string()),
        ..ctx.tab(&title, ChartData::Datasets(datasets), &line, "Último registro de producción")
    }
}

/// Company themes have no backing endpoint yet: generate and label them.
fn build_synthetic(kind: ThemeKind, ctx: &mut ThemeContext<'_>) -> ThemeResult {
    let data = ctx.synthesize(None);
    let mut daily = normalize(&data, VALUE_FIELD);
    daily.name = Some(mock_label(kind.display_name()));
    let mut weekly = weekly_buckets(&data, VALUE_FIELD);
    weekly.name = Some(mock_label("Resumen Semanal"));

    let tabs = vec![
        ctx.tab(
            &mock_label("Evolución"),
            ChartData::Series(daily.clone()),
            &daily,
            "Último valor generado",
        ),
        ctx.tab(
            &mock_label("Semanal"),
            ChartData::Series(weekly.clone()),
            &weekly,
            "Última semana",
        ),
    ];
    let kpis = calculate_kpis(kind, &[data.as_slice()], ctx.targets);
    ThemeResult::new(kind, tabs, label_kpis(kpis, true))
}

/// KPIs computed over generated data carry the same marker as their tabs.
fn label_kpis(mut kpis: Vec<Kpi>, mocked: bool) -> Vec<Kpi> {
    if mocked {
        for kpi in &mut kpis {
            kpi.desc = mock_label(&kpi.desc);
        }
    }
    kpis
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::data::{MOCK_SUFFIX, OfflineSource};
    use crate::theme::registry::lookup;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(d(1), d(3)).unwrap()
    }

    /// Serves fixed series per metric; anything unlisted fails with HTTP 500.
    struct FixedSource {
        series: HashMap<(u64, Metric), Vec<DatedRecord>>,
        groups: Result<Vec<Group>, FetchError>,
    }

    #[async_trait]
    impl SeriesFetcher for FixedSource {
        async fn fetch_series(
            &self,
            entity: EntityRef,
            metric: Metric,
            _range: &DateRange,
            _cancel: &CancellationToken,
        ) -> Result<Vec<DatedRecord>, FetchError> {
            self.series
                .get(&(entity.id, metric))
                .cloned()
                .ok_or(FetchError::Status(500))
        }

        async fn list_groups(&self, _farm_id: u64, _cancel: &CancellationToken) -> Result<Vec<Group>, FetchError> {
            self.groups.clone()
        }
    }

    fn points(field: &str, values: &[(u32, f64)]) -> Vec<DatedRecord> {
        values
            .iter()
            .map(|&(day, v)| DatedRecord::new(d(day)).with(field, v))
            .collect()
    }

    async fn run(fetcher: &dyn SeriesFetcher, entity: EntityRef, kind: ThemeKind) -> Result<ThemeResult, ThemeError> {
        let cancel = CancellationToken::new();
        let targets = KpiTargets::default();
        let settings = ThemeSettings::default();
        let mut ctx = ThemeContext {
            fetcher,
            entity,
            range: range(),
            cancel: &cancel,
            targets: &targets,
            settings: &settings,
            generator: MockGenerator::seeded(7),
            now: Utc::now(),
        };
        build_theme(lookup(kind), &mut ctx).await
    }

    fn series_name(tab: &Tab) -> Option<&str> {
        match &tab.chart_data {
            ChartData::Series(s) => s.name.as_deref(),
            ChartData::Datasets(ds) => ds.first().map(|d| d.name.as_str()),
        }
    }

    #[tokio::test]
    async fn milk_theme_with_real_data_and_births() {
        let mut series = HashMap::new();
        series.insert((1, Metric::MilkLiters), points("value", &[(1, 100.0), (2, 200.0)]));
        series.insert((1, Metric::Births), points("value", &[(2, 1.0)]));
        let source = FixedSource {
            series,
            groups: Ok(Vec::new()),
        };

        let result = run(&source, EntityRef::farm(1), ThemeKind::MilkProduction).await.unwrap();
        assert!(!result.error);
        assert_eq!(result.tabs.len(), 2);
        assert_eq!(series_name(&result.tabs[0]), Some("Producción de Leche"));
        let ChartData::Datasets(datasets) = &result.tabs[1].chart_data else {
            panic!("births tab should hold datasets");
        };
        assert_eq!(datasets[1].values, vec![0.0, 1.0]);
        assert_eq!(result.kpis_data.len(), 5);
        assert_eq!(result.kpis_data[0].value, 300.0);
        assert!(result.kpis_data.iter().all(|k| !k.desc.ends_with(MOCK_SUFFIX)));
    }

    #[tokio::test]
    async fn failed_milk_fetch_is_gap_filled_and_labelled() {
        let source = FixedSource {
            series: HashMap::new(),
            groups: Ok(Vec::new()),
        };
        let result = run(&source, EntityRef::farm(1), ThemeKind::MilkProduction).await.unwrap();

        assert!(!result.error);
        let ChartData::Series(line) = &result.tabs[0].chart_data else {
            panic!("production tab should hold a single series");
        };
        assert_eq!(line.len(), 3);
        assert!(line.values.iter().all(|v| (50.0..=150.0).contains(v)));
        assert!(series_name(&result.tabs[0]).unwrap().ends_with(MOCK_SUFFIX));
        // No births: weekly fallback.
        assert_eq!(result.tabs[1].title, "Semanal");
        assert!(!result.kpis_data.is_empty());
        assert!(result.kpis_data.iter().all(|k| k.desc.ends_with(MOCK_SUFFIX)));
    }

    #[tokio::test]
    async fn population_theme_aligns_movements() {
        let mut series = HashMap::new();
        series.insert((1, Metric::TotalAnimals), points("value", &[(1, 1000.0)]));
        series.insert((1, Metric::Births), points("value", &[(1, 10.0)]));
        series.insert((1, Metric::Deaths), points("value", &[(1, 2.0)]));
        let source = FixedSource {
            series,
            groups: Ok(Vec::new()),
        };

        let result = run(&source, EntityRef::farm(1), ThemeKind::PopulationDynamics).await.unwrap();
        assert_eq!(result.tabs.len(), 2);
        assert_eq!(series_name(&result.tabs[0]), Some("Población Total"));
        let birth_rate = result.kpis_data.iter().find(|k| k.name == "Tasa de Natalidad").unwrap();
        assert!((birth_rate.value - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn group_theme_builds_category_and_combined_tabs() {
        let groups = vec![
            Group {
                id: 10,
                name: "Lote A".into(),
                production_type: "estanque".into(),
            },
            Group {
                id: 11,
                name: "Lote B".into(),
                production_type: "descarte".into(),
            },
            Group {
                id: 12,
                name: "Terneras".into(),
                production_type: "cria".into(),
            },
        ];
        let mut series = HashMap::new();
        series.insert((10, Metric::MilkLiters), points("milkLiters", &[(1, 30.0), (2, 30.0)]));
        series.insert((11, Metric::MilkLiters), points("milkLiters", &[(1, 10.0), (2, 10.0)]));
        let source = FixedSource {
            series,
            groups: Ok(groups),
        };

        let result = run(&source, EntityRef::farm(1), ThemeKind::GroupProduction).await.unwrap();
        let titles: Vec<&str> = result.tabs.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Estanque", "Descarte", "Combinado"]);

        let ChartData::Datasets(combined) = &result.tabs[2].chart_data else {
            panic!("combined tab should hold datasets");
        };
        assert_eq!(combined[0].values, vec![40.0, 40.0]);
        assert_eq!(combined[0].kind, Some(KpiType::Participation));

        assert_eq!(result.kpis_data.len(), 2);
        assert_eq!(result.kpis_data[0].name, "Lote A");
        assert_eq!(result.kpis_data[0].value, 75.0);
        assert_eq!(result.kpis_data[1].value, 25.0);
        // Lote B has data, so nothing was filled in.
        assert!(result.kpis_data.iter().all(|k| !k.desc.ends_with(MOCK_SUFFIX)));
    }

    #[tokio::test]
    async fn group_listing_failure_falls_back_to_mock_tabs() {
        let source = FixedSource {
            series: HashMap::new(),
            groups: Err(FetchError::Status(503)),
        };
        let result = run(&source, EntityRef::farm(1), ThemeKind::GroupProduction).await.unwrap();
        assert_eq!(result.tabs.len(), 3);
        assert!(result.tabs.iter().all(|t| t.title.ends_with(MOCK_SUFFIX)));
        assert!(result.kpis_data.is_empty());
    }

    #[tokio::test]
    async fn duplicate_group_ids_are_malformed() {
        let lote = Group {
            id: 5,
            name: "Lote".into(),
            production_type: "estanque".into(),
        };
        let source = FixedSource {
            series: HashMap::new(),
            groups: Ok(vec![lote.clone(), lote]),
        };
        let err = run(&source, EntityRef::farm(1), ThemeKind::GroupProduction).await.unwrap_err();
        assert!(matches!(err, ThemeError::Processing(_)));
    }

    #[tokio::test]
    async fn offline_groups_are_all_mocked() {
        let source = OfflineSource::demo();
        let result = run(&source, EntityRef::farm(1), ThemeKind::GroupProduction).await.unwrap();
        assert!(result.tabs.iter().all(|t| t.title.ends_with(MOCK_SUFFIX)));
        let total: f64 = result.kpis_data.iter().map(|k| k.value).sum();
        assert!((total - 100.0).abs() < 0.5);
        assert!(result.kpis_data.iter().all(|k| k.desc.ends_with(MOCK_SUFFIX)));
    }

    #[tokio::test]
    async fn synthetic_company_theme() {
        let source = OfflineSource::default();
        let result = run(&source, EntityRef::company(4), ThemeKind::CorporateFinances).await.unwrap();
        assert_eq!(result.theme, "Finanzas Corporativas");
        assert!(result.tabs.iter().all(|t| t.title.ends_with(MOCK_SUFFIX)));
        assert_eq!(result.kpis_data.len(), 2);
    }

    #[tokio::test]
    async fn cancelled_context_stops_before_fetching() {
        let source = OfflineSource::demo();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let targets = KpiTargets::default();
        let settings = ThemeSettings::default();
        let mut ctx = ThemeContext {
            fetcher: &source,
            entity: EntityRef::farm(1),
            range: range(),
            cancel: &cancel,
            targets: &targets,
            settings: &settings,
            generator: MockGenerator::seeded(1),
            now: Utc::now(),
        };
        let err = build_theme(lookup(ThemeKind::MilkProduction), &mut ctx).await.unwrap_err();
        assert_eq!(err, ThemeError::Cancelled);
    }
}
