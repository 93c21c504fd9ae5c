//! Summary metrics per theme.
//!
//! All divisions are guarded: an empty denominator yields 0, never NaN.

use std::collections::HashSet;

use crate::domain::{DatedRecord, Kpi, KpiType, ThemeKind, VALUE_FIELD};
use crate::kpi::targets::{GenericTargets, KpiTargets, MilkTargets, PopulationTargets};
use crate::series::GroupShare;

/// Field names of the aligned population-dynamics stream.
pub const FIELD_BIRTHS: &str = "births";
pub const FIELD_DEATHS: &str = "deaths";
pub const FIELD_ENTRIES: &str = "entries";
pub const FIELD_EXITS: &str = "exits";
pub const FIELD_TOTAL_POPULATION: &str = "total_population";

/// Days per month used to normalize birth rates.
const DAYS_PER_MONTH: f64 = 30.0;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

fn kpi(name: &str, value: f64, expected: f64, unit: &str, desc: &str, icon: &str) -> Kpi {
    Kpi {
        name: name.to_string(),
        value,
        expected,
        unit: unit.to_string(),
        desc: desc.to_string(),
        icon: icon.to_string(),
        kind: None,
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

fn sum(records: &[DatedRecord], field: &str) -> f64 {
    records.iter().map(|r| r.value_or_zero(field)).sum()
}

/// Dispatch to the calculator registered for `theme`.
///
/// `series[0]` is the theme's primary series. Milk production reads births from
/// `series[1]`; population dynamics expects the aligned stream in `series[0]`.
/// Themes without a dedicated calculator get the generic total/average pair.
pub fn calculate_kpis(theme: ThemeKind, series: &[&[DatedRecord]], targets: &KpiTargets) -> Vec<Kpi> {
    let primary = series.first().copied().unwrap_or(&[]);
    match theme {
        ThemeKind::MilkProduction => milk_kpis(primary, series.get(1).copied(), &targets.milk),
        ThemeKind::PopulationDynamics => population_kpis(primary, &targets.population),
        _ => generic_kpis(primary, &targets.generic),
    }
}

/// Milk production KPIs. An empty milk series produces no KPIs.
pub fn milk_kpis(milk: &[DatedRecord], births: Option<&[DatedRecord]>, targets: &MilkTargets) -> Vec<Kpi> {
    if milk.is_empty() {
        return Vec::new();
    }

    let total_milk = sum(milk, VALUE_FIELD);
    let days = milk.iter().map(|r| r.date).collect::<HashSet<_>>().len() as f64;
    let avg_milk = safe_div(total_milk, days);
    let total_births = births.map(|b| sum(b, VALUE_FIELD)).unwrap_or(0.0);
    let birth_rate = safe_div(total_births, days) * DAYS_PER_MONTH;
    let milk_per_birth = if total_births > 0.0 { total_milk / total_births } else { 0.0 };

    vec![
        kpi(
            "Producción Total",
            total_milk.round(),
            targets.total_milk,
            "L",
            "Suma total de leche producida en el período seleccionado.",
            "fa-tint",
        ),
        kpi(
            "Promedio Diario",
            avg_milk.round(),
            targets.avg_milk,
            "L/día",
            "Producción promedio de leche por día.",
            "fa-calendar-day",
        ),
        kpi(
            "Total Nacimientos",
            total_births.round(),
            targets.total_births,
            "",
            "Número total de nacimientos en el período.",
            "fa-baby",
        ),
        kpi(
            "Tasa Natalidad",
            birth_rate.round(),
            targets.birth_rate,
            "/mes",
            "Tasa de nacimientos mensual.",
            "fa-chart-line",
        ),
        Kpi {
            kind: Some(KpiType::Efficiency),
            ..kpi(
                "Leche por Nacimiento",
                milk_per_birth.round(),
                targets.milk_per_birth,
                "L",
                "Litros de leche producidos por nacimiento.",
                "fa-balance-scale",
            )
        },
    ]
}

/// Population dynamics KPIs over an aligned births/deaths/entries/exits/total stream.
///
/// Rates are percentages of the mean `total_population`, including the growth
/// rate, which takes the net change over the whole range. Everything is 0 when
/// the mean population is 0.
pub fn population_kpis(aligned: &[DatedRecord], targets: &PopulationTargets) -> Vec<Kpi> {
    if aligned.is_empty() {
        return Vec::new();
    }

    let days = aligned.len() as f64;
    let births = sum(aligned, FIELD_BIRTHS);
    let deaths = sum(aligned, FIELD_DEATHS);
    let entries = sum(aligned, FIELD_ENTRIES);
    let exits = sum(aligned, FIELD_EXITS);
    let avg_population = sum(aligned, FIELD_TOTAL_POPULATION) / days;

    let birth_rate = 100.0 * safe_div(births, avg_population);
    let death_rate = 100.0 * safe_div(deaths, avg_population);
    let daily_growth = 100.0 * safe_div(births - deaths + entries - exits, avg_population);
    let efficiency = safe_div(births, avg_population);

    vec![
        kpi(
            "Tasa de Natalidad",
            round_to(birth_rate, 2),
            targets.birth_rate,
            "%",
            "Nacimientos sobre la población promedio del período.",
            "fa-baby",
        ),
        kpi(
            "Tasa de Mortalidad",
            round_to(death_rate, 2),
            targets.death_rate,
            "%",
            "Muertes sobre la población promedio del período.",
            "fa-skull-crossbones",
        ),
        kpi(
            "Crecimiento Diario",
            round_to(daily_growth, 2),
            targets.daily_growth_rate,
            "%",
            "Cambio neto (nacimientos - muertes + entradas - salidas) sobre la población promedio.",
            "fa-chart-line",
        ),
        Kpi {
            kind: Some(KpiType::Efficiency),
            ..kpi(
                "Eficiencia Reproductiva",
                round_to(efficiency, 4),
                targets.reproductive_efficiency,
                "",
                "Nacimientos por animal en el período.",
                "fa-seedling",
            )
        },
    ]
}

/// Total and average of the `value` field.
pub fn generic_kpis(data: &[DatedRecord], targets: &GenericTargets) -> Vec<Kpi> {
    if data.is_empty() {
        return Vec::new();
    }
    let total = sum(data, VALUE_FIELD);
    let average = total / data.len() as f64;

    vec![
        kpi("Total", total.round(), targets.total, "", "Suma total de valores.", "fa-calculator"),
        kpi("Promedio", average.round(), targets.average, "", "Valor promedio.", "fa-chart-bar"),
    ]
}

/// One participation KPI per group share, rounded to one decimal.
pub fn participation_kpis(shares: &[GroupShare], expected: f64) -> Vec<Kpi> {
    shares
        .iter()
        .map(|s| Kpi {
            kind: Some(KpiType::Participation),
            ..kpi(
                &s.name,
                round_to(s.share, 1),
                expected,
                "%",
                &format!("Participación de {} en {}.", s.name, s.category),
                "fa-chart-pie",
            )
        })
        .collect()
}
