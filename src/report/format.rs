//! Formatted terminal output for themes and KPIs.
//!
//! All formatting lives here so output changes stay localized.

use crate::domain::{ChartData, DateRange, EntityRef, Kpi, KpiType, Tab, ThemeResult};

/// Run header: which entity, which dates, how many themes.
pub fn format_header(entity: EntityRef, range: &DateRange, themes: &[ThemeResult]) -> String {
    let failed = themes.iter().filter(|t| t.error).count();
    let mut out = String::new();
    out.push_str("=== herd - Farm Dashboard Themes ===\n");
    out.push_str(&format!("Entity: {entity}\n"));
    out.push_str(&format!("Range: {} .. {} ({} days)\n", range.start, range.end, range.day_count()));
    out.push_str(&format!("Themes: {} ({failed} failed)\n", themes.len()));
    out
}

/// One theme: its tabs and the theme-level KPI table.
pub fn format_theme(theme: &ThemeResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n## {} [{}]\n", theme.theme, theme.key));

    if theme.error {
        out.push_str("  (error: theme could not be processed)\n");
        return out;
    }

    for tab in &theme.tabs {
        out.push_str(&format_tab_line(tab));
    }
    if !theme.kpis_data.is_empty() {
        out.push('\n');
        out.push_str(&format_kpi_table(&theme.kpis_data));
    }
    out
}

fn format_tab_line(tab: &Tab) -> String {
    let (series, points) = match &tab.chart_data {
        ChartData::Series(s) => (1, s.len()),
        ChartData::Datasets(ds) => (ds.len(), ds.first().map(|d| d.values.len()).unwrap_or(0)),
    };
    format!(
        "- {:<28} series={series} points={points:<4} last={:.2} @ {} ({})\n",
        truncate(&tab.title, 28),
        tab.last_record.value,
        tab.last_record.date.format("%Y-%m-%d"),
        tab.last_record.description,
    )
}

/// KPI table: value against target, with a status column.
pub fn format_kpi_table(kpis: &[Kpi]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<26} {:>12} {:>12} {:<6} {:<6}\n",
            "kpi", "value", "expected", "unit", "status"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<26} {:-<12} {:-<12} {:-<6} {:-<6}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for k in kpis {
        out.push_str(
            format!(
                "{:<26} {:>12} {:>12} {:<6} {:<6}\n",
                truncate(&k.name, 26),
                fmt_value(k.value),
                fmt_value(k.expected),
                truncate(&k.unit, 6),
                status(k),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// `ok` when the value meets its target. Participation shares have no direction.
fn status(kpi: &Kpi) -> &'static str {
    match kpi.kind {
        Some(KpiType::Participation) => "",
        _ if kpi.value >= kpi.expected => "ok",
        _ => "below",
    }
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e12 {
        format!("{v:.0}")
    } else {
        format!("{v:.4}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
