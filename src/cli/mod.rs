//! Command-line parsing for the dashboard theme tool.
//!
//! Argument parsing and command dispatch stay separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DateRange, EntityRef};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "herd", version, about = "Farm dashboard themes: series, tabs and KPIs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble every theme for an entity and print tabs, KPIs and charts.
    Themes(ThemeArgs),
    /// Print the KPI tables only (useful for scripting).
    Kpis(ThemeArgs),
}

/// Which entity to load. Exactly one of the two is required.
#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct EntityArgs {
    /// Farm id (milk, group production and population themes).
    #[arg(long)]
    pub farm: Option<u64>,

    /// Company id (corporate themes).
    #[arg(long)]
    pub company: Option<u64>,
}

impl EntityArgs {
    pub fn entity(&self) -> Result<EntityRef, AppError> {
        match (self.farm, self.company) {
            (Some(id), None) => Ok(EntityRef::farm(id)),
            (None, Some(id)) => Ok(EntityRef::company(id)),
            _ => Err(AppError::new(2, "Pass exactly one of --farm or --company.")),
        }
    }
}

/// Common options for both subcommands.
#[derive(Debug, Parser, Clone)]
pub struct ThemeArgs {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// First day of the range (YYYY-MM-DD). Defaults to one year before `--to`.
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Skip the API and run on generated data only.
    #[arg(long)]
    pub offline: bool,

    /// Seed for generated data (reproducible runs).
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file overriding KPI targets.
    #[arg(long, value_name = "JSON")]
    pub targets: Option<PathBuf>,

    /// Export the assembled themes to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,
}

impl ThemeArgs {
    /// Resolve `--from`/`--to` against `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, AppError> {
        let end = self.to.unwrap_or(today);
        match self.from {
            Some(start) => DateRange::new(start, end),
            None => Ok(DateRange::last_year(end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("herd").chain(args.iter().copied()))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn themes_for_a_farm() {
        let cli = parse(&["themes", "--farm", "7", "--from", "2024-01-01", "--to", "2024-01-31", "--seed", "3"]).unwrap();
        let Command::Themes(args) = cli.command else {
            panic!("expected themes");
        };
        assert_eq!(args.entity.entity().unwrap(), EntityRef::farm(7));
        assert_eq!(args.seed, Some(3));
        let range = args.date_range(d(2025, 1, 1)).unwrap();
        assert_eq!((range.start, range.end), (d(2024, 1, 1), d(2024, 1, 31)));
    }

    #[test]
    fn entity_is_required_and_exclusive() {
        assert!(parse(&["kpis"]).is_err());
        assert!(parse(&["kpis", "--farm", "1", "--company", "2"]).is_err());
        assert!(parse(&["kpis", "--company", "2", "--offline"]).is_ok());
    }

    #[test]
    fn default_range_is_last_year() {
        let cli = parse(&["kpis", "--farm", "1"]).unwrap();
        let Command::Kpis(args) = cli.command else {
            panic!("expected kpis");
        };
        let range = args.date_range(d(2024, 6, 15)).unwrap();
        assert_eq!((range.start, range.end), (d(2023, 6, 15), d(2024, 6, 15)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let cli = parse(&["themes", "--farm", "1", "--from", "2024-02-01", "--to", "2024-01-01"]).unwrap();
        let Command::Themes(args) = cli.command else {
            panic!("expected themes");
        };
        assert_eq!(args.date_range(d(2024, 6, 1)).unwrap_err().exit_code(), 2);
    }
}
