//! KPI targets.
//!
//! Targets are fixed domain constants, not derived from data. They live in one
//! struct so a deployment (or a test) can swap them via a JSON file.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MilkTargets {
    /// Liters per period.
    pub total_milk: f64,
    /// Liters per day.
    pub avg_milk: f64,
    pub total_births: f64,
    /// Births per 30-day month.
    pub birth_rate: f64,
    /// Liters per birth.
    pub milk_per_birth: f64,
}

impl Default for MilkTargets {
    fn default() -> Self {
        Self {
            total_milk: 20000.0,
            avg_milk: 600.0,
            total_births: 60.0,
            birth_rate: 50.0,
            milk_per_birth: 250.0,
        }
    }
}

/// Percent rates relative to the average herd size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopulationTargets {
    pub birth_rate: f64,
    pub death_rate: f64,
    pub daily_growth_rate: f64,
    pub reproductive_efficiency: f64,
}

impl Default for PopulationTargets {
    fn default() -> Self {
        Self {
            birth_rate: 1.5,
            death_rate: 0.5,
            daily_growth_rate: 0.1,
            reproductive_efficiency: 0.015,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenericTargets {
    pub total: f64,
    pub average: f64,
}

impl Default for GenericTargets {
    fn default() -> Self {
        Self {
            total: 1000.0,
            average: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KpiTargets {
    pub milk: MilkTargets,
    pub population: PopulationTargets,
    pub generic: GenericTargets,
    /// Expected share (percent) of a single group within its category.
    pub participation_share: f64,
}

impl Default for KpiTargets {
    fn default() -> Self {
        Self {
            milk: MilkTargets::default(),
            population: PopulationTargets::default(),
            generic: GenericTargets::default(),
            participation_share: 20.0,
        }
    }
}

impl KpiTargets {
    /// Read targets from a JSON file; fields left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open targets file '{}': {e}", path.display())))?;
        serde_json::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid targets file '{}': {e}", path.display())))
    }
}
