//! Theme registry: one entry per `ThemeKind` with its input contract.

use crate::data::Metric;
use crate::domain::{EntityKind, ThemeKind};

/// Which series a theme consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeInputs {
    /// Milk as the primary series, births alongside it.
    Milk { milk: Metric, births: Metric },
    /// Herd size as the primary series plus the four movement series.
    Population {
        total: Metric,
        births: Metric,
        deaths: Metric,
        entries: Metric,
        exits: Metric,
    },
    /// The farm's group listing, then `metric` per group.
    Groups { metric: Metric },
    /// No backing endpoint: the theme is generated over the date range.
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSpec {
    pub kind: ThemeKind,
    pub inputs: ThemeInputs,
}

static MILK_PRODUCTION: ThemeSpec = ThemeSpec {
    kind: ThemeKind::MilkProduction,
    inputs: ThemeInputs::Milk {
        milk: Metric::MilkLiters,
        births: Metric::Births,
    },
};

static GROUP_PRODUCTION: ThemeSpec = ThemeSpec {
    kind: ThemeKind::GroupProduction,
    inputs: ThemeInputs::Groups {
        metric: Metric::MilkLiters,
    },
};

static POPULATION_DYNAMICS: ThemeSpec = ThemeSpec {
    kind: ThemeKind::PopulationDynamics,
    inputs: ThemeInputs::Population {
        total: Metric::TotalAnimals,
        births: Metric::Births,
        deaths: Metric::Deaths,
        entries: Metric::Entries,
        exits: Metric::Exits,
    },
};

static CORPORATE_FINANCES: ThemeSpec = ThemeSpec {
    kind: ThemeKind::CorporateFinances,
    inputs: ThemeInputs::Synthetic,
};

static FARM_MANAGEMENT: ThemeSpec = ThemeSpec {
    kind: ThemeKind::FarmManagement,
    inputs: ThemeInputs::Synthetic,
};

static MARKET_ANALYSIS: ThemeSpec = ThemeSpec {
    kind: ThemeKind::MarketAnalysis,
    inputs: ThemeInputs::Synthetic,
};

static COMPANY_THEMES: [ThemeKind; 3] = [
    ThemeKind::CorporateFinances,
    ThemeKind::FarmManagement,
    ThemeKind::MarketAnalysis,
];

static FARM_THEMES: [ThemeKind; 3] = [
    ThemeKind::MilkProduction,
    ThemeKind::GroupProduction,
    ThemeKind::PopulationDynamics,
];

pub fn lookup(kind: ThemeKind) -> &'static ThemeSpec {
    match kind {
        ThemeKind::MilkProduction => &MILK_PRODUCTION,
        ThemeKind::GroupProduction => &GROUP_PRODUCTION,
        ThemeKind::PopulationDynamics => &POPULATION_DYNAMICS,
        ThemeKind::CorporateFinances => &CORPORATE_FINANCES,
        ThemeKind::FarmManagement => &FARM_MANAGEMENT,
        ThemeKind::MarketAnalysis => &MARKET_ANALYSIS,
    }
}

/// Themes shown for an entity kind, in processing order.
pub fn themes_for(kind: EntityKind) -> &'static [ThemeKind] {
    match kind {
        EntityKind::Company => &COMPANY_THEMES,
        EntityKind::Farm => &FARM_THEMES,
        EntityKind::Group => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_theme_is_registered() {
        for kind in [EntityKind::Company, EntityKind::Farm] {
            for theme in themes_for(kind) {
                assert_eq!(lookup(*theme).kind, *theme);
            }
        }
        assert!(themes_for(EntityKind::Group).is_empty());
    }

    #[test]
    fn lookup_returns_the_requested_kind() {
        let all = [
            ThemeKind::MilkProduction,
            ThemeKind::GroupProduction,
            ThemeKind::PopulationDynamics,
            ThemeKind::CorporateFinances,
            ThemeKind::FarmManagement,
            ThemeKind::MarketAnalysis,
        ];
        for kind in all {
            assert_eq!(lookup(kind).kind, kind);
        }
        assert!(matches!(lookup(ThemeKind::GroupProduction).inputs, ThemeInputs::Groups { .. }));
        assert!(matches!(lookup(ThemeKind::PopulationDynamics).inputs, ThemeInputs::Population { .. }));
    }

    #[test]
    fn farm_order_is_fixed() {
        assert_eq!(
            themes_for(EntityKind::Farm),
            &[
                ThemeKind::MilkProduction,
                ThemeKind::GroupProduction,
                ThemeKind::PopulationDynamics
            ]
        );
        assert_eq!(lookup(ThemeKind::MarketAnalysis).inputs, ThemeInputs::Synthetic);
    }
}
