//! Shared request pipeline used by every subcommand.
//!
//! fetcher -> orchestrator -> themes. Subcommands only differ in presentation.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::cli::ThemeArgs;
use crate::data::{ApiClient, ClientConfig, OfflineSource, SeriesFetcher};
use crate::domain::{DateRange, EntityRef, ThemeResult};
use crate::error::AppError;
use crate::kpi::KpiTargets;
use crate::theme::{OrchestratorConfig, SelectionState, ThemeOrchestrator};

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub entity: EntityRef,
    pub range: DateRange,
    pub themes: Vec<ThemeResult>,
}

/// Orchestrator settings derived from CLI flags.
pub fn orchestrator_config(args: &ThemeArgs) -> Result<OrchestratorConfig, AppError> {
    let targets = match &args.targets {
        Some(path) => KpiTargets::load(path)?,
        None => KpiTargets::default(),
    };
    Ok(OrchestratorConfig {
        seed: args.seed,
        targets,
        ..OrchestratorConfig::default()
    })
}

pub fn build_fetcher(offline: bool) -> Result<Arc<dyn SeriesFetcher>, AppError> {
    if offline {
        return Ok(Arc::new(OfflineSource::demo()));
    }
    let config = ClientConfig::from_env()?;
    Ok(Arc::new(ApiClient::new(config)?))
}

/// Resolve the request and load its themes.
pub async fn run_themes(args: &ThemeArgs, today: NaiveDate) -> Result<RunOutput, AppError> {
    let entity = args.entity.entity()?;
    let range = args.date_range(today)?;
    let fetcher = build_fetcher(args.offline)?;
    run_with_fetcher(fetcher, entity, range, orchestrator_config(args)?).await
}

/// Same as `run_themes` with an explicit data source.
pub async fn run_with_fetcher(
    fetcher: Arc<dyn SeriesFetcher>,
    entity: EntityRef,
    range: DateRange,
    config: OrchestratorConfig,
) -> Result<RunOutput, AppError> {
    let selection = SelectionState::new(range);
    let orchestrator = ThemeOrchestrator::new(fetcher, selection, config);

    let themes = orchestrator.get_themes_data(entity.id, entity.kind).await;
    if themes.is_empty() {
        return Err(AppError::new(3, format!("No themes available for {entity}.")));
    }
    Ok(RunOutput { entity, range, themes })
}
