//! Write assembled themes to JSON.
//!
//! The payload uses the field names the dashboard renderer reads
//! (`chartData`, `lastRecord`, `kpisData`, ...), so the file can be fed to it as-is.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, EntityRef, ThemeResult};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeExport {
    pub tool: String,
    pub entity_type: String,
    pub entity_id: u64,
    pub range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub themes: Vec<ThemeResult>,
}

impl ThemeExport {
    pub fn new(entity: EntityRef, range: DateRange, themes: Vec<ThemeResult>) -> Self {
        Self {
            tool: "herd".to_string(),
            entity_type: entity.kind.as_str().to_string(),
            entity_id: entity.id,
            range,
            generated_at: Utc::now(),
            themes,
        }
    }
}

pub fn write_themes_json(path: &Path, export: &ThemeExport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), export)
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}
