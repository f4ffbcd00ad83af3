//! Record source: crawl dumps on disk
//!
//! A dump is either one JSON array of records or one record per line.
//! Elements decode independently, so a malformed element costs only itself.

use crate::errors::IngestionError;
use harvest_common::{AppError, Record};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// One element of a dump with where it came from
#[derive(Debug)]
pub struct SourceItem {
    /// `file[index]` for arrays, `file:line` for JSON lines
    pub origin: String,
    pub record: harvest_common::Result<Record>,
}

/// Read every record of a dump file
pub async fn read_records(path: &Path) -> Result<Vec<SourceItem>, IngestionError> {
    let shown = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestionError::Input {
            path: shown.clone(),
            source,
        })?;

    let items = parse_records(&shown, &text)?;
    debug!(path = %shown, count = items.len(), "Read records");
    Ok(items)
}

fn parse_records(name: &str, text: &str) -> Result<Vec<SourceItem>, IngestionError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| IngestionError::InputFormat {
                path: name.to_string(),
                message: e.to_string(),
            })?;

        return Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| SourceItem {
                origin: format!("{}[{}]", name, index),
                record: Record::from_value(value),
            })
            .collect());
    }

    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| SourceItem {
            origin: format!("{}:{}", name, index + 1),
            record: serde_json::from_str::<Value>(line)
                .map_err(AppError::from)
                .and_then(Record::from_value),
        })
        .collect())
}
