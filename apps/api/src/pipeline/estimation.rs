//! Estimation Stage — extracted items + reference table → `[EstimatedRecord]`.
//!
//! Bounds only the data it owns: the reference table is cut to 100 rows,
//! narrowed to sizing-related columns when wide, and its rendered text is
//! truncated when the combined payload is too large. Items are never cut.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::llm_client::{truncate_chars, GenerativeProvider};
use crate::models::{EstimatedRecord, ExtractedItem};
use crate::pipeline::model_selector::ModelSelector;
use crate::pipeline::prompts::estimation_prompt;
use crate::pipeline::reference_table::{ReferenceTable, TableError};
use crate::pipeline::{parse_model_array, PipelineError, StageError};

pub const MAX_TABLE_ROWS: usize = 100;
/// Tables wider than this are narrowed to relevant columns.
pub const MAX_TABLE_COLUMNS: usize = 10;
pub const RELEVANT_COLUMN_KEYWORDS: &[&str] = &[
    "epic",
    "feature",
    "requirement",
    "size",
    "small",
    "medium",
    "large",
    "dev hours",
    "hours",
];
/// Combined items + table text above which the table text is truncated.
pub const MAX_PAYLOAD_CHARS: usize = 50_000;
pub const MAX_TABLE_CHARS: usize = 30_000;
pub const TRUNCATION_MARKER: &str = "\n... (truncated for size)";

#[derive(Clone)]
pub struct EstimationStage {
    provider: Arc<dyn GenerativeProvider>,
    selector: ModelSelector,
}

impl EstimationStage {
    pub fn new(provider: Arc<dyn GenerativeProvider>, selector: ModelSelector) -> Self {
        Self { provider, selector }
    }

    pub async fn estimate(
        &self,
        items: &[ExtractedItem],
        reference_table_path: &Path,
    ) -> Result<Vec<EstimatedRecord>, PipelineError> {
        let path = reference_table_path.to_path_buf();
        let table = tokio::task::spawn_blocking(move || ReferenceTable::load(&path))
            .await
            .map_err(|e| TableError::Io {
                path: reference_table_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, e.to_string()),
            })
            .and_then(|loaded| loaded)
            .map_err(|e| PipelineError::Estimation(StageError::ReferenceTable(e)))?;

        let items_text = serde_json::to_string_pretty(items)
            .map_err(|e| PipelineError::Estimation(StageError::Model(e.into())))?;
        let table_text = reference_context(table, items_text.chars().count());

        let model = self.selector.select().await?;
        let prompt = estimation_prompt(&items_text, &table_text);

        let raw = self
            .provider
            .generate(&model, &prompt)
            .await
            .map_err(|e| PipelineError::Estimation(StageError::Model(e)))?;

        let records: Vec<EstimatedRecord> =
            parse_model_array(&raw).map_err(PipelineError::Estimation)?;
        let records = reconcile(items, records);
        info!("Estimated {} records with {model}", records.len());
        Ok(records)
    }
}

/// Reduces the table to its prompt form: row cap, column narrowing, rendering,
/// and truncation when `items_chars` plus the table exceed the payload budget.
pub fn reference_context(table: ReferenceTable, items_chars: usize) -> String {
    let original_rows = table.row_count();
    let mut table = table.head(MAX_TABLE_ROWS);
    if original_rows > MAX_TABLE_ROWS {
        info!("Reference table capped at {MAX_TABLE_ROWS} of {original_rows} rows");
    }

    if table.column_count() > MAX_TABLE_COLUMNS {
        let before = table.column_count();
        table = table.retain_matching_columns(RELEVANT_COLUMN_KEYWORDS);
        info!(
            "Reference table narrowed from {before} to {} columns",
            table.column_count()
        );
    }

    let rendered = table.render();
    if items_chars + rendered.chars().count() > MAX_PAYLOAD_CHARS {
        info!("Reference table text truncated to {MAX_TABLE_CHARS} chars");
        return format!("{}{TRUNCATION_MARKER}", truncate_chars(&rendered, MAX_TABLE_CHARS));
    }
    rendered
}

/// Keeps records that correspond to an extracted item, in the model's order.
///
/// Each extracted item backs at most one record, so the result never holds
/// more records than there are items. Unmatched records are dropped.
pub fn reconcile(items: &[ExtractedItem], records: Vec<EstimatedRecord>) -> Vec<EstimatedRecord> {
    let mut unclaimed: Vec<String> = items.iter().map(|i| normalize(&i.name)).collect();
    let mut kept = Vec::with_capacity(records.len().min(items.len()));

    for record in records {
        let key = normalize(&record.item);
        match unclaimed.iter().position(|k| *k == key) {
            Some(idx) => {
                unclaimed.swap_remove(idx);
                kept.push(record);
            }
            None => warn!(
                "Dropping estimate for '{}': not among extracted items",
                record.item
            ),
        }
    }

    if !unclaimed.is_empty() {
        warn!("{} extracted item(s) received no estimate", unclaimed.len());
    }
    kept
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
