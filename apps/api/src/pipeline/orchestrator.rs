//! Pipeline orchestrator — DocumentReader → ExtractionStage → EstimationStage.
//!
//! Stages run strictly in order and any failure aborts the run unchanged.
//! No state survives between runs; partial results are discarded.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::llm_client::GenerativeProvider;
use crate::models::EstimatedRecord;
use crate::pipeline::document::DocumentReader;
use crate::pipeline::estimation::EstimationStage;
use crate::pipeline::extraction::ExtractionStage;
use crate::pipeline::model_selector::ModelSelector;
use crate::pipeline::PipelineError;

#[derive(Clone)]
pub struct Pipeline {
    selector: ModelSelector,
    extraction: ExtractionStage,
    estimation: EstimationStage,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self::with_selector(provider.clone(), ModelSelector::new(provider))
    }

    pub fn with_selector(provider: Arc<dyn GenerativeProvider>, selector: ModelSelector) -> Self {
        Self {
            extraction: ExtractionStage::new(provider.clone(), selector.clone()),
            estimation: EstimationStage::new(provider, selector.clone()),
            selector,
        }
    }

    /// The selector the stages use, for diagnostics.
    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    pub async fn run(
        &self,
        document_path: &Path,
        reference_table_path: &Path,
    ) -> Result<Vec<EstimatedRecord>, PipelineError> {
        info!(
            "Pipeline run started: document={}, reference_table={}",
            document_path.display(),
            reference_table_path.display()
        );

        let path = document_path.to_path_buf();
        let document_text = tokio::task::spawn_blocking(move || DocumentReader::read_path(&path))
            .await
            .map_err(|e| PipelineError::UnreadableDocument {
                path: document_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, e.to_string()),
            })??;

        let items = self.extraction.extract(&document_text).await?;
        let records = self.estimation.estimate(&items, reference_table_path).await?;

        info!(
            "Pipeline run completed: {} items extracted, {} records estimated",
            items.len(),
            records.len()
        );
        Ok(records)
    }
}
