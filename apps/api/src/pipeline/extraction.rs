//! Extraction Stage — raw document text → `[ExtractedItem]` via one model call.

use std::sync::Arc;

use tracing::info;

use crate::llm_client::{truncate_chars, GenerativeProvider};
use crate::models::ExtractedItem;
use crate::pipeline::model_selector::ModelSelector;
use crate::pipeline::prompts::extraction_prompt;
use crate::pipeline::{parse_model_array, PipelineError, StageError};

/// Longest document prefix sent to the model, in characters.
pub const MAX_DOCUMENT_CHARS: usize = 20_000;

#[derive(Clone)]
pub struct ExtractionStage {
    provider: Arc<dyn GenerativeProvider>,
    selector: ModelSelector,
}

impl ExtractionStage {
    pub fn new(provider: Arc<dyn GenerativeProvider>, selector: ModelSelector) -> Self {
        Self { provider, selector }
    }

    /// Extracts items from `document_text`. Empty text is still sent to the model.
    pub async fn extract(&self, document_text: &str) -> Result<Vec<ExtractedItem>, PipelineError> {
        let text = truncate_chars(document_text, MAX_DOCUMENT_CHARS);
        if text.len() < document_text.len() {
            info!(
                "Document truncated to {MAX_DOCUMENT_CHARS} chars (was {})",
                document_text.chars().count()
            );
        }

        let model = self.selector.select().await?;
        let prompt = extraction_prompt(text);

        let raw = self
            .provider
            .generate(&model, &prompt)
            .await
            .map_err(|e| PipelineError::Extraction(StageError::Model(e)))?;

        let items: Vec<ExtractedItem> = parse_model_array(&raw).map_err(PipelineError::Extraction)?;
        info!("Extracted {} items with {model}", items.len());
        Ok(items)
    }
}
