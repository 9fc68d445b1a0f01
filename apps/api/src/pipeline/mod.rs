// Estimation pipeline: document → extraction call → estimation call.
// All model calls go through llm_client::GenerativeProvider.

use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::llm_client::{strip_json_fences, truncate_chars, LlmError};

pub mod document;
pub mod estimation;
pub mod extraction;
pub mod handlers;
pub mod model_selector;
pub mod orchestrator;
pub mod prompts;
pub mod reference_table;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::Pipeline;
use reference_table::TableError;

/// How much of a raw model response is kept in parse errors.
const RAW_DIAGNOSTIC_CHARS: usize = 500;

/// Cause of a failed extraction or estimation stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("model response is not the expected JSON ({source}); raw response: {raw}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("reference table unavailable: {0}")]
    ReferenceTable(#[from] TableError),
}

/// Terminal failure of a pipeline run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot open document {}: {source}", .path.display())]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No available generative model found. {guidance}")]
    NoModelAvailable { guidance: String },

    #[error("Extraction stage failed: {0}")]
    Extraction(#[source] StageError),

    #[error("Estimation stage failed: {0}")]
    Estimation(#[source] StageError),
}

/// Strips code fences and decodes a model response as a JSON array of `T`.
///
/// Elements missing required fields fail the whole decode.
pub(crate) fn parse_model_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, StageError> {
    serde_json::from_str(strip_json_fences(raw)).map_err(|source| StageError::Parse {
        source,
        raw: truncate_chars(raw, RAW_DIAGNOSTIC_CHARS).to_string(),
    })
}
