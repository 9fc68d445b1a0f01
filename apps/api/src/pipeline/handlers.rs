//! Axum route handlers for the Estimation API.

use std::path::PathBuf;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{CatalogModel, ModelId};
use crate::models::EstimatedRecord;
use crate::pipeline::reference_table::locate_in_dir;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// Path of an already-stored document.
    pub document_path: PathBuf,
    /// Defaults to the table found in `SCOPE_CONFIG_DIR`.
    pub reference_table_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub record_count: usize,
    pub records: Vec<EstimatedRecord>,
}

#[derive(Debug, Serialize)]
pub struct AvailableModel {
    pub name: ModelId,
    pub full_name: String,
    pub methods: Vec<String>,
}

impl From<&CatalogModel> for AvailableModel {
    fn from(model: &CatalogModel) -> Self {
        Self {
            name: model.id(),
            full_name: model.name.clone(),
            methods: model.supported_generation_methods.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Vec<AvailableModel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<ModelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/estimates
///
/// Runs the full pipeline on an already-stored document and returns the
/// estimated records. Persisting them is the caller's job.
pub async fn handle_estimate(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    if request.document_path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(AppError::Validation(
            "document_path cannot be empty".to_string(),
        ));
    }

    let reference_table_path = match request.reference_table_path {
        Some(path) => path,
        None => locate_in_dir(&state.config.scope_config_dir).ok_or_else(|| {
            AppError::Validation(
                "Scope config file is required. Please upload it first.".to_string(),
            )
        })?,
    };

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let records = state
        .pipeline
        .run(&request.document_path, &reference_table_path)
        .instrument(info_span!("pipeline_run", %run_id))
        .await?;

    Ok(Json(EstimateResponse {
        run_id,
        started_at,
        completed_at: Utc::now(),
        record_count: records.len(),
        records,
    }))
}

/// GET /api/v1/models
///
/// Lists generation-capable catalog models and the model the selector would pick.
pub async fn handle_list_models(State(state): State<AppState>) -> (StatusCode, Json<ModelsResponse>) {
    let catalog = match state.provider.list_models().await {
        Ok(catalog) => catalog,
        Err(e) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(ModelsResponse {
                    status: "error",
                    available_models: None,
                    selected_model: None,
                    error: Some(e.to_string()),
                    message: Some("Could not list models. Check your API key.".to_string()),
                }),
            )
        }
    };

    let available_models = catalog
        .iter()
        .filter(|m| m.supports_generation())
        .map(AvailableModel::from)
        .collect();

    let response = match state.pipeline.selector().select_from(Some(&catalog)) {
        Ok(model) => ModelsResponse {
            status: "success",
            available_models: Some(available_models),
            selected_model: Some(model),
            error: None,
            message: None,
        },
        Err(e) => ModelsResponse {
            status: "warning",
            available_models: Some(available_models),
            selected_model: None,
            error: Some(e.to_string()),
            message: None,
        },
    };

    (StatusCode::OK, Json(response))
}
