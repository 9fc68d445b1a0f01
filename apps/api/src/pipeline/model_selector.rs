//! Model Selector — picks a usable generative model for each stage call.
//!
//! Selection is an ordered list of pure strategies over a catalog snapshot
//! (`None` when the catalog could not be fetched). The first strategy that
//! yields a model wins; if none does, the static fallback list is tried by
//! instantiating each candidate locally. Nothing is cached between calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm_client::{CatalogModel, GenerativeProvider, ModelId};
use crate::pipeline::PipelineError;

/// Known model identifiers tried in order when catalog discovery yields nothing.
pub const FALLBACK_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-flash-001",
    "gemini-1.5-flash-002",
    "gemini-1.5-pro",
    "gemini-1.5-pro-001",
    "gemini-1.5-pro-002",
    "gemini-pro",
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash",
];

/// Provider's generic model family name.
const FAMILY_NAME: &str = "gemini";

const NO_MODEL_GUIDANCE: &str = "Check that GEMINI_API_KEY is valid and that the key has access \
    to Gemini models (https://aistudio.google.com/app/apikey).";

/// A selection strategy: catalog snapshot in, model out.
pub type Strategy = fn(Option<&[CatalogModel]>) -> Option<ModelId>;

/// Catalog strategies in priority order, with names for logging.
pub const CATALOG_STRATEGIES: &[(&str, Strategy)] = &[
    ("flash", prefer_flash),
    ("pro-or-family", prefer_pro_or_family),
    ("first-supported", first_supported),
];

fn generation_capable(catalog: Option<&[CatalogModel]>) -> impl Iterator<Item = &CatalogModel> {
    catalog
        .unwrap_or_default()
        .iter()
        .filter(|m| m.supports_generation())
}

/// Latency/cost-optimised tier.
pub fn prefer_flash(catalog: Option<&[CatalogModel]>) -> Option<ModelId> {
    generation_capable(catalog)
        .map(CatalogModel::id)
        .find(|id| id.as_str().to_lowercase().contains("flash"))
}

pub fn prefer_pro_or_family(catalog: Option<&[CatalogModel]>) -> Option<ModelId> {
    generation_capable(catalog).map(CatalogModel::id).find(|id| {
        let lower = id.as_str().to_lowercase();
        lower.contains("pro") || lower.contains(FAMILY_NAME)
    })
}

pub fn first_supported(catalog: Option<&[CatalogModel]>) -> Option<ModelId> {
    generation_capable(catalog).next().map(CatalogModel::id)
}

/// Runs the catalog strategies in order, returning the winning strategy's name and model.
pub fn resolve_from_catalog(
    catalog: Option<&[CatalogModel]>,
) -> Option<(&'static str, ModelId)> {
    CATALOG_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(catalog).map(|id| (*name, id)))
}

/// Discovers a usable model from the provider's catalog, with static fallback.
#[derive(Clone)]
pub struct ModelSelector {
    provider: Arc<dyn GenerativeProvider>,
    fallback: Vec<String>,
}

impl ModelSelector {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            fallback: FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Replaces the static fallback candidates.
    #[allow(dead_code)]
    pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
        self.fallback = fallback;
        self
    }

    pub async fn select(&self) -> Result<ModelId, PipelineError> {
        let catalog = match self.provider.list_models().await {
            Ok(models) => Some(models),
            Err(e) => {
                warn!("Model catalog unavailable, using static fallback list: {e}");
                None
            }
        };
        self.select_from(catalog.as_deref())
    }

    /// Picks a model from an already-fetched catalog snapshot, then the fallback list.
    pub fn select_from(&self, catalog: Option<&[CatalogModel]>) -> Result<ModelId, PipelineError> {
        if let Some((strategy, model)) = resolve_from_catalog(catalog) {
            info!("Selected model {model} from catalog ({strategy})");
            return Ok(model);
        }

        for candidate in &self.fallback {
            match self.provider.instantiate(candidate) {
                Ok(model) => {
                    info!("Selected fallback model {model}");
                    return Ok(model);
                }
                Err(e) => debug!("Fallback candidate {candidate} rejected: {e}"),
            }
        }

        Err(PipelineError::NoModelAvailable {
            guidance: NO_MODEL_GUIDANCE.to_string(),
        })
    }
}
