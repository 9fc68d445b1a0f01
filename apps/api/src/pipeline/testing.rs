//! Test doubles for the model provider.
//!
//! `MockProvider` replays scripted generation responses in order and records
//! every call so tests can inspect prompts and call counts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{CatalogModel, GenerativeProvider, LlmError, ModelId};

/// Record of a call made to the mock provider.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListModels,
    Instantiate(String),
    Generate { model: String, prompt: String },
}

pub fn catalog_model(name: &str, methods: &[&str]) -> CatalogModel {
    CatalogModel {
        name: name.to_string(),
        supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
    }
}

pub struct MockProvider {
    /// `None` makes `list_models` fail.
    catalog: Option<Vec<CatalogModel>>,
    /// `None` accepts every candidate.
    instantiable: Option<Vec<String>>,
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// A provider whose catalog offers a single flash model.
    pub fn new() -> Self {
        Self {
            catalog: Some(vec![catalog_model(
                "models/gemini-1.5-flash",
                &["generateContent", "countTokens"],
            )]),
            instantiable: None,
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogModel>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_failing_catalog(mut self) -> Self {
        self.catalog = None;
        self
    }

    pub fn with_instantiable(mut self, models: &[&str]) -> Self {
        self.instantiable = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Queues a successful generation response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queues a failed generation call.
    pub fn with_error_response(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompts sent to `generate`, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Generate { prompt, .. } => Some(prompt),
                _ => None,
            })
            .collect()
    }

    pub fn generate_count(&self) -> usize {
        self.prompts().len()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    async fn list_models(&self) -> Result<Vec<CatalogModel>, LlmError> {
        self.record(MockCall::ListModels);
        self.catalog.clone().ok_or(LlmError::Api {
            status: 403,
            message: "API key not valid".to_string(),
        })
    }

    fn instantiate(&self, model: &str) -> Result<ModelId, LlmError> {
        self.record(MockCall::Instantiate(model.to_string()));
        match &self.instantiable {
            Some(allowed) if !allowed.iter().any(|m| m == model) => Err(LlmError::Instantiate {
                model: model.to_string(),
                reason: "not available to this key".to_string(),
            }),
            _ => Ok(ModelId::new(model)),
        }
    }

    async fn generate(&self, model: &ModelId, prompt: &str) -> Result<String, LlmError> {
        self.record(MockCall::Generate {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
