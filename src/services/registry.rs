use std::sync::Arc;

use crate::models::model::ModelInfo;
use crate::services::http::ApiError;
use crate::services::ocr::OcrApiClient;

/// Local view of the service's model list plus the current selection.
///
/// The OCR service owns which model is active; this only caches the last
/// fetched list and what the caller picked.
pub struct ModelRegistry {
    client: Arc<OcrApiClient>,
    models: Vec<ModelInfo>,
    selected: Option<String>,
}

impl ModelRegistry {
    pub fn new(client: Arc<OcrApiClient>) -> Self {
        Self {
            client,
            models: Vec::new(),
            selected: None,
        }
    }

    /// Fetch the list. Selects the active model, else the first one listed.
    pub async fn refresh(&mut self) -> Result<&[ModelInfo], ApiError> {
        let models = self.client.list_models().await?;
        self.selected = select_default(&models);
        self.models = models;

        tracing::debug!(
            count = self.models.len(),
            selected = self.selected.as_deref().unwrap_or("<none>"),
            "Model list refreshed"
        );
        Ok(&self.models)
    }

    /// Make `name` the active model. The selection only moves on success.
    pub async fn activate(&mut self, name: &str) -> Result<(), ApiError> {
        self.client.set_active_model(name).await?;
        self.selected = Some(name.to_string());
        for model in &mut self.models {
            model.active = model.name == name;
        }
        Ok(())
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

fn select_default(models: &[ModelInfo]) -> Option<String> {
    models
        .iter()
        .find(|m| m.active)
        .or_else(|| models.first())
        .map(|m| m.name.clone())
}
