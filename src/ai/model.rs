use std::fmt::Display;
use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;

/// Error for a model request that could not be completed, as opposed
/// to one the model answered without usable text.
pub fn request_failed(err: impl Display) -> Error {
    anyhow!("Failed to get a response from the AI assistant. Error: {}", err)
}

/// A remote model that turns a prompt into text. Every call is
/// stateless, the full prompt is sent each time.
#[async_trait]
pub trait LanguageModel {
    async fn generate(&self, prompt: &str) -> Result<String, Error>;
    fn model_name(&self) -> String;
}

pub type SharedLanguageModel = Arc<dyn LanguageModel + Send + Sync + 'static>;
