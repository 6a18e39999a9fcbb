mod client;
pub use client::{GeminiClient, ModelInfo, generate_content, list_models};
