use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::ai::{LanguageModel, request_failed};

const NOT_CONFIGURED: &str = "Gemini API is not properly configured. Please check your API key.";

// {
//   "candidates": [
//     {
//       "content": {
//         "parts": [{ "text": "Photosynthesis is..." }],
//         "role": "model"
//       },
//       "finishReason": "STOP"
//     }
//   ]
// }
fn response_text(resp: &Value) -> Option<String> {
    let parts = resp["candidates"][0]["content"]["parts"].as_array()?;
    let text = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<String>();
    if text.is_empty() { None } else { Some(text) }
}

/// Send a single prompt to the `generateContent` endpoint and return
/// the text of the first candidate.
pub async fn generate_content(
    prompt: &str,
    api_hostname: &str,
    api_key: &str,
    model: &str,
    timeout: Duration,
) -> Result<String, Error> {
    if api_key.is_empty() {
        bail!(NOT_CONFIGURED);
    }

    let payload = json!({
        "contents": [
            { "parts": [{ "text": prompt }] }
        ]
    });
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        api_hostname.trim_end_matches("/"),
        model
    );
    let response = reqwest::Client::new()
        .post(url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(&payload)
        .send()
        .await
        .map_err(request_failed)?;

    let status = response.status();
    let text = response.text().await.map_err(request_failed)?;

    if !status.is_success() {
        // Error bodies aren't always JSON, e.g. from a proxy
        let msg = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body["error"]["message"].as_str().map(|s| s.to_string()))
            .unwrap_or(text);
        return Err(request_failed(format!(
            "Gemini API request failed with status {}: {}",
            status, msg
        )));
    }

    let body: Value = serde_json::from_str(&text).map_err(request_failed)?;
    response_text(&body).ok_or(anyhow!("Failed to get a valid response from Gemini"))
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

/// List every model available to the API key, following pagination.
pub async fn list_models(api_hostname: &str, api_key: &str) -> Result<Vec<ModelInfo>, Error> {
    if api_key.is_empty() {
        bail!(NOT_CONFIGURED);
    }

    let url = format!("{}/v1beta/models", api_hostname.trim_end_matches("/"));
    let client = reqwest::Client::new();
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut req = client.get(&url).header("x-goog-api-key", api_key);
        if let Some(token) = &page_token {
            req = req.query(&[("pageToken", token)]);
        }
        let page: ListModelsResponse = req.send().await?.error_for_status()?.json().await?;
        models.extend(page.models);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(models)
}

/// Gemini backed `LanguageModel`.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, Error> {
        generate_content(
            prompt,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.timeout,
        )
        .await
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
