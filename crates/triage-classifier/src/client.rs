use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use triage_core::config::ClassifierConfig;

use crate::error::ClassifierError;

/// Path appended to the base URL for chat completions.
const CHAT_PATH: &str = "/api/v1/chat/completions";

/// Thin client for the classification endpoint.
///
/// [`Classifier::classify`] returns the trimmed single-line completion, or
/// an empty string on any network / API failure — the caller substitutes
/// its own default label. The fallback model is tried once before giving
/// up.
pub struct Classifier {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    fallback_model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            fallback_model: config.fallback_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Send `prompt` and return the first completion's trimmed content.
    /// Returns `""` when both the primary and the fallback model fail.
    pub async fn classify(&self, prompt: &str) -> String {
        match self.request(&self.model, prompt).await {
            Ok(content) => content,
            Err(e) => {
                warn!(model = %self.model, error = %e, "classifier call failed, retrying on fallback");
                match self.request(&self.fallback_model, prompt).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(model = %self.fallback_model, error = %e, "fallback classifier call failed");
                        String::new()
                    }
                }
            }
        }
    }

    async fn request(&self, model: &str, prompt: &str) -> Result<String, ClassifierError> {
        let url = format!("{}{CHAT_PATH}", self.base_url);
        let body = build_request_body(model, prompt, self.temperature, self.max_tokens);

        debug!(%model, "sending classification request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Api { status, message });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        Ok(parse_response(api_resp))
    }
}

pub(crate) fn build_request_body(
    model: &str,
    prompt: &str,
    temperature: f32,
    max_tokens: u32,
) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

pub(crate) fn parse_response(resp: ApiResponse) -> String {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[derive(Deserialize)]
pub(crate) struct ApiResponse {
    pub(crate) choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub(crate) message: ChatMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatMessage {
    pub(crate) content: Option<String>,
}
