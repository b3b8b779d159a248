//! OpenAI Chat Completions client.
//!
//! Implements [`TextGenerator`] by sending the prompt as a single user message
//! and returning the content of the first choice.

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::refiner::TextGenerator;
use crate::twitter::sanitize_for_logging;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible Chat Completions endpoint.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl OpenAiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn from_config(
        config: &OpenAiConfig,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(OpenAiClient {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        })
    }
}

/// Pulls a readable message out of an OpenAI error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_logging(body, 200))
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Requesting completion from model {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );
        debug!("Request URL: {}", self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Received {} bytes with status {}", body.len(), status);

        if !status.is_success() {
            let message = api_error_message(&body);
            error!("OpenAI request failed - Status: {}", status);
            return Err(format!("OpenAI API error ({}): {}", status, message).into());
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            format!(
                "Malformed OpenAI response: {} ({})",
                e,
                sanitize_for_logging(&body, 200)
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or("OpenAI response contained no message content")?;

        info!("Completion received ({} chars)", content.chars().count());
        Ok(content)
    }
}
